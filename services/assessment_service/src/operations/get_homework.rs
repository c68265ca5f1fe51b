use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;

use crate::domain::HomeworkView;
use crate::repository::HomeworkRepository;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum GetHomeworkError {
    #[error("Homework not found.")]
    HomeworkNotFound,
}

impl OperationError for GetHomeworkError {
    fn code(&self) -> tonic::Code {
        match self {
            GetHomeworkError::HomeworkNotFound => tonic::Code::NotFound,
        }
    }
}

type Error = EndpointError<GetHomeworkError>;

/// Homework is visible to its teacher and to the students it is assigned to. Students also get
/// the status of their own assignment.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn get_homework(
    repo: &impl HomeworkRepository,
    principal: &Principal,
    homework_id: Uuid,
) -> Result<HomeworkView, Error> {
    let mut view = repo
        .homework_view(homework_id)
        .await
        .map_err(super::not_found_or_internal(GetHomeworkError::HomeworkNotFound, "Loading homework"))?;

    if view.homework.teacher_id == principal.user_id() {
        return Ok(view);
    }

    let status = repo
        .assignment_status(homework_id, principal.user_id())
        .await
        .map_err(service_core::simple_err_map!("Loading assignment failed.", Error::internal()))?;

    match status {
        Some(status) => {
            view.assignment_status = Some(status);
            Ok(view)
        }
        None => Err(Error::operation(GetHomeworkError::HomeworkNotFound)),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{AssignmentStatus, Homework};
    use crate::operations::test_support::{world, World};

    async fn assigned(world: &World) -> Homework {
        let homework = Homework::builder().teacher_id(world.teacher.user_id()).title("Spelling").build();
        world.store.insert_homework(&homework).await.unwrap();
        world.store.assign(homework.id, world.student.user_id()).await.unwrap();
        homework
    }

    #[rstest]
    #[tokio::test]
    async fn teacher_sees_own_homework(world: World) {
        let homework = assigned(&world).await;

        let view = get_homework(&world.store, &world.teacher, homework.id).await.unwrap();
        assert_eq!(view.homework, homework);
        assert_eq!(view.assignment_status, None);
    }

    #[rstest]
    #[tokio::test]
    async fn assigned_student_sees_status(world: World) {
        let homework = assigned(&world).await;

        let view = get_homework(&world.store, &world.student, homework.id).await.unwrap();
        assert_eq!(view.assignment_status, Some(AssignmentStatus::Assigned));
    }

    #[rstest]
    #[tokio::test]
    async fn hidden_and_missing_homework_look_the_same(world: World) {
        let homework = assigned(&world).await;

        for (principal, id) in [(&world.classmate, homework.id), (&world.other_teacher, homework.id), (&world.teacher, Uuid::new_v4())] {
            let err = get_homework(&world.store, principal, id).await.unwrap_err();
            assert!(matches!(err.as_operation(), Some(GetHomeworkError::HomeworkNotFound)));
        }
    }
}
