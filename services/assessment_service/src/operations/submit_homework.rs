use chrono::Utc;
use serde::Deserialize;
use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Submission, SubmissionView};
use crate::policy::is_late;
use crate::repository::HomeworkRepository;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubmitHomeworkInput {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub file_refs: Vec<String>,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum SubmitHomeworkError {
    #[error("Homework not found.")]
    HomeworkNotFound,
}

impl OperationError for SubmitHomeworkError {
    fn code(&self) -> tonic::Code {
        match self {
            SubmitHomeworkError::HomeworkNotFound => tonic::Code::NotFound,
        }
    }
}

type Error = EndpointError<SubmitHomeworkError>;

/// Records a submission by the caller. Lateness is decided here, once, against the deadline.
///
/// A second submission for the same homework is stored alongside the first.
#[tracing::instrument(skip(repo, principal, input), fields(principal = %principal))]
pub async fn submit_homework(
    repo: &impl HomeworkRepository,
    principal: &Principal,
    homework_id: Uuid,
    input: SubmitHomeworkInput,
) -> Result<SubmissionView, Error> {
    super::validate(&input)?;

    let homework = repo
        .homework(homework_id)
        .await
        .map_err(super::not_found_or_internal(SubmitHomeworkError::HomeworkNotFound, "Loading homework"))?;

    let submitted_at = Utc::now();
    let submission = Submission::builder()
        .homework_id(homework.id)
        .student_id(principal.user_id())
        .content(input.content)
        .file_refs(input.file_refs)
        .is_late(is_late(submitted_at, homework.deadline))
        .submitted_at(submitted_at)
        .build();

    repo.record_submission(&submission)
        .await
        .map_err(service_core::simple_err_map!("Recording submission failed.", Error::internal()))?;
    if submission.is_late {
        tracing::info!(submission_id = %submission.id, "Late submission recorded.");
    }

    let views = repo
        .submissions(homework.id, Some(principal.user_id()))
        .await
        .map_err(service_core::simple_err_map!("Reloading submission failed.", Error::internal()))?;
    views.into_iter().find(|v| v.submission.id == submission.id).ok_or_else(|| {
        tracing::error!(submission_id = %submission.id, "Recorded submission is missing.");
        Error::internal()
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{AssignmentStatus, Homework};
    use crate::operations::test_support::{hours_from_now, world, World};

    async fn homework(world: &World, deadline: Option<chrono::DateTime<Utc>>) -> Homework {
        let homework = Homework::builder()
            .teacher_id(world.teacher.user_id())
            .title("Book report")
            .deadline(deadline)
            .build();
        world.store.insert_homework(&homework).await.unwrap();
        world.store.assign(homework.id, world.student.user_id()).await.unwrap();
        homework
    }

    fn essay() -> SubmitHomeworkInput {
        SubmitHomeworkInput {
            content: Some("Matilda reads every book in the library.".to_owned()),
            file_refs: vec!["uploads/report.pdf".to_owned()],
        }
    }

    #[rstest]
    #[case(None, false)]
    #[case(Some(hours_from_now(24)), false)]
    #[case(Some(hours_from_now(-1)), true)]
    #[tokio::test]
    async fn lateness_follows_deadline(
        world: World,
        #[case] deadline: Option<chrono::DateTime<Utc>>,
        #[case] late: bool,
    ) {
        let homework = homework(&world, deadline).await;

        let view = submit_homework(&world.store, &world.student, homework.id, essay()).await.unwrap();
        assert_eq!(view.submission.is_late, late);
        assert_eq!(view.student_name, "Matilda Wormwood");
        assert_eq!(view.submission.file_refs, vec!["uploads/report.pdf".to_owned()]);
    }

    #[rstest]
    #[tokio::test]
    async fn submission_moves_assignment_forward(world: World) {
        let homework = homework(&world, None).await;
        submit_homework(&world.store, &world.student, homework.id, essay()).await.unwrap();

        let status = world.store.assignment_status(homework.id, world.student.user_id()).await.unwrap();
        assert_eq!(status, Some(AssignmentStatus::Submitted));
    }

    #[rstest]
    #[tokio::test]
    async fn resubmission_is_kept_as_another_row(world: World) {
        let homework = homework(&world, None).await;
        submit_homework(&world.store, &world.student, homework.id, essay()).await.unwrap();
        submit_homework(&world.store, &world.student, homework.id, SubmitHomeworkInput::default())
            .await
            .unwrap();

        let all = world.store.submissions(homework.id, None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_homework_is_not_found(world: World) {
        let err = submit_homework(&world.store, &world.student, Uuid::new_v4(), essay())
            .await
            .unwrap_err();
        assert!(matches!(err.as_operation(), Some(SubmitHomeworkError::HomeworkNotFound)));
    }
}
