use std::convert::Infallible;

use service_core::{EndpointError, Principal};

use crate::domain::{HomeworkView, Page, PageRequest};
use crate::repository::HomeworkRepository;

type Error = EndpointError<Infallible>;

/// Teachers page through the homework they own, everyone else through the homework assigned to
/// them. Newest first.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn list_homework(
    repo: &impl HomeworkRepository,
    principal: &Principal,
    request: PageRequest,
) -> Result<Page<HomeworkView>, Error> {
    let listed = if principal.is_teacher() {
        repo.homework_by_teacher(principal.user_id(), request.limit(), request.offset())
            .await
    } else {
        repo.homework_for_student(principal.user_id(), request.limit(), request.offset())
            .await
    };
    let (items, total) =
        listed.map_err(service_core::simple_err_map!("Listing homework failed.", Error::internal()))?;

    Ok(Page::new(items, &request, total))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{AssignmentStatus, Homework};
    use crate::operations::test_support::{world, World};

    async fn seed(world: &World, count: usize) -> Vec<Homework> {
        let mut created = Vec::new();
        for i in 0..count {
            let homework = Homework::builder()
                .teacher_id(world.teacher.user_id())
                .title(format!("Worksheet {}", i + 1))
                .build();
            world.store.insert_homework(&homework).await.unwrap();
            world.store.assign(homework.id, world.student.user_id()).await.unwrap();
            created.push(homework);
        }
        created
    }

    #[rstest]
    #[tokio::test]
    async fn teacher_pages_through_owned_homework(world: World) {
        seed(&world, 5).await;

        let first = list_homework(&world.store, &world.teacher, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!((first.items.len(), first.total, first.has_more), (2, 5, true));
        assert_eq!(first.items[0].homework.title, "Worksheet 5");

        let last = list_homework(&world.store, &world.teacher, PageRequest::new(3, 2)).await.unwrap();
        assert_eq!((last.items.len(), last.has_more), (1, false));
        assert_eq!(last.items[0].homework.title, "Worksheet 1");
    }

    #[rstest]
    #[tokio::test]
    async fn student_sees_only_assigned_homework(world: World) {
        seed(&world, 2).await;
        let unassigned = Homework::builder().teacher_id(world.teacher.user_id()).title("Bonus").build();
        world.store.insert_homework(&unassigned).await.unwrap();

        let page = list_homework(&world.store, &world.student, PageRequest::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page
            .items
            .iter()
            .all(|v| v.assignment_status == Some(AssignmentStatus::Assigned)));

        let other = list_homework(&world.store, &world.classmate, PageRequest::default()).await.unwrap();
        assert_eq!(other.total, 0);
        assert!(other.items.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn other_teachers_see_nothing(world: World) {
        seed(&world, 3).await;

        let page = list_homework(&world.store, &world.other_teacher, PageRequest::default()).await.unwrap();
        assert_eq!((page.total, page.limit), (0, 20));
    }
}
