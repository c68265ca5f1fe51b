use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;

use crate::domain::SubmissionView;
use crate::repository::HomeworkRepository;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ListSubmissionsError {
    #[error("Homework not found.")]
    HomeworkNotFound,
}

impl OperationError for ListSubmissionsError {
    fn code(&self) -> tonic::Code {
        match self {
            ListSubmissionsError::HomeworkNotFound => tonic::Code::NotFound,
        }
    }
}

type Error = EndpointError<ListSubmissionsError>;

/// The owning teacher sees every submission, an assigned student only their own.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn list_submissions(
    repo: &impl HomeworkRepository,
    principal: &Principal,
    homework_id: Uuid,
) -> Result<Vec<SubmissionView>, Error> {
    let homework = repo
        .homework(homework_id)
        .await
        .map_err(super::not_found_or_internal(ListSubmissionsError::HomeworkNotFound, "Loading homework"))?;

    let student_filter = if homework.teacher_id == principal.user_id() {
        None
    } else {
        let status = repo
            .assignment_status(homework_id, principal.user_id())
            .await
            .map_err(service_core::simple_err_map!("Loading assignment failed.", Error::internal()))?;
        if status.is_none() {
            return Err(Error::operation(ListSubmissionsError::HomeworkNotFound));
        }
        Some(principal.user_id())
    };

    repo.submissions(homework_id, student_filter)
        .await
        .map_err(service_core::simple_err_map!("Listing submissions failed.", Error::internal()))
}
