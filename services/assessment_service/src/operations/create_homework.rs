use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Homework, HomeworkView};
use crate::notifications::{dispatch, Notification, NotificationKind, Notifier};
use crate::repository::HomeworkRepository;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateHomeworkInput {
    #[validate(length(min = 3, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    #[serde(default)]
    pub level_id: Option<Uuid>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default = "allow_late_default")]
    pub allow_late: bool,
    #[serde(default)]
    #[validate(range(max = 100))]
    pub late_penalty_percent: u8,
    /// Students to assign the homework to.
    #[serde(default)]
    pub student_ids: Vec<Uuid>,
}

fn allow_late_default() -> bool {
    true
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CreateHomeworkError {
    #[error("Only teachers can create homework.")]
    NotAuthorized,
}

impl OperationError for CreateHomeworkError {
    fn code(&self) -> tonic::Code {
        match self {
            CreateHomeworkError::NotAuthorized => tonic::Code::PermissionDenied,
        }
    }
}

type Error = EndpointError<CreateHomeworkError>;

/// Creates the homework and assigns it to every listed student.
///
/// Assignment is best effort: a student that cannot be assigned is logged and skipped, the
/// homework itself stays created.
#[tracing::instrument(skip(repo, notifier, principal, input), fields(principal = %principal, title = %input.title))]
pub async fn create_homework(
    repo: &impl HomeworkRepository,
    notifier: &(impl Notifier + ?Sized),
    principal: &Principal,
    input: CreateHomeworkInput,
) -> Result<HomeworkView, Error> {
    super::validate(&input)?;
    if !principal.is_teacher() {
        tracing::warn!("Non-teacher attempted to create homework.");
        return Err(Error::operation(CreateHomeworkError::NotAuthorized));
    }

    let homework = Homework::builder()
        .teacher_id(principal.user_id())
        .title(input.title)
        .description(input.description)
        .instructions(input.instructions)
        .subject_id(input.subject_id)
        .level_id(input.level_id)
        .deadline(input.deadline)
        .allow_late(input.allow_late)
        .late_penalty_percent(input.late_penalty_percent)
        .build();

    repo.insert_homework(&homework)
        .await
        .map_err(service_core::simple_err_map!("Inserting homework failed.", Error::internal()))?;

    for student_id in input.student_ids {
        match repo.assign(homework.id, student_id).await {
            Ok(true) => {
                dispatch(
                    notifier,
                    Notification {
                        user_id: student_id,
                        kind: NotificationKind::HomeworkAssigned,
                        title: "New homework".to_owned(),
                        body: homework.title.clone(),
                        data: json!({ "homework_id": homework.id, "deadline": homework.deadline }),
                    },
                )
                .await
            }
            Ok(false) => {}
            Err(e) => tracing::warn!(%student_id, error = ?e, "Skipping student that could not be assigned."),
        }
    }

    repo.homework_view(homework.id)
        .await
        .map_err(service_core::simple_err_map!("Reloading homework failed.", Error::internal()))
}
