use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{Grade, SubmissionView};
use crate::notifications::{dispatch, Notification, NotificationKind, Notifier};
use crate::repository::HomeworkRepository;

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "grade_within_bounds"))]
pub struct GradeHomeworkInput {
    pub grade: f64,
    #[serde(default = "max_grade_default")]
    pub max_grade: f64,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}

fn max_grade_default() -> f64 {
    100.0
}

fn grade_within_bounds(input: &GradeHomeworkInput) -> Result<(), ValidationError> {
    if !(input.max_grade > 0.0) {
        return Err(ValidationError::new("max_grade_not_positive"));
    }
    if !(0.0..=input.max_grade).contains(&input.grade) {
        return Err(ValidationError::new("grade_out_of_range"));
    }
    Ok(())
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum GradeHomeworkError {
    #[error("Submission not found.")]
    SubmissionNotFound,

    #[error("Only the teacher who set the homework can grade it.")]
    NotAuthorized,
}

impl OperationError for GradeHomeworkError {
    fn code(&self) -> tonic::Code {
        match self {
            GradeHomeworkError::SubmissionNotFound => tonic::Code::NotFound,
            GradeHomeworkError::NotAuthorized => tonic::Code::PermissionDenied,
        }
    }
}

type Error = EndpointError<GradeHomeworkError>;

#[tracing::instrument(skip(repo, notifier, principal, input), fields(principal = %principal))]
pub async fn grade_homework(
    repo: &impl HomeworkRepository,
    notifier: &(impl Notifier + ?Sized),
    principal: &Principal,
    submission_id: Uuid,
    input: GradeHomeworkInput,
) -> Result<SubmissionView, Error> {
    super::validate(&input)?;

    let submission = repo
        .submission(submission_id)
        .await
        .map_err(super::not_found_or_internal(GradeHomeworkError::SubmissionNotFound, "Loading submission"))?;
    let homework = repo
        .homework(submission.homework_id)
        .await
        .map_err(service_core::simple_err_map!("Loading homework of submission failed.", Error::internal()))?;

    if homework.teacher_id != principal.user_id() {
        tracing::warn!(homework_id = %homework.id, "Grading denied to non-owner.");
        return Err(Error::operation(GradeHomeworkError::NotAuthorized));
    }

    let grade = Grade {
        grade: input.grade,
        max_grade: input.max_grade,
        feedback: input.feedback,
        graded_at: Utc::now(),
    };
    repo.grade_submission(submission.id, &grade)
        .await
        .map_err(super::not_found_or_internal(GradeHomeworkError::SubmissionNotFound, "Grading submission"))?;

    dispatch(
        notifier,
        Notification {
            user_id: submission.student_id,
            kind: NotificationKind::HomeworkGraded,
            title: "Homework graded".to_owned(),
            body: format!("{}: {}/{}", homework.title, grade.grade, grade.max_grade),
            data: json!({
                "homework_id": homework.id,
                "submission_id": submission.id,
                "grade": grade.grade,
                "max_grade": grade.max_grade,
            }),
        },
    )
    .await;

    let views = repo
        .submissions(homework.id, Some(submission.student_id))
        .await
        .map_err(service_core::simple_err_map!("Reloading submission failed.", Error::internal()))?;
    views.into_iter().find(|v| v.submission.id == submission.id).ok_or_else(|| {
        tracing::error!(submission_id = %submission.id, "Graded submission is missing.");
        Error::internal()
    })
}
