use chrono::Utc;
use serde::Deserialize;
use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Answer, Attempt, AttemptView};
use crate::policy::auto_grade;
use crate::repository::{QuizRepository, StoreError};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AttemptQuizInput {
    #[serde(default)]
    pub answers: Vec<Answer>,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum AttemptQuizError {
    #[error("Quiz not found.")]
    QuizNotFound,

    #[error("No attempts left on this quiz.")]
    MaxAttemptsReached,
}

impl OperationError for AttemptQuizError {
    fn code(&self) -> tonic::Code {
        match self {
            AttemptQuizError::QuizNotFound => tonic::Code::NotFound,
            AttemptQuizError::MaxAttemptsReached => tonic::Code::ResourceExhausted,
        }
    }
}

type Error = EndpointError<AttemptQuizError>;

/// Grades the answers on the spot and records the attempt as completed.
///
/// The cap is checked up front for a cheap rejection and enforced again by the store, which
/// counts and inserts under one write lock.
#[tracing::instrument(skip(repo, principal, input), fields(principal = %principal))]
pub async fn attempt_quiz(
    repo: &impl QuizRepository,
    principal: &Principal,
    quiz_id: Uuid,
    input: AttemptQuizInput,
) -> Result<AttemptView, Error> {
    super::validate(&input)?;

    let quiz = repo
        .quiz(quiz_id)
        .await
        .map_err(super::not_found_or_internal(AttemptQuizError::QuizNotFound, "Loading quiz"))?;

    let used = repo
        .count_attempts(quiz.id, principal.user_id())
        .await
        .map_err(service_core::simple_err_map!("Counting attempts failed.", Error::internal()))?;
    if used >= quiz.max_attempts {
        tracing::warn!(used, max_attempts = quiz.max_attempts, "Attempt rejected, cap reached.");
        return Err(Error::operation(AttemptQuizError::MaxAttemptsReached));
    }

    let card = auto_grade(&quiz.questions, &input.answers);
    let now = Utc::now();
    let attempt = Attempt::builder()
        .quiz_id(quiz.id)
        .student_id(principal.user_id())
        .answers(input.answers)
        .score(Some(card.score))
        .max_score(card.max_score)
        .is_graded(true)
        .started_at(now)
        .completed_at(Some(now))
        .build();

    let stored = repo
        .record_attempt(&attempt, quiz.max_attempts)
        .await
        .map_err(|e| match e {
            StoreError::LimitReached => {
                tracing::warn!(max_attempts = quiz.max_attempts, "Attempt rejected at insert, cap reached.");
                Error::operation(AttemptQuizError::MaxAttemptsReached)
            }
            e => {
                tracing::error!(error = ?e, "Recording attempt failed.");
                Error::internal()
            }
        })?;
    tracing::info!(
        attempt_number = stored.attempt_number,
        score = card.score,
        max_score = card.max_score,
        "Quiz attempt graded."
    );

    let views = repo
        .attempts(quiz.id, Some(principal.user_id()))
        .await
        .map_err(service_core::simple_err_map!("Reloading attempt failed.", Error::internal()))?;
    views.into_iter().find(|v| v.attempt.id == stored.id).ok_or_else(|| {
        tracing::error!(attempt_id = %stored.id, "Recorded attempt is missing.");
        Error::internal()
    })
}
