use serde::Deserialize;
use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Question, Quiz, QuizView};
use crate::repository::QuizRepository;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizInput {
    #[validate(length(min = 3, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject_id: Option<Uuid>,
    #[serde(default)]
    pub level_id: Option<Uuid>,
    #[serde(default)]
    #[validate(range(min = 1))]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub shuffle_questions: bool,
    #[serde(default)]
    pub shuffle_answers: bool,
    #[serde(default = "max_attempts_default")]
    #[validate(range(min = 1))]
    pub max_attempts: u32,
    pub questions: Vec<Question>,
}

fn max_attempts_default() -> u32 {
    1
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CreateQuizError {
    #[error("Only teachers can create quizzes.")]
    NotAuthorized,
}

impl OperationError for CreateQuizError {
    fn code(&self) -> tonic::Code {
        match self {
            CreateQuizError::NotAuthorized => tonic::Code::PermissionDenied,
        }
    }
}

type Error = EndpointError<CreateQuizError>;

/// Stores the quiz with its questions as given.
#[tracing::instrument(skip(repo, principal, input), fields(principal = %principal, title = %input.title))]
pub async fn create_quiz(
    repo: &impl QuizRepository,
    principal: &Principal,
    input: CreateQuizInput,
) -> Result<QuizView, Error> {
    super::validate(&input)?;
    if !principal.is_teacher() {
        tracing::warn!("Non-teacher attempted to create a quiz.");
        return Err(Error::operation(CreateQuizError::NotAuthorized));
    }

    let quiz = Quiz::builder()
        .teacher_id(principal.user_id())
        .title(input.title)
        .description(input.description)
        .subject_id(input.subject_id)
        .level_id(input.level_id)
        .time_limit_minutes(input.time_limit_minutes)
        .shuffle_questions(input.shuffle_questions)
        .shuffle_answers(input.shuffle_answers)
        .max_attempts(input.max_attempts)
        .questions(input.questions)
        .build();

    repo.insert_quiz(&quiz)
        .await
        .map_err(service_core::simple_err_map!("Inserting quiz failed.", Error::internal()))?;

    repo.quiz_view(quiz.id)
        .await
        .map_err(service_core::simple_err_map!("Reloading quiz failed.", Error::internal()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::operations::test_support::{questions, world, World};

    fn input(max_attempts: u32) -> CreateQuizInput {
        CreateQuizInput {
            title: "Arithmetic check".to_owned(),
            description: None,
            subject_id: None,
            level_id: None,
            time_limit_minutes: Some(15),
            shuffle_questions: true,
            shuffle_answers: false,
            max_attempts,
            questions: questions(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn stores_questions_verbatim(world: World) {
        let view = create_quiz(&world.store, &world.teacher, input(2)).await.unwrap();

        assert_eq!(view.teacher_name, "Jennifer Honey");
        assert_eq!(view.quiz.questions, questions());
        assert_eq!(view.quiz.max_attempts, 2);
        assert!(view.quiz.shuffle_questions);
        assert_eq!(view.attempts_remaining, None);
    }

    #[rstest]
    #[tokio::test]
    async fn zero_attempts_is_invalid(world: World) {
        let err = create_quiz(&world.store, &world.teacher, input(0)).await.unwrap_err();
        assert!(matches!(err, EndpointError::Validation(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn zero_minute_time_limit_is_invalid(world: World) {
        let mut input = input(1);
        input.time_limit_minutes = Some(0);

        let err = create_quiz(&world.store, &world.teacher, input).await.unwrap_err();
        assert!(matches!(err, EndpointError::Validation(_)));
    }

    #[rstest]
    #[tokio::test]
    async fn parents_cannot_create_quizzes(world: World) {
        let err = create_quiz(&world.store, &world.parent, input(1)).await.unwrap_err();
        assert!(matches!(err.as_operation(), Some(CreateQuizError::NotAuthorized)));
    }
}
