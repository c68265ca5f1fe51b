use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;

use crate::domain::QuizView;
use crate::repository::QuizRepository;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum GetQuizError {
    #[error("Quiz not found.")]
    QuizNotFound,
}

impl OperationError for GetQuizError {
    fn code(&self) -> tonic::Code {
        match self {
            GetQuizError::QuizNotFound => tonic::Code::NotFound,
        }
    }
}

type Error = EndpointError<GetQuizError>;

/// The owner gets the quiz as stored. Anyone else gets it without correct answers, along with
/// their own attempt counts.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn get_quiz(repo: &impl QuizRepository, principal: &Principal, quiz_id: Uuid) -> Result<QuizView, Error> {
    let mut view = repo
        .quiz_view(quiz_id)
        .await
        .map_err(super::not_found_or_internal(GetQuizError::QuizNotFound, "Loading quiz"))?;

    if view.quiz.teacher_id == principal.user_id() {
        return Ok(view);
    }

    let used = repo
        .count_attempts(quiz_id, principal.user_id())
        .await
        .map_err(service_core::simple_err_map!("Counting attempts failed.", Error::internal()))?;

    view.quiz.questions = view.quiz.questions.iter().map(|q| q.without_answer()).collect();
    view.attempts_used = Some(used);
    view.attempts_remaining = Some(view.quiz.max_attempts.saturating_sub(used));
    Ok(view)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{Attempt, Quiz};
    use crate::operations::test_support::{questions, world, World};

    async fn quiz(world: &World) -> Quiz {
        let quiz = Quiz::builder()
            .teacher_id(world.teacher.user_id())
            .title("Warm up")
            .max_attempts(3)
            .questions(questions())
            .build();
        world.store.insert_quiz(&quiz).await.unwrap();
        quiz
    }

    #[rstest]
    #[tokio::test]
    async fn owner_sees_answers(world: World) {
        let quiz = quiz(&world).await;

        let view = get_quiz(&world.store, &world.teacher, quiz.id).await.unwrap();
        assert_eq!(view.quiz.questions, questions());
        assert_eq!(view.attempts_used, None);
    }

    #[rstest]
    #[tokio::test]
    async fn student_sees_stripped_questions_and_remaining_attempts(world: World) {
        let quiz = quiz(&world).await;
        let attempt = Attempt::builder()
            .quiz_id(quiz.id)
            .student_id(world.student.user_id())
            .answers(vec![])
            .max_score(3)
            .build();
        world.store.record_attempt(&attempt, quiz.max_attempts).await.unwrap();

        let view = get_quiz(&world.store, &world.student, quiz.id).await.unwrap();
        assert!(view.quiz.questions.iter().all(|q| q.correct_answer.is_none()));
        assert_eq!(view.quiz.questions[0].payload.get("prompt"), questions()[0].payload.get("prompt"));
        assert_eq!((view.attempts_used, view.attempts_remaining), (Some(1), Some(2)));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_quiz_is_not_found(world: World) {
        let err = get_quiz(&world.store, &world.student, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err.as_operation(), Some(GetQuizError::QuizNotFound)));
    }
}
