use service_core::{EndpointError, OperationError, Principal, Role};
use uuid::Uuid;

use crate::domain::{AttemptView, QuizResults};
use crate::repository::QuizRepository;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum GetQuizResultsError {
    #[error("Quiz not found.")]
    QuizNotFound,

    #[error("Not allowed to see results of this quiz.")]
    NotAuthorized,
}

impl OperationError for GetQuizResultsError {
    fn code(&self) -> tonic::Code {
        match self {
            GetQuizResultsError::QuizNotFound => tonic::Code::NotFound,
            GetQuizResultsError::NotAuthorized => tonic::Code::PermissionDenied,
        }
    }
}

type Error = EndpointError<GetQuizResultsError>;

fn average_score(attempts: &[AttemptView]) -> f64 {
    let scores: Vec<f64> = attempts.iter().filter_map(|v| v.attempt.score).map(f64::from).collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// The owning teacher sees every attempt, a student only their own.
#[tracing::instrument(skip(repo, principal), fields(principal = %principal))]
pub async fn get_quiz_results(
    repo: &impl QuizRepository,
    principal: &Principal,
    quiz_id: Uuid,
) -> Result<QuizResults, Error> {
    let quiz = repo
        .quiz(quiz_id)
        .await
        .map_err(super::not_found_or_internal(GetQuizResultsError::QuizNotFound, "Loading quiz"))?;

    let student_filter = if quiz.teacher_id == principal.user_id() {
        None
    } else if principal.role() == Role::Student {
        Some(principal.user_id())
    } else {
        tracing::warn!("Quiz results denied.");
        return Err(Error::operation(GetQuizResultsError::NotAuthorized));
    };

    let attempts = repo
        .attempts(quiz.id, student_filter)
        .await
        .map_err(service_core::simple_err_map!("Listing attempts failed.", Error::internal()))?;

    Ok(QuizResults {
        quiz_id: quiz.id,
        total_attempts: attempts.len(),
        average_score: average_score(&attempts),
        attempts,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{Attempt, Quiz};
    use crate::operations::test_support::{questions, world, World};

    async fn quiz_with_scores(world: &World, scores: &[(Principal, Option<u32>)]) -> Quiz {
        let quiz = Quiz::builder()
            .teacher_id(world.teacher.user_id())
            .title("Warm up")
            .max_attempts(5)
            .questions(questions())
            .build();
        world.store.insert_quiz(&quiz).await.unwrap();

        for (student, score) in scores {
            let attempt = Attempt::builder()
                .quiz_id(quiz.id)
                .student_id(student.user_id())
                .answers(vec![])
                .score(*score)
                .max_score(3)
                .build();
            world.store.record_attempt(&attempt, quiz.max_attempts).await.unwrap();
        }
        quiz
    }

    #[rstest]
    #[tokio::test]
    async fn owner_sees_all_attempts(world: World) {
        let quiz = quiz_with_scores(
            &world,
            &[(world.student, Some(3)), (world.student, Some(1)), (world.classmate, Some(2))],
        )
        .await;

        let results = get_quiz_results(&world.store, &world.teacher, quiz.id).await.unwrap();
        assert_eq!(results.total_attempts, 3);
        assert_eq!(results.average_score, 2.0);
    }

    #[rstest]
    #[tokio::test]
    async fn student_sees_own_attempts(world: World) {
        let quiz = quiz_with_scores(
            &world,
            &[(world.student, Some(3)), (world.student, None), (world.classmate, Some(0))],
        )
        .await;

        let results = get_quiz_results(&world.store, &world.student, quiz.id).await.unwrap();
        assert_eq!(results.total_attempts, 2);
        assert_eq!(results.average_score, 3.0);
        assert!(results.attempts.iter().all(|v| v.attempt.student_id == world.student.user_id()));
    }

    #[rstest]
    #[tokio::test]
    async fn no_attempts_average_zero(world: World) {
        let quiz = quiz_with_scores(&world, &[]).await;

        let results = get_quiz_results(&world.store, &world.classmate, quiz.id).await.unwrap();
        assert_eq!((results.total_attempts, results.average_score), (0, 0.0));
    }

    #[rstest]
    #[tokio::test]
    async fn other_roles_are_denied(world: World) {
        let quiz = quiz_with_scores(&world, &[(world.student, Some(3))]).await;

        for principal in [&world.other_teacher, &world.parent] {
            let err = get_quiz_results(&world.store, principal, quiz.id).await.unwrap_err();
            assert!(matches!(err.as_operation(), Some(GetQuizResultsError::NotAuthorized)));
        }
    }
}
