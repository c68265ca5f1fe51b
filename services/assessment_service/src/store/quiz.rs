use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use super::{json_column, SqliteStore};
use crate::domain::{Attempt, AttemptView, Quiz, QuizView};
use crate::repository::{QuizRepository, StoreError};

const QUIZ_COLUMNS: &str = "q.id, q.teacher_id, q.title, q.description, q.subject_id, q.level_id,
    q.time_limit_minutes, q.shuffle_questions, q.shuffle_answers, q.max_attempts, q.questions, q.created_at";

fn quiz_from_row(row: &Row<'_>) -> rusqlite::Result<Quiz> {
    Ok(Quiz {
        id: row.get(0)?,
        teacher_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        subject_id: row.get(4)?,
        level_id: row.get(5)?,
        time_limit_minutes: row.get(6)?,
        shuffle_questions: row.get(7)?,
        shuffle_answers: row.get(8)?,
        max_attempts: row.get(9)?,
        questions: json_column(row, 10)?,
        created_at: row.get(11)?,
    })
}

fn attempt_view_from_row(row: &Row<'_>) -> rusqlite::Result<AttemptView> {
    let attempt = Attempt {
        id: row.get(0)?,
        quiz_id: row.get(1)?,
        student_id: row.get(2)?,
        attempt_number: row.get(3)?,
        answers: json_column(row, 4)?,
        score: row.get(5)?,
        max_score: row.get(6)?,
        is_graded: row.get(7)?,
        started_at: row.get(8)?,
        completed_at: row.get(9)?,
    };
    Ok(AttemptView::new(attempt, row.get(10)?))
}

#[async_trait]
impl QuizRepository for SqliteStore {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StoreError> {
        let questions = serde_json::to_string(&quiz.questions)?;

        let quiz = quiz.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO quizzes(id, teacher_id, title, description, subject_id, level_id, time_limit_minutes,
                    shuffle_questions, shuffle_answers, max_attempts, questions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    quiz.id,
                    quiz.teacher_id,
                    quiz.title,
                    quiz.description,
                    quiz.subject_id,
                    quiz.level_id,
                    quiz.time_limit_minutes,
                    quiz.shuffle_questions,
                    quiz.shuffle_answers,
                    quiz.max_attempts,
                    questions,
                    quiz.created_at,
                ],
            )
            .map_err(super::duplicate_on_conflict)?;
            Ok(())
        })
        .await
    }

    async fn quiz(&self, quiz_id: Uuid) -> Result<Quiz, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM quizzes q WHERE q.id = ?1", QUIZ_COLUMNS),
                params![quiz_id],
                quiz_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn quiz_view(&self, quiz_id: Uuid) -> Result<QuizView, StoreError> {
        self.run(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {}, t.display_name FROM quizzes q JOIN users t ON t.id = q.teacher_id WHERE q.id = ?1",
                    QUIZ_COLUMNS
                ),
                params![quiz_id],
                |row| {
                    Ok(QuizView {
                        quiz: quiz_from_row(row)?,
                        teacher_name: row.get(12)?,
                        attempts_used: None,
                        attempts_remaining: None,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn count_attempts(&self, quiz_id: Uuid, student_id: Uuid) -> Result<u32, StoreError> {
        self.run(move |conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = ?1 AND student_id = ?2",
                params![quiz_id, student_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
    }

    async fn record_attempt(&self, attempt: &Attempt, max_attempts: u32) -> Result<Attempt, StoreError> {
        let answers = serde_json::to_string(&attempt.answers)?;
        let attempt = attempt.clone();
        self.run(move |conn| {
            // Taking the write lock up front keeps the count valid until the insert commits.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let used: u32 = tx.query_row(
                "SELECT COUNT(*) FROM quiz_attempts WHERE quiz_id = ?1 AND student_id = ?2",
                params![attempt.quiz_id, attempt.student_id],
                |row| row.get(0),
            )?;
            if used >= max_attempts {
                return Err(StoreError::LimitReached);
            }

            let stored = Attempt {
                attempt_number: used + 1,
                ..attempt
            };
            tx.execute(
                "INSERT INTO quiz_attempts(id, quiz_id, student_id, attempt_number, answers, score, max_score,
                    is_graded, started_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    stored.id,
                    stored.quiz_id,
                    stored.student_id,
                    stored.attempt_number,
                    answers,
                    stored.score,
                    stored.max_score,
                    stored.is_graded,
                    stored.started_at,
                    stored.completed_at,
                ],
            )
            .map_err(super::duplicate_on_conflict)?;
            tx.commit()?;

            Ok(stored)
        })
        .await
    }

    async fn attempts(&self, quiz_id: Uuid, student_id: Option<Uuid>) -> Result<Vec<AttemptView>, StoreError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT a.id, a.quiz_id, a.student_id, a.attempt_number, a.answers, a.score, a.max_score,
                    a.is_graded, a.started_at, a.completed_at, u.display_name
                 FROM quiz_attempts a
                 JOIN users u ON u.id = a.student_id
                 WHERE a.quiz_id = ?1 AND (?2 IS NULL OR a.student_id = ?2)
                 ORDER BY a.started_at, a.attempt_number",
            )?;
            let attempts = stmt
                .query_map(params![quiz_id, student_id], attempt_view_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(attempts)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use service_core::Role;

    use super::*;
    use crate::domain::{Answer, Question};

    fn seeded() -> (SqliteStore, Quiz, Uuid) {
        let store = SqliteStore::open_in_memory().unwrap();
        let teacher = Uuid::new_v4();
        let student = Uuid::new_v4();
        store.register_user(teacher, "Mr. Keating", Role::Teacher).unwrap();
        store.register_user(student, "Todd Anderson", Role::Student).unwrap();

        let question: Question = serde_json::from_value(json!({"type": "short", "correct_answer": "carpe diem"})).unwrap();
        let quiz = Quiz::builder()
            .teacher_id(teacher)
            .title("Latin phrases")
            .max_attempts(2)
            .questions(vec![question])
            .build();

        (store, quiz, student)
    }

    fn attempt(quiz: &Quiz, student: Uuid) -> Attempt {
        Attempt::builder()
            .quiz_id(quiz.id)
            .student_id(student)
            .answers(vec![Answer {
                question_index: 0,
                answer: json!("carpe diem"),
            }])
            .score(Some(1))
            .max_score(1)
            .is_graded(true)
            .build()
    }

    #[tokio::test]
    async fn questions_survive_storage() {
        let (store, quiz, _) = seeded();
        store.insert_quiz(&quiz).await.unwrap();

        let loaded = store.quiz(quiz.id).await.unwrap();
        assert_eq!(loaded.questions, quiz.questions);
        assert_eq!(store.quiz_view(quiz.id).await.unwrap().teacher_name, "Mr. Keating");
    }

    #[tokio::test]
    async fn attempts_are_numbered_and_capped() {
        let (store, quiz, student) = seeded();
        store.insert_quiz(&quiz).await.unwrap();

        let first = store.record_attempt(&attempt(&quiz, student), 2).await.unwrap();
        let second = store.record_attempt(&attempt(&quiz, student), 2).await.unwrap();
        let third = store.record_attempt(&attempt(&quiz, student), 2).await;

        assert_eq!((first.attempt_number, second.attempt_number), (1, 2));
        assert!(matches!(third, Err(StoreError::LimitReached)));
        assert_eq!(store.count_attempts(quiz.id, student).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn attempts_filter_by_student() {
        let (store, quiz, student) = seeded();
        let other = Uuid::new_v4();
        store.register_user(other, "Neil Perry", Role::Student).unwrap();
        store.insert_quiz(&quiz).await.unwrap();
        store.record_attempt(&attempt(&quiz, student), 2).await.unwrap();
        store.record_attempt(&attempt(&quiz, other), 2).await.unwrap();

        assert_eq!(store.attempts(quiz.id, None).await.unwrap().len(), 2);

        let own = store.attempts(quiz.id, Some(other)).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].student_name, "Neil Perry");
        assert_eq!(own[0].percentage, 100.0);
    }
}
