//! Repository traits describing what the lifecycle operations need from the persistent store.
//!
//! Every method is a single atomic interaction with the store. Implementations must turn
//! uniqueness violations into [`StoreError::Duplicate`] and capped inserts into
//! [`StoreError::LimitReached`] so operations can classify them.

mod error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use error::StoreError;

use crate::domain::{
    AssignmentStatus, Attempt, AttemptView, Grade, Homework, HomeworkView, NotificationPreferences, PreferenceChange,
    Quiz, QuizView, RatingSummary, Review, ReviewView, Session, Submission, SubmissionView,
};

#[async_trait]
pub trait HomeworkRepository: Send + Sync {
    async fn insert_homework(&self, homework: &Homework) -> Result<(), StoreError>;

    /// Links a student to a homework. Returns `false` if the link already existed.
    async fn assign(&self, homework_id: Uuid, student_id: Uuid) -> Result<bool, StoreError>;

    async fn homework(&self, homework_id: Uuid) -> Result<Homework, StoreError>;

    async fn homework_view(&self, homework_id: Uuid) -> Result<HomeworkView, StoreError>;

    async fn assignment_status(&self, homework_id: Uuid, student_id: Uuid)
        -> Result<Option<AssignmentStatus>, StoreError>;

    /// Homework owned by a teacher, newest first, with the total count.
    async fn homework_by_teacher(
        &self,
        teacher_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<HomeworkView>, u64), StoreError>;

    /// Homework assigned to a student, newest first, with the total count.
    async fn homework_for_student(
        &self,
        student_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<(Vec<HomeworkView>, u64), StoreError>;

    /// Inserts the submission and moves the matching assignment from `assigned` to `submitted`.
    async fn record_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    async fn submission(&self, submission_id: Uuid) -> Result<Submission, StoreError>;

    /// Writes the grade and moves the matching assignment to `graded`.
    async fn grade_submission(&self, submission_id: Uuid, grade: &Grade) -> Result<(), StoreError>;

    async fn submissions(&self, homework_id: Uuid, student_id: Option<Uuid>) -> Result<Vec<SubmissionView>, StoreError>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn insert_quiz(&self, quiz: &Quiz) -> Result<(), StoreError>;

    async fn quiz(&self, quiz_id: Uuid) -> Result<Quiz, StoreError>;

    async fn quiz_view(&self, quiz_id: Uuid) -> Result<QuizView, StoreError>;

    async fn count_attempts(&self, quiz_id: Uuid, student_id: Uuid) -> Result<u32, StoreError>;

    /// Inserts the attempt unless the student already has `max_attempts` attempts on the quiz.
    ///
    /// The count and the insert happen atomically. The stored attempt is returned with its
    /// attempt number filled in.
    async fn record_attempt(&self, attempt: &Attempt, max_attempts: u32) -> Result<Attempt, StoreError>;

    /// Attempts on a quiz, optionally restricted to one student, oldest first.
    async fn attempts(&self, quiz_id: Uuid, student_id: Option<Uuid>) -> Result<Vec<AttemptView>, StoreError>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn session(&self, session_id: Uuid) -> Result<Session, StoreError>;

    /// Fails with [`StoreError::Duplicate`] if the reviewer already reviewed the session.
    async fn insert_review(&self, review: &Review) -> Result<(), StoreError>;

    async fn review(&self, review_id: Uuid) -> Result<Review, StoreError>;

    async fn review_view(&self, review_id: Uuid) -> Result<ReviewView, StoreError>;

    async fn rating_summary(&self, teacher_id: Uuid) -> Result<RatingSummary, StoreError>;

    /// Reviews of a teacher, most recent first.
    async fn reviews_for_teacher(&self, teacher_id: Uuid, limit: u32, offset: u64)
        -> Result<Vec<ReviewView>, StoreError>;

    async fn set_response(&self, review_id: Uuid, response: &str, responded_at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PreferencesRepository: Send + Sync {
    async fn preferences(&self, user_id: Uuid) -> Result<Option<NotificationPreferences>, StoreError>;

    /// Creates the row with column defaults; a no-op when it already exists.
    async fn ensure_preferences(&self, user_id: Uuid) -> Result<(), StoreError>;

    /// Writes the given columns, and only those, in a single update.
    async fn apply_changes(
        &self,
        user_id: Uuid,
        changes: &[PreferenceChange],
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}
