//! Entities and denormalized views handled by the assessment lifecycle engine.

pub mod homework;
pub mod page;
pub mod preferences;
pub mod quiz;
pub mod review;

pub use homework::{AssignmentStatus, Grade, Homework, HomeworkView, Submission, SubmissionView};
pub use page::{Page, PageRequest};
pub use preferences::{NotificationPreferences, PreferenceChange, PreferenceColumn, PreferenceValue, PreferencesPatch};
pub use quiz::{Answer, Attempt, AttemptView, Question, Quiz, QuizResults, QuizView};
pub use review::{RatingSummary, Review, ReviewView, Session, SessionStatus, TeacherReviews};
