//! One module per lifecycle operation.
//!
//! Every operation takes the verified [`Principal`](service_core::Principal) of the caller, checks
//! its preconditions against the store, performs at most one mutation and returns a freshly
//! reloaded view. Failures are classified into the operation's own error type; store failures
//! nobody expects are logged and surface as [`EndpointError::Internal`].

mod attempt_quiz;
mod create_homework;
mod create_quiz;
mod create_review;
mod get_homework;
mod get_preferences;
mod get_quiz;
mod get_quiz_results;
mod get_teacher_reviews;
mod grade_homework;
mod list_homework;
mod list_submissions;
mod respond_to_review;
mod submit_homework;
mod update_preferences;

#[cfg(test)]
pub(crate) mod test_support;

pub use attempt_quiz::{attempt_quiz, AttemptQuizError, AttemptQuizInput};
pub use create_homework::{create_homework, CreateHomeworkError, CreateHomeworkInput};
pub use create_quiz::{create_quiz, CreateQuizError, CreateQuizInput};
pub use create_review::{create_review, CreateReviewError, CreateReviewInput};
pub use get_homework::{get_homework, GetHomeworkError};
pub use get_preferences::get_preferences;
pub use get_quiz::{get_quiz, GetQuizError};
pub use get_quiz_results::{get_quiz_results, GetQuizResultsError};
pub use get_teacher_reviews::{get_teacher_reviews, ReviewPageRequest};
pub use grade_homework::{grade_homework, GradeHomeworkError, GradeHomeworkInput};
pub use list_homework::list_homework;
pub use list_submissions::{list_submissions, ListSubmissionsError};
pub use respond_to_review::{respond_to_review, RespondToReviewError, RespondToReviewInput};
pub use submit_homework::{submit_homework, SubmitHomeworkError, SubmitHomeworkInput};
pub use update_preferences::update_preferences;

use service_core::{EndpointError, OperationError};
use validator::Validate;

use crate::repository::StoreError;

fn validate<E: OperationError>(input: &impl Validate) -> Result<(), EndpointError<E>> {
    input.validate().map_err(|e| EndpointError::validation(e.to_string()))
}

/// Maps `StoreError::NotFound` to `not_found` and logs anything else as an internal failure.
fn not_found_or_internal<E: OperationError>(
    not_found: E,
    action: &'static str,
) -> impl FnOnce(StoreError) -> EndpointError<E> {
    move |err| match err {
        StoreError::NotFound => EndpointError::operation(not_found),
        err => {
            tracing::error!(error = ?err, "{} failed.", action);
            EndpointError::internal()
        }
    }
}
