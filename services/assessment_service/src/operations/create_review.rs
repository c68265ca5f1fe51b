use serde::Deserialize;
use serde_json::json;
use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;
use validator::Validate;

use crate::domain::{Review, ReviewView};
use crate::notifications::{dispatch, Notification, NotificationKind, Notifier};
use crate::repository::{ReviewRepository, StoreError};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewInput {
    pub session_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: u8,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub knowledge_rating: Option<u8>,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub communication_rating: Option<u8>,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub punctuality_rating: Option<u8>,
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub patience_rating: Option<u8>,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub comment: Option<String>,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CreateReviewError {
    #[error("Session not found.")]
    SessionNotFound,

    #[error("Session is not completed yet.")]
    SessionNotDone,

    #[error("Only participants of the session can review it.")]
    NotAuthorized,

    #[error("Session already reviewed.")]
    AlreadyReviewed,
}

impl OperationError for CreateReviewError {
    fn code(&self) -> tonic::Code {
        match self {
            CreateReviewError::SessionNotFound => tonic::Code::NotFound,
            CreateReviewError::SessionNotDone => tonic::Code::FailedPrecondition,
            CreateReviewError::NotAuthorized => tonic::Code::PermissionDenied,
            CreateReviewError::AlreadyReviewed => tonic::Code::AlreadyExists,
        }
    }
}

type Error = EndpointError<CreateReviewError>;

/// Reviews the teacher of a completed session the caller took part in. One review per session
/// and reviewer.
#[tracing::instrument(skip(repo, notifier, principal, input), fields(principal = %principal, session_id = %input.session_id))]
pub async fn create_review(
    repo: &impl ReviewRepository,
    notifier: &(impl Notifier + ?Sized),
    principal: &Principal,
    input: CreateReviewInput,
) -> Result<ReviewView, Error> {
    super::validate(&input)?;

    let session = repo
        .session(input.session_id)
        .await
        .map_err(super::not_found_or_internal(CreateReviewError::SessionNotFound, "Loading session"))?;
    if !session.is_completed() {
        return Err(Error::operation(CreateReviewError::SessionNotDone));
    }
    if !session.has_participant(&principal.user_id()) {
        tracing::warn!("Review denied to non-participant.");
        return Err(Error::operation(CreateReviewError::NotAuthorized));
    }

    let review = Review::builder()
        .session_id(session.id)
        .reviewer_id(principal.user_id())
        .teacher_id(session.teacher_id)
        .rating(input.rating)
        .knowledge_rating(input.knowledge_rating)
        .communication_rating(input.communication_rating)
        .punctuality_rating(input.punctuality_rating)
        .patience_rating(input.patience_rating)
        .comment(input.comment)
        .build();

    repo.insert_review(&review).await.map_err(|e| match e {
        StoreError::Duplicate => Error::operation(CreateReviewError::AlreadyReviewed),
        e => {
            tracing::error!(error = ?e, "Inserting review failed.");
            Error::internal()
        }
    })?;

    dispatch(
        notifier,
        Notification {
            user_id: review.teacher_id,
            kind: NotificationKind::NewReview,
            title: "New review".to_owned(),
            body: format!("You received a {}-star review.", review.rating),
            data: json!({ "review_id": review.id, "session_id": review.session_id, "rating": review.rating }),
        },
    )
    .await;

    repo.review_view(review.id)
        .await
        .map_err(service_core::simple_err_map!("Reloading review failed.", Error::internal()))
}
