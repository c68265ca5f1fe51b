use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use service_core::{EndpointError, OperationError, Principal};
use uuid::Uuid;
use validator::Validate;

use crate::domain::ReviewView;
use crate::notifications::{dispatch, Notification, NotificationKind, Notifier};
use crate::repository::ReviewRepository;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RespondToReviewInput {
    #[validate(length(min = 1, max = 5000))]
    pub response: String,
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RespondToReviewError {
    #[error("Review not found.")]
    ReviewNotFound,

    #[error("Only the reviewed teacher can respond.")]
    NotAuthorized,
}

impl OperationError for RespondToReviewError {
    fn code(&self) -> tonic::Code {
        match self {
            RespondToReviewError::ReviewNotFound => tonic::Code::NotFound,
            RespondToReviewError::NotAuthorized => tonic::Code::PermissionDenied,
        }
    }
}

type Error = EndpointError<RespondToReviewError>;

/// Attaches the teacher's response. Responding again replaces the earlier response.
#[tracing::instrument(skip(repo, notifier, principal, input), fields(principal = %principal))]
pub async fn respond_to_review(
    repo: &impl ReviewRepository,
    notifier: &(impl Notifier + ?Sized),
    principal: &Principal,
    review_id: Uuid,
    input: RespondToReviewInput,
) -> Result<ReviewView, Error> {
    super::validate(&input)?;

    let review = repo
        .review(review_id)
        .await
        .map_err(super::not_found_or_internal(RespondToReviewError::ReviewNotFound, "Loading review"))?;
    if review.teacher_id != principal.user_id() {
        tracing::warn!("Response denied to someone other than the reviewed teacher.");
        return Err(Error::operation(RespondToReviewError::NotAuthorized));
    }

    repo.set_response(review.id, &input.response, Utc::now())
        .await
        .map_err(super::not_found_or_internal(RespondToReviewError::ReviewNotFound, "Saving response"))?;

    dispatch(
        notifier,
        Notification {
            user_id: review.reviewer_id,
            kind: NotificationKind::ReviewResponse,
            title: "Your review got a response".to_owned(),
            body: input.response,
            data: json!({ "review_id": review.id }),
        },
    )
    .await;

    repo.review_view(review.id)
        .await
        .map_err(service_core::simple_err_map!("Reloading review failed.", Error::internal()))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::{Review, SessionStatus};
    use crate::notifications::testing::RecordingNotifier;
    use crate::operations::test_support::{world, World};

    async fn review(world: &World) -> Review {
        let session = world.session(SessionStatus::Completed);
        let review = Review::builder()
            .session_id(session.id)
            .reviewer_id(world.student.user_id())
            .teacher_id(world.teacher.user_id())
            .rating(4)
            .build();
        world.store.insert_review(&review).await.unwrap();
        review
    }

    fn respond(text: &str) -> RespondToReviewInput {
        RespondToReviewInput {
            response: text.to_owned(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn second_response_replaces_first(world: World) {
        let notifier = RecordingNotifier::default();
        let review = review(&world).await;

        respond_to_review(&world.store, &notifier, &world.teacher, review.id, respond("Thank you!"))
            .await
            .unwrap();
        let view = respond_to_review(&world.store, &notifier, &world.teacher, review.id, respond("Thanks, Matilda."))
            .await
            .unwrap();

        assert_eq!(view.review.teacher_response.as_deref(), Some("Thanks, Matilda."));
        assert!(view.review.responded_at.is_some());

        let sent = notifier.sent_to(world.student.user_id());
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|n| n.kind == NotificationKind::ReviewResponse));
    }

    #[rstest]
    #[tokio::test]
    async fn only_reviewed_teacher_may_respond(world: World) {
        let notifier = RecordingNotifier::default();
        let review = review(&world).await;

        for principal in [&world.other_teacher, &world.student] {
            let err = respond_to_review(&world.store, &notifier, principal, review.id, respond("Hmm."))
                .await
                .unwrap_err();
            assert!(matches!(err.as_operation(), Some(RespondToReviewError::NotAuthorized)));
        }
        assert_eq!(world.store.review(review.id).await.unwrap().teacher_response, None);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_review_is_not_found(world: World) {
        let notifier = RecordingNotifier::default();
        let err = respond_to_review(&world.store, &notifier, &world.teacher, Uuid::new_v4(), respond("Hi"))
            .await
            .unwrap_err();
        assert!(matches!(err.as_operation(), Some(RespondToReviewError::ReviewNotFound)));
    }

    #[rstest]
    #[tokio::test]
    async fn empty_response_is_invalid(world: World) {
        let notifier = RecordingNotifier::default();
        let review = review(&world).await;

        let err = respond_to_review(&world.store, &notifier, &world.teacher, review.id, respond(""))
            .await
            .unwrap_err();
        assert!(matches!(err, EndpointError::Validation(_)));
    }
}
