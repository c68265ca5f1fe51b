//! Outbound notifications raised by lifecycle transitions.
//!
//! Delivery belongs to the collaborator behind [`Notifier`]. The engine never waits on the outcome:
//! a failed notification is logged and the operation carries on.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use strum::AsRefStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    HomeworkAssigned,
    HomeworkGraded,
    NewReview,
    ReviewResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: Value,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Writes every notification to the log instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let kind: &str = notification.kind.as_ref();
        tracing::info!(
            user_id = %notification.user_id,
            kind,
            title = %notification.title,
            data = %notification.data,
            "notification raised"
        );
        Ok(())
    }
}

/// Hands the notification to `notifier`, logging and swallowing any failure.
pub(crate) async fn dispatch(notifier: &(impl Notifier + ?Sized), notification: Notification) {
    let user_id = notification.user_id;
    let kind = notification.kind;

    if let Err(e) = notifier.notify(notification).await {
        let kind: &str = kind.as_ref();
        tracing::warn!(%user_id, kind, error = %e, "failed to raise notification");
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::RecordingNotifier;
    use super::*;

    fn graded(user_id: Uuid) -> Notification {
        Notification {
            user_id,
            kind: NotificationKind::HomeworkGraded,
            title: "Homework graded".into(),
            body: "Essay: 8/10".into(),
            data: json!({"grade": 8.0}),
        }
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let notifier = RecordingNotifier::failing();
        dispatch(&notifier, graded(Uuid::nil())).await;

        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn tracing_notifier_accepts_everything() {
        assert!(TracingNotifier.notify(graded(Uuid::new_v4())).await.is_ok());
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(serde_json::to_value(NotificationKind::NewReview).unwrap(), json!("new_review"));
        let kind: &str = NotificationKind::ReviewResponse.as_ref();
        assert_eq!(kind, "review_response");
    }
}
