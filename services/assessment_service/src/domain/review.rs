use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use typed_builder::TypedBuilder;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

/// The part of a tutoring session the review lifecycle looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub status: SessionStatus,
    pub participant_ids: Vec<Uuid>,
}

impl Session {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn has_participant(&self, user_id: &Uuid) -> bool {
        self.participant_ids.contains(user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Review {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub session_id: Uuid,

    pub reviewer_id: Uuid,

    pub teacher_id: Uuid,

    pub rating: u8,

    #[builder(default)]
    pub knowledge_rating: Option<u8>,

    #[builder(default)]
    pub communication_rating: Option<u8>,

    #[builder(default)]
    pub punctuality_rating: Option<u8>,

    #[builder(default)]
    pub patience_rating: Option<u8>,

    #[builder(default)]
    pub comment: Option<String>,

    #[builder(default)]
    pub teacher_response: Option<String>,

    #[builder(default)]
    pub responded_at: Option<DateTime<Utc>>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    pub reviewer_name: String,
    pub teacher_name: String,
}

/// Aggregate ratings of a teacher. Each sub-rating average only covers the reviews that set it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub total_reviews: u64,
    pub average_rating: Option<f64>,
    pub average_knowledge: Option<f64>,
    pub average_communication: Option<f64>,
    pub average_punctuality: Option<f64>,
    pub average_patience: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherReviews {
    pub teacher_id: Uuid,
    pub summary: RatingSummary,
    pub reviews: Vec<ReviewView>,
    pub limit: u32,
    pub offset: u64,
}
