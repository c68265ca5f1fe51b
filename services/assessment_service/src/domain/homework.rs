use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use crate::policy::lateness::apply_late_penalty;

/// Progress of a student on a piece of homework. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssignmentStatus {
    Assigned,
    Submitted,
    Graded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Homework {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub teacher_id: Uuid,

    #[builder(setter(into))]
    pub title: String,

    #[builder(default)]
    pub description: Option<String>,

    #[builder(default)]
    pub instructions: Option<String>,

    #[builder(default)]
    pub subject_id: Option<Uuid>,

    #[builder(default)]
    pub level_id: Option<Uuid>,

    #[builder(default)]
    pub deadline: Option<DateTime<Utc>>,

    #[builder(default = true)]
    pub allow_late: bool,

    #[builder(default = 0)]
    pub late_penalty_percent: u8,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

/// Homework joined with the display names of what it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeworkView {
    #[serde(flatten)]
    pub homework: Homework,
    pub teacher_name: String,
    pub subject_name: Option<String>,
    pub level_name: Option<String>,
    /// Status of the caller's own assignment, only set for students.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_status: Option<AssignmentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Submission {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub homework_id: Uuid,

    pub student_id: Uuid,

    #[builder(default)]
    pub content: Option<String>,

    #[builder(default)]
    pub file_refs: Vec<String>,

    pub is_late: bool,

    #[builder(default = Utc::now())]
    pub submitted_at: DateTime<Utc>,

    #[builder(default)]
    pub grade: Option<f64>,

    #[builder(default)]
    pub max_grade: Option<f64>,

    #[builder(default)]
    pub feedback: Option<String>,

    #[builder(default)]
    pub graded_at: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn is_graded(&self) -> bool {
        self.graded_at.is_some()
    }
}

/// The fields written when a teacher grades a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Grade {
    pub grade: f64,
    pub max_grade: f64,
    pub feedback: Option<String>,
    pub graded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: Submission,
    pub student_name: String,
    /// Grade after the homework's late penalty, derived on read.
    pub adjusted_grade: Option<f64>,
}

impl SubmissionView {
    pub fn new(submission: Submission, student_name: String, late_penalty_percent: u8) -> Self {
        let adjusted_grade = submission
            .grade
            .map(|grade| apply_late_penalty(grade, submission.is_late, late_penalty_percent));

        SubmissionView {
            submission,
            student_name,
            adjusted_grade,
        }
    }
}
