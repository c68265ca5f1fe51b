use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;
use uuid::Uuid;

/// A quiz question. Apart from its type and optional correct answer, the payload is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: String,

    /// `None` when the key is absent. An explicit `null` is kept as `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Value>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl Question {
    /// The answer to score against. A `null` answer marks the question as unscored.
    pub fn answer_key(&self) -> Option<&Value> {
        self.correct_answer.as_ref().filter(|answer| !answer.is_null())
    }

    /// The question as shown to someone taking the quiz.
    pub fn without_answer(&self) -> Question {
        Question {
            correct_answer: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Quiz {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub teacher_id: Uuid,

    #[builder(setter(into))]
    pub title: String,

    #[builder(default)]
    pub description: Option<String>,

    #[builder(default)]
    pub subject_id: Option<Uuid>,

    #[builder(default)]
    pub level_id: Option<Uuid>,

    #[builder(default)]
    pub time_limit_minutes: Option<u32>,

    #[builder(default = false)]
    pub shuffle_questions: bool,

    #[builder(default = false)]
    pub shuffle_answers: bool,

    #[builder(default = 1)]
    pub max_attempts: u32,

    pub questions: Vec<Question>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

/// One submitted answer, addressed by the position of its question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_index: usize,
    pub answer: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct Attempt {
    #[builder(default = Uuid::new_v4())]
    pub id: Uuid,

    pub quiz_id: Uuid,

    pub student_id: Uuid,

    /// 1-based position among the student's attempts; assigned by the store.
    #[builder(default = 0)]
    pub attempt_number: u32,

    pub answers: Vec<Answer>,

    #[builder(default)]
    pub score: Option<u32>,

    pub max_score: u32,

    #[builder(default = false)]
    pub is_graded: bool,

    #[builder(default = Utc::now())]
    pub started_at: DateTime<Utc>,

    #[builder(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Attempt {
    /// Score as a percentage of the maximum; 0 when nothing could be scored.
    pub fn percentage(&self) -> f64 {
        match (self.score, self.max_score) {
            (Some(score), max) if max > 0 => f64::from(score) * 100.0 / f64::from(max),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptView {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub student_name: String,
    pub percentage: f64,
}

impl AttemptView {
    pub fn new(attempt: Attempt, student_name: String) -> Self {
        let percentage = attempt.percentage();
        AttemptView {
            attempt,
            student_name,
            percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizView {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub teacher_name: String,
    /// Attempts used by the caller, only set for non-owners.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResults {
    pub quiz_id: Uuid,
    pub attempts: Vec<AttemptView>,
    pub total_attempts: usize,
    pub average_score: f64,
}
