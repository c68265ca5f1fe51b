//! Pure functions deciding lateness and quiz scores. Nothing in here touches the store.

pub mod lateness;
pub mod scoring;

pub use lateness::{apply_late_penalty, is_late};
pub use scoring::{auto_grade, canonical_answer, ScoreCard};
