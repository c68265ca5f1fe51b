use chrono::{DateTime, Utc};

/// A submission is late when it arrives strictly after the deadline. No deadline, never late.
pub fn is_late(submitted_at: DateTime<Utc>, deadline: Option<DateTime<Utc>>) -> bool {
    match deadline {
        Some(deadline) => submitted_at > deadline,
        None => false,
    }
}

/// Reduces `grade` by `penalty_percent` when the work was late. Penalties above 100 are capped.
pub fn apply_late_penalty(grade: f64, is_late: bool, penalty_percent: u8) -> f64 {
    if !is_late || penalty_percent == 0 {
        return grade;
    }

    let penalty = f64::from(penalty_percent.min(100)) / 100.0;
    grade * (1.0 - penalty)
}
