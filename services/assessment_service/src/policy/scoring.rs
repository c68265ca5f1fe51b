use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Answer, Question};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub score: u32,
    pub max_score: u32,
}

/// String form used to compare answers: strings compare by content, anything else by its JSON
/// text. `"4"` and `4` are therefore the same answer.
pub fn canonical_answer(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Scores `answers` against the correct answers stored on `questions`.
///
/// One point per exact match. Questions without a correct answer (essays, free text) are never
/// scored, yet `max_score` is always the question count, so they cap the reachable percentage.
/// When the same question index is answered more than once, the last answer wins.
pub fn auto_grade(questions: &[Question], answers: &[Answer]) -> ScoreCard {
    let by_index: HashMap<usize, &Value> = answers.iter().map(|a| (a.question_index, &a.answer)).collect();

    let score = questions
        .iter()
        .enumerate()
        .filter_map(|(idx, question)| question.answer_key().map(|correct| (idx, correct)))
        .filter(|(idx, correct)| {
            by_index
                .get(idx)
                .map_or(false, |given| canonical_answer(given) == canonical_answer(correct))
        })
        .count();

    ScoreCard {
        score: score as u32,
        max_score: questions.len() as u32,
    }
}
