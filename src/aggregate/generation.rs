//! Free-text responses and per-annotator writing statistics.

use serde::{Deserialize, Serialize};

use crate::model::{Answer, AnswerRules, Task};

/// One annotator's text for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub user_id: String,
    pub text: String,
}

/// Raw responses for an item, in annotator order. Blank slots are skipped.
pub fn generation_responses(task: &Task, item_index: usize) -> Vec<GenerationResponse> {
    task.responses_by_user
        .iter()
        .filter_map(|(user_id, answers)| match answers.get(item_index) {
            Some(Some(Answer::Generation(text))) if !text.trim().is_empty() => {
                Some(GenerationResponse {
                    user_id: user_id.to_string(),
                    text: text.clone(),
                })
            }
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStats {
    pub total_words: usize,
    pub total_characters: usize,
    /// Rounded to the nearest whole word.
    pub average_words: usize,
    /// Rounded to the nearest whole character.
    pub average_characters: usize,
    pub valid_response_count: usize,
}

/// Statistics over the valid generation answers in one annotator's sequence.
pub fn response_stats(answers: &[Option<Answer>], rules: &AnswerRules) -> ResponseStats {
    let valid: Vec<&str> = answers
        .iter()
        .filter_map(|answer| match answer {
            Some(Answer::Generation(text)) => Some(text.trim()),
            _ => None,
        })
        .filter(|text| text.chars().count() >= rules.min_text_length)
        .collect();

    if valid.is_empty() {
        return ResponseStats::default();
    }

    let total_words: usize = valid.iter().map(|text| text.split_whitespace().count()).sum();
    let total_characters: usize = valid.iter().map(|text| text.chars().count()).sum();
    let n = valid.len() as f64;

    ResponseStats {
        total_words,
        total_characters,
        average_words: (total_words as f64 / n).round() as usize,
        average_characters: (total_characters as f64 / n).round() as usize,
        valid_response_count: valid.len(),
    }
}
