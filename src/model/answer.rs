//! Task types, dataset items and per-item answers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default minimum trimmed length for a generation answer to count as valid.
pub const DEFAULT_MIN_TEXT_LENGTH: usize = 3;

/// Kind of annotation a task collects. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "text-classification")]
    Classification,
    #[serde(rename = "text-to-text")]
    Generation,
    #[serde(rename = "text-ranking")]
    Ranking,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classification => write!(f, "text-classification"),
            Self::Generation => write!(f, "text-to-text"),
            Self::Ranking => write!(f, "text-ranking"),
        }
    }
}

/// One unit to annotate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub text: String,
    /// Options for classification and ranking. Ignored for generation.
    #[serde(default)]
    pub choices: Vec<String>,
}

impl Item {
    pub fn new(text: impl Into<String>, choices: &[&str]) -> Self {
        Self {
            text: text.into(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// One annotator's response to one item.
///
/// An unanswered slot is `None` in an answer sequence, never an `Answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// The selected option text.
    Classification(String),
    /// Free text.
    Generation(String),
    /// Choice indices, most preferred first.
    Ranking(Vec<usize>),
}

impl Answer {
    pub fn task_type(&self) -> TaskType {
        match self {
            Self::Classification(_) => TaskType::Classification,
            Self::Generation(_) => TaskType::Generation,
            Self::Ranking(_) => TaskType::Ranking,
        }
    }

    /// The string payload of a classification or generation answer.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Classification(s) | Self::Generation(s) => Some(s),
            Self::Ranking(_) => None,
        }
    }

    pub fn as_order(&self) -> Option<&[usize]> {
        match self {
            Self::Ranking(order) => Some(order),
            _ => None,
        }
    }

    /// Whether the answer carries no content at all.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Classification(s) | Self::Generation(s) => s.is_empty(),
            Self::Ranking(order) => order.is_empty(),
        }
    }
}

/// Thresholds applied when judging whether an answer is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRules {
    /// Minimum trimmed character count for generation answers.
    pub min_text_length: usize,
}

impl Default for AnswerRules {
    fn default() -> Self {
        Self {
            min_text_length: DEFAULT_MIN_TEXT_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Item index {index} out of range for dataset of {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Expected a {expected} answer, got {actual}")]
    WrongType { expected: TaskType, actual: TaskType },

    #[error("Choice {0:?} is not one of the item's options")]
    UnknownChoice(String),

    #[error("Ranking refers to choice {index}, item has {len} choices")]
    RankOutOfRange { index: usize, len: usize },

    #[error("Ranking lists choice {0} more than once")]
    DuplicateRank(usize),
}

/// Check an edit before it is buffered.
///
/// Partial rankings pass; completeness is judged by [`is_valid_answer`].
pub fn check_answer(
    task_type: TaskType,
    item: &Item,
    answer: &Answer,
) -> Result<(), ValidationError> {
    if answer.task_type() != task_type {
        return Err(ValidationError::WrongType {
            expected: task_type,
            actual: answer.task_type(),
        });
    }
    match answer {
        Answer::Classification(choice) => {
            if !choice.is_empty() && !item.choices.iter().any(|c| c == choice) {
                return Err(ValidationError::UnknownChoice(choice.clone()));
            }
        }
        Answer::Generation(_) => {}
        Answer::Ranking(order) => check_order(order, item.choices.len())?,
    }
    Ok(())
}

fn check_order(order: &[usize], len: usize) -> Result<(), ValidationError> {
    let mut seen = vec![false; len];
    for &index in order {
        if index >= len {
            return Err(ValidationError::RankOutOfRange { index, len });
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(ValidationError::DuplicateRank(index));
        }
    }
    Ok(())
}

/// Whether a stored slot counts as a finished answer for `item`.
pub fn is_valid_answer(
    task_type: TaskType,
    item: &Item,
    answer: Option<&Answer>,
    rules: &AnswerRules,
) -> bool {
    let Some(answer) = answer else {
        return false;
    };
    if answer.task_type() != task_type {
        return false;
    }
    match answer {
        Answer::Classification(choice) => item.choices.iter().any(|c| c == choice),
        Answer::Generation(text) => text.trim().chars().count() >= rules.min_text_length,
        Answer::Ranking(order) => {
            !order.is_empty()
                && order.len() == item.choices.len()
                && check_order(order, item.choices.len()).is_ok()
        }
    }
}
