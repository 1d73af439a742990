//! Stored task documents and the answer encoding used inside them.
//!
//! Answers are kept as strings, one per item, with `""` for an unanswered
//! slot. Rankings are comma-joined choice indices (`"2,0,1"`). Documents
//! written by older clients may hold other shapes, so decoding never fails:
//! anything unreadable becomes an unanswered slot.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::answer::{Answer, Item, TaskType};
use super::task::{AnswerSequence, Task};

/// A task as it is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub dataset: Vec<Item>,
    /// Annotator id to encoded answer array.
    #[serde(default)]
    pub answers: Map<String, Value>,
    /// Annotator id to completion flag.
    #[serde(default)]
    pub completed: Map<String, Value>,
    pub end_date: DateTime<Utc>,
    #[serde(default)]
    pub end_early: bool,
    #[serde(default)]
    pub total_annotators: u32,
    #[serde(default)]
    pub total_credits: u64,
    /// Milliseconds since the epoch of the last answer write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

impl TaskDocument {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            creator_id: task.creator_id.clone(),
            task_type: task.task_type,
            dataset: task.items.clone(),
            answers: task
                .responses_by_user
                .iter()
                .map(|(user, answers)| (user.to_string(), encode_answers(answers)))
                .collect(),
            completed: task
                .completed_by_user
                .iter()
                .map(|(user, done)| (user.to_string(), Value::Bool(*done)))
                .collect(),
            end_date: task.end_date,
            end_early: task.ended_early,
            total_annotators: task.total_annotators_target,
            total_credits: task.total_credits,
            last_updated: None,
        }
    }

    /// Decode into a [`Task`]. Malformed answer data decodes to empty slots.
    pub fn into_task(self, id: impl Into<String>) -> Task {
        let id = id.into();
        let task_type = self.task_type;

        let mut responses_by_user = IndexMap::new();
        for (user, value) in self.answers {
            let answers = decode_answers(task_type, &value);
            if answers.is_empty() && !value.is_array() {
                tracing::warn!(task_id = %id, user = %user, "Ignoring non-array answer entry");
            }
            responses_by_user.insert(user, answers);
        }

        let completed_by_user = self
            .completed
            .into_iter()
            .map(|(user, value)| (user, value.as_bool().unwrap_or(false)))
            .collect();

        Task {
            id,
            title: self.title,
            description: self.description,
            creator_id: self.creator_id,
            task_type,
            items: self.dataset,
            total_annotators_target: self.total_annotators,
            total_credits: self.total_credits,
            end_date: self.end_date,
            ended_early: self.end_early,
            responses_by_user,
            completed_by_user,
        }
    }

    /// Replace one annotator's answers, leaving every other key untouched.
    pub fn set_user_answers(&mut self, user_id: &str, answers: &[Option<Answer>]) {
        self.answers
            .insert(user_id.to_string(), encode_answers(answers));
        self.last_updated = Some(Utc::now().timestamp_millis());
    }

    pub fn set_user_completion(&mut self, user_id: &str, completed: bool) {
        self.completed
            .insert(user_id.to_string(), Value::Bool(completed));
    }
}

pub fn encode_answer(answer: Option<&Answer>) -> String {
    match answer {
        None => String::new(),
        Some(Answer::Classification(s)) | Some(Answer::Generation(s)) => s.clone(),
        Some(Answer::Ranking(order)) => order
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    }
}

pub fn encode_answers(answers: &[Option<Answer>]) -> Value {
    Value::Array(
        answers
            .iter()
            .map(|a| Value::String(encode_answer(a.as_ref())))
            .collect(),
    )
}

/// Decode one stored slot.
pub fn decode_answer(task_type: TaskType, value: &Value) -> Option<Answer> {
    match (task_type, value) {
        (_, Value::String(s)) if s.is_empty() => None,
        (TaskType::Classification, Value::String(s)) => Some(Answer::Classification(s.clone())),
        (TaskType::Generation, Value::String(s)) => Some(Answer::Generation(s.clone())),
        (TaskType::Ranking, Value::String(s)) => {
            let order: Vec<usize> = s
                .split(',')
                .filter_map(|part| part.trim().parse().ok())
                .collect();
            (!order.is_empty()).then_some(Answer::Ranking(order))
        }
        (TaskType::Ranking, Value::Array(values)) => {
            let order: Vec<usize> = values
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|n| usize::try_from(n).ok())
                .collect();
            (!order.is_empty()).then_some(Answer::Ranking(order))
        }
        _ => None,
    }
}

/// Decode a stored answer array. Anything but an array yields no answers.
pub fn decode_answers(task_type: TaskType, value: &Value) -> AnswerSequence {
    match value {
        Value::Array(values) => values
            .iter()
            .map(|v| decode_answer(task_type, v))
            .collect(),
        _ => Vec::new(),
    }
}
