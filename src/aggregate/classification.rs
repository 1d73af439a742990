//! Majority vote and frequency distribution over text answers.
//!
//! Used for classification tasks, and for generation tasks where identical
//! responses are grouped.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::round_to;
use crate::model::Task;

/// Vote counts for one item (or for the whole task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    /// Answer to vote count, in order of first appearance.
    pub counts: IndexMap<String, usize>,
    pub total: usize,
    /// Highest count; ties go to the answer seen first.
    pub majority: Option<String>,
}

impl Distribution {
    fn from_votes<'a>(votes: impl IntoIterator<Item = &'a str>) -> Self {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        let mut total = 0;
        for vote in votes {
            match counts.get_mut(vote) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(vote.to_string(), 1);
                }
            }
            total += 1;
        }

        let mut majority: Option<(&str, usize)> = None;
        for (answer, &count) in &counts {
            if majority.map_or(true, |(_, best)| count > best) {
                majority = Some((answer.as_str(), count));
            }
        }
        let majority = majority.map(|(answer, _)| answer.to_string());

        Self {
            counts,
            total,
            majority,
        }
    }

    /// Share of votes for `answer`, in percent to one decimal.
    pub fn percent(&self, answer: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let count = self.counts.get(answer).copied().unwrap_or(0);
        round_to(count as f64 / self.total as f64 * 100.0, 1)
    }

    /// Share of votes for the majority answer, if there is one.
    pub fn majority_percent(&self) -> Option<f64> {
        self.majority.as_deref().map(|answer| self.percent(answer))
    }
}

fn text_votes(task: &Task, item_index: usize) -> impl Iterator<Item = &str> {
    task.responses_by_user.values().filter_map(move |answers| {
        answers
            .get(item_index)
            .and_then(Option::as_ref)
            .and_then(|answer| answer.as_text())
            .filter(|text| !text.is_empty())
    })
}

pub fn classification_distribution(task: &Task, item_index: usize) -> Distribution {
    Distribution::from_votes(text_votes(task, item_index))
}

/// Votes across every item and every annotator.
pub fn global_classification_distribution(task: &Task) -> Distribution {
    Distribution::from_votes((0..task.dataset_len()).flat_map(|index| text_votes(task, index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Item, NewTask, TaskType};
    use chrono::{Duration, Utc};

    fn task(responses: &[(&str, Vec<Option<Answer>>)]) -> Task {
        let mut task = NewTask {
            title: "Sentiment".into(),
            description: String::new(),
            creator_id: "creator".into(),
            task_type: TaskType::Classification,
            items: vec![
                Item::new("first", &["Positive", "Negative"]),
                Item::new("second", &["Positive", "Negative"]),
            ],
            total_annotators_target: 4,
            total_credits: 0,
            end_date: Utc::now() + Duration::days(1),
        }
        .into_task("t".into());
        for (user, answers) in responses {
            task.responses_by_user.insert(user.to_string(), answers.clone());
        }
        task
    }

    fn vote(s: &str) -> Option<Answer> {
        Some(Answer::Classification(s.to_string()))
    }

    #[test]
    fn tie_goes_to_first_encountered_answer() {
        let task = task(&[
            ("u1", vec![vote("Positive")]),
            ("u2", vec![vote("Negative")]),
            ("u3", vec![vote("Negative")]),
            ("u4", vec![vote("Positive")]),
        ]);
        for _ in 0..10 {
            let dist = classification_distribution(&task, 0);
            assert_eq!(dist.majority.as_deref(), Some("Positive"));
            assert_eq!(dist.counts.get("Positive"), Some(&2));
            assert_eq!(dist.counts.get("Negative"), Some(&2));
            assert_eq!(dist.total, 4);
        }
    }

    #[test]
    fn missing_and_blank_slots_are_not_votes() {
        let task = task(&[
            ("u1", vec![vote("Negative")]),
            ("u2", vec![]),
            ("u3", vec![None, vote("Positive")]),
            ("u4", vec![vote("")]),
        ]);
        let dist = classification_distribution(&task, 0);
        assert_eq!(dist.total, 1);
        assert_eq!(dist.majority.as_deref(), Some("Negative"));
        assert_eq!(dist.majority_percent(), Some(100.0));
    }

    #[test]
    fn empty_item_has_no_majority() {
        let task = task(&[("u1", vec![None, None])]);
        let dist = classification_distribution(&task, 1);
        assert_eq!(dist.total, 0);
        assert_eq!(dist.majority, None);
        assert_eq!(dist.percent("Positive"), 0.0);
        assert_eq!(classification_distribution(&task, 9).total, 0);
    }

    #[test]
    fn global_distribution_flattens_items() {
        let task = task(&[
            ("u1", vec![vote("Negative"), vote("Positive")]),
            ("u2", vec![vote("Positive"), vote("Positive")]),
        ]);
        let dist = global_classification_distribution(&task);
        assert_eq!(dist.total, 4);
        assert_eq!(dist.majority.as_deref(), Some("Positive"));
        assert_eq!(dist.counts.keys().collect::<Vec<_>>(), vec!["Negative", "Positive"]);
        assert_eq!(dist.percent("Positive"), 75.0);
    }
}
