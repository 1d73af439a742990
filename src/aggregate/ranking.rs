//! Rank-sum (Borda-style) aggregation of ranking answers.
//!
//! A choice listed at position `p` (0-based) of an annotator's order gets
//! rank `p + 1`. Ranks are summed per choice; lower totals are preferred.
//! Partial orders contribute ranks for the choices they list. Orders that
//! name a choice twice or a choice the item does not have are skipped whole.

use serde::{Deserialize, Serialize};

use super::round_to;
use crate::model::{check_answer, Answer, Task, TaskType};

/// Aggregated rank for one choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedChoice {
    pub choice_index: usize,
    pub choice_text: String,
    pub total_rank: u64,
    /// `total_rank / vote_count`, to two decimals.
    pub avg_rank: f64,
    pub vote_count: usize,
}

/// Spread of per-choice average ranks across the whole task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankSummary {
    pub best_avg_rank: f64,
    pub worst_avg_rank: f64,
    pub overall_avg_rank: f64,
    /// Number of (annotator, item) orders that were counted.
    pub total_rankings: usize,
}

#[derive(Default)]
struct RankTally {
    totals: Vec<u64>,
    votes: Vec<usize>,
    rankings: usize,
}

impl RankTally {
    fn add_item(&mut self, task: &Task, item_index: usize) {
        let Some(item) = task.items.get(item_index) else {
            return;
        };
        for (user_id, answers) in task.responses_by_user.iter() {
            let Some(answer) = answers.get(item_index).and_then(Option::as_ref) else {
                continue;
            };
            let Answer::Ranking(order) = answer else {
                continue;
            };
            if order.is_empty() {
                continue;
            }
            if check_answer(TaskType::Ranking, item, answer).is_err() {
                tracing::debug!(user = %user_id, item_index, "Skipping malformed ranking");
                continue;
            }

            self.rankings += 1;
            for (position, &choice) in order.iter().enumerate() {
                if choice >= self.totals.len() {
                    self.totals.resize(choice + 1, 0);
                    self.votes.resize(choice + 1, 0);
                }
                self.totals[choice] += position as u64 + 1;
                self.votes[choice] += 1;
            }
        }
    }

    fn into_choices(self, choice_text: impl Fn(usize) -> String) -> Vec<RankedChoice> {
        let mut choices: Vec<RankedChoice> = self
            .totals
            .iter()
            .zip(&self.votes)
            .enumerate()
            .filter(|(_, (_, votes))| **votes > 0)
            .map(|(choice_index, (&total_rank, &vote_count))| RankedChoice {
                choice_index,
                choice_text: choice_text(choice_index),
                total_rank,
                avg_rank: round_to(total_rank as f64 / vote_count as f64, 2),
                vote_count,
            })
            .collect();
        choices.sort_by(|a, b| {
            a.total_rank
                .cmp(&b.total_rank)
                .then(a.choice_index.cmp(&b.choice_index))
        });
        choices
    }
}

/// Consensus order of one item's choices, most preferred first.
///
/// Ties on total rank go to the lower choice index. Choices nobody ranked
/// are omitted.
pub fn rank_aggregate(task: &Task, item_index: usize) -> Vec<RankedChoice> {
    rank_item(task, item_index).0
}

/// [`rank_aggregate`] plus the number of annotators whose order was counted.
pub(crate) fn rank_item(task: &Task, item_index: usize) -> (Vec<RankedChoice>, usize) {
    let mut tally = RankTally::default();
    tally.add_item(task, item_index);
    let rankings = tally.rankings;
    let choices = task
        .items
        .get(item_index)
        .map(|item| item.choices.as_slice())
        .unwrap_or_default();
    let ranked = tally.into_choices(|index| choices.get(index).cloned().unwrap_or_default());
    (ranked, rankings)
}

/// Ranks summed per choice index across every item.
///
/// Choice text is taken from the first item that has a choice at that index.
pub fn global_rank_aggregate(task: &Task) -> Vec<RankedChoice> {
    let mut tally = RankTally::default();
    for index in 0..task.dataset_len() {
        tally.add_item(task, index);
    }
    tally.into_choices(|index| {
        task.items
            .iter()
            .find_map(|item| item.choices.get(index).cloned())
            .unwrap_or_default()
    })
}

pub fn rank_summary(task: &Task) -> RankSummary {
    let mut tally = RankTally::default();
    for index in 0..task.dataset_len() {
        tally.add_item(task, index);
    }
    let total_rankings = tally.rankings;
    let averages: Vec<f64> = tally
        .into_choices(|_| String::new())
        .iter()
        .map(|choice| choice.avg_rank)
        .collect();
    if averages.is_empty() {
        return RankSummary::default();
    }

    RankSummary {
        best_avg_rank: averages.iter().copied().fold(f64::INFINITY, f64::min),
        worst_avg_rank: averages.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        overall_avg_rank: round_to(averages.iter().sum::<f64>() / averages.len() as f64, 2),
        total_rankings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, NewTask};
    use chrono::{Duration, Utc};

    fn task(items: Vec<Item>, responses: &[(&str, Vec<Option<Answer>>)]) -> Task {
        let mut task = NewTask {
            title: "Relevance".into(),
            description: String::new(),
            creator_id: "creator".into(),
            task_type: TaskType::Ranking,
            items,
            total_annotators_target: 3,
            total_credits: 0,
            end_date: Utc::now() + Duration::days(1),
        }
        .into_task("t".into());
        for (user, answers) in responses {
            task.responses_by_user.insert(user.to_string(), answers.clone());
        }
        task
    }

    fn order(indices: &[usize]) -> Option<Answer> {
        Some(Answer::Ranking(indices.to_vec()))
    }

    fn abc() -> Item {
        Item::new("query", &["a", "b", "c"])
    }

    #[test]
    fn two_annotators_rank_three_choices() {
        let task = task(
            vec![abc()],
            &[("u1", vec![order(&[0, 1, 2])]), ("u2", vec![order(&[1, 0, 2])])],
        );
        let ranked = rank_aggregate(&task, 0);
        let summary: Vec<_> = ranked
            .iter()
            .map(|c| (c.choice_index, c.total_rank, c.avg_rank, c.vote_count))
            .collect();
        assert_eq!(summary, vec![(0, 3, 1.5, 2), (1, 3, 1.5, 2), (2, 6, 3.0, 2)]);
        assert_eq!(ranked[2].choice_text, "c");
    }

    #[test]
    fn partial_orders_count_listed_choices_only() {
        let task = task(
            vec![abc()],
            &[("u1", vec![order(&[2])]), ("u2", vec![order(&[2, 0, 1])])],
        );
        let ranked = rank_aggregate(&task, 0);
        let ranks: Vec<_> = ranked
            .iter()
            .map(|c| (c.choice_index, c.total_rank, c.vote_count))
            .collect();
        assert_eq!(ranks, vec![(0, 2, 1), (2, 2, 2), (1, 3, 1)]);
    }

    #[test]
    fn disjoint_partial_orders_count_every_ranker() {
        let task = task(
            vec![abc()],
            &[("u1", vec![order(&[2])]), ("u2", vec![order(&[0])]), ("u3", vec![None])],
        );
        let (ranked, rankers) = rank_item(&task, 0);
        assert_eq!(rankers, 2);
        assert!(ranked.iter().all(|choice| choice.vote_count == 1));
    }

    #[test]
    fn malformed_orders_are_no_votes() {
        let task = task(
            vec![abc()],
            &[
                ("u1", vec![order(&[0, 0, 1])]),
                ("u2", vec![order(&[5, 1])]),
                ("u3", vec![Some(Answer::Classification("a".into()))]),
                ("u4", vec![]),
            ],
        );
        assert!(rank_aggregate(&task, 0).is_empty());
        assert_eq!(rank_summary(&task), RankSummary::default());
    }

    #[test]
    fn summary_spans_all_items() {
        let task = task(
            vec![abc(), abc()],
            &[
                ("u1", vec![order(&[0, 1, 2]), order(&[0, 2, 1])]),
                ("u2", vec![order(&[0, 1, 2]), None]),
            ],
        );
        let global = global_rank_aggregate(&task);
        assert_eq!(global[0].choice_index, 0);
        assert_eq!(global[0].total_rank, 3);
        assert_eq!(global[0].choice_text, "a");

        let summary = rank_summary(&task);
        assert_eq!(summary.total_rankings, 3);
        assert_eq!(summary.best_avg_rank, 1.0);
        // b: 2 + 2 + 3 = 7 over 3, c: 3 + 3 + 2 = 8 over 3
        assert_eq!(summary.worst_avg_rank, 2.67);
        assert_eq!(summary.overall_avg_rank, round_to((1.0 + 2.33 + 2.67) / 3.0, 2));
    }
}
