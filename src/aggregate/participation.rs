//! Annotator participation statistics.

use serde::{Deserialize, Serialize};

use super::round_to;
use crate::model::{AnswerRules, Task};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationStats {
    /// Annotators with at least one non-blank answer.
    pub active_annotators: usize,
    pub completed_annotators: usize,
    /// Mean non-blank answers per annotator with an answer entry, to two decimals.
    pub avg_responses_per_user: f64,
    /// Mean share of items validly answered per annotator with an answer
    /// entry, to one decimal. An entry with no answers counts as 0%.
    pub avg_completion_rate_percent: f64,
    /// Active annotators against the task's target, to one decimal.
    pub annotator_progress_percent: f64,
}

pub fn participation_stats(task: &Task, rules: &AnswerRules) -> ParticipationStats {
    let len = task.dataset_len();
    let users = task.responses_by_user.len();
    let mut responses = 0usize;
    let mut completion_sum = 0.0;

    for answers in task.responses_by_user.values() {
        responses += answers.iter().flatten().filter(|a| !a.is_blank()).count();
        if len > 0 {
            let valid = answers
                .iter()
                .take(len)
                .enumerate()
                .filter(|&(index, answer)| task.is_answer_valid(index, answer.as_ref(), rules))
                .count();
            completion_sum += valid as f64 / len as f64 * 100.0;
        }
    }

    let stats = ParticipationStats {
        active_annotators: task.active_annotators(),
        completed_annotators: task.completed_annotators(),
        annotator_progress_percent: round_to(task.annotator_progress_percent(), 1),
        ..ParticipationStats::default()
    };
    if users == 0 {
        return stats;
    }

    ParticipationStats {
        avg_responses_per_user: round_to(responses as f64 / users as f64, 2),
        avg_completion_rate_percent: round_to(completion_sum / users as f64, 1),
        ..stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Answer, Item, NewTask, TaskType};
    use chrono::{Duration, Utc};

    fn generation_task() -> Task {
        NewTask {
            title: "Summaries".into(),
            description: String::new(),
            creator_id: "creator".into(),
            task_type: TaskType::Generation,
            items: (0..4).map(|i| Item::new(format!("doc {}", i), &[])).collect(),
            total_annotators_target: 3,
            total_credits: 0,
            end_date: Utc::now() + Duration::days(1),
        }
        .into_task("t".into())
    }

    fn text(s: &str) -> Option<Answer> {
        Some(Answer::Generation(s.to_string()))
    }

    #[test]
    fn averages_over_every_answer_entry() {
        let mut task = generation_task();
        task.responses_by_user.insert(
            "u1".into(),
            vec![text("long answer"), text("another"), text("ok"), text("fine text")],
        );
        task.responses_by_user
            .insert("u2".into(), vec![text("something"), None, None, None]);
        task.responses_by_user.insert("u3".into(), vec![None, None]);
        task.completed_by_user.insert("u1".into(), true);

        let stats = participation_stats(&task, &AnswerRules::default());
        assert_eq!(stats.active_annotators, 2);
        assert_eq!(stats.completed_annotators, 1);
        assert_eq!(stats.avg_responses_per_user, 1.67);
        // u1: 3 of 4 valid ("ok" is too short), u2: 1 of 4, u3: none
        assert_eq!(stats.avg_completion_rate_percent, 33.3);
        assert_eq!(stats.annotator_progress_percent, 66.7);
    }

    #[test]
    fn empty_entries_count_as_zero_completion() {
        let mut task = generation_task();
        task.responses_by_user.insert(
            "u1".into(),
            vec![text("first"), text("second"), text("third"), text("fourth")],
        );
        task.responses_by_user
            .insert("u2".into(), vec![None, None, None, None]);

        let stats = participation_stats(&task, &AnswerRules::default());
        assert_eq!(stats.active_annotators, 1);
        assert_eq!(stats.avg_completion_rate_percent, 50.0);
        assert_eq!(stats.avg_responses_per_user, 2.0);
    }

    #[test]
    fn no_answers_yields_zeroes() {
        let stats = participation_stats(&generation_task(), &AnswerRules::default());
        assert_eq!(stats, ParticipationStats::default());
    }
}
