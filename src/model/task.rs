//! Annotation task documents in their decoded form.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use super::answer::{is_valid_answer, Answer, AnswerRules, Item, TaskType};

/// One annotator's answers, indexed by item. `None` marks an unanswered slot.
pub type AnswerSequence = Vec<Option<Answer>>;

/// An annotation project instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub creator_id: String,
    pub task_type: TaskType,
    pub items: Vec<Item>,
    /// Used for progress display only, never enforced as a cap.
    pub total_annotators_target: u32,
    pub total_credits: u64,
    pub end_date: DateTime<Utc>,
    pub ended_early: bool,
    /// Keyed by annotator id, in document order.
    pub responses_by_user: IndexMap<String, AnswerSequence>,
    pub completed_by_user: IndexMap<String, bool>,
}

/// Fields supplied when a task is created. Response maps start empty.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub creator_id: String,
    pub task_type: TaskType,
    pub items: Vec<Item>,
    pub total_annotators_target: u32,
    pub total_credits: u64,
    pub end_date: DateTime<Utc>,
}

impl NewTask {
    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            creator_id: self.creator_id,
            task_type: self.task_type,
            items: self.items,
            total_annotators_target: self.total_annotators_target,
            total_credits: self.total_credits,
            end_date: self.end_date,
            ended_early: false,
            responses_by_user: IndexMap::new(),
            completed_by_user: IndexMap::new(),
        }
    }
}

impl Task {
    pub fn dataset_len(&self) -> usize {
        self.items.len()
    }

    /// Whether the task still takes edits at `now`.
    pub fn accepts_responses(&self, now: DateTime<Utc>) -> bool {
        !self.ended_early && now < self.end_date
    }

    pub fn answers_for(&self, user_id: &str) -> Option<&AnswerSequence> {
        self.responses_by_user.get(user_id)
    }

    pub fn is_completed_by(&self, user_id: &str) -> bool {
        self.completed_by_user.get(user_id).copied().unwrap_or(false)
    }

    /// The answer `user_id` gave for item `index`, if any.
    pub fn answer_at(&self, user_id: &str, index: usize) -> Option<&Answer> {
        self.answers_for(user_id)
            .and_then(|answers| answers.get(index))
            .and_then(Option::as_ref)
    }

    pub fn is_answer_valid(&self, index: usize, answer: Option<&Answer>, rules: &AnswerRules) -> bool {
        match self.items.get(index) {
            Some(item) => is_valid_answer(self.task_type, item, answer, rules),
            None => false,
        }
    }

    /// Annotators who have at least one non-blank answer.
    pub fn active_annotators(&self) -> usize {
        self.responses_by_user
            .values()
            .filter(|answers| answers.iter().flatten().any(|a| !a.is_blank()))
            .count()
    }

    pub fn completed_annotators(&self) -> usize {
        self.completed_by_user.values().filter(|done| **done).count()
    }

    /// Active annotators as a percentage of the target, 0 when no target is set.
    pub fn annotator_progress_percent(&self) -> f64 {
        if self.total_annotators_target == 0 {
            return 0.0;
        }
        self.active_annotators() as f64 / f64::from(self.total_annotators_target) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn task() -> Task {
        NewTask {
            title: "Sentiment".into(),
            description: "Label reviews".into(),
            creator_id: "creator".into(),
            task_type: TaskType::Classification,
            items: vec![Item::new("good", &["Positive", "Negative"])],
            total_annotators_target: 4,
            total_credits: 100,
            end_date: Utc::now() + Duration::days(7),
        }
        .into_task("t1".into())
    }

    #[test]
    fn acceptance_window_respects_end_date_and_early_end() {
        let mut task = task();
        let now = Utc::now();
        assert!(task.accepts_responses(now));
        assert!(!task.accepts_responses(task.end_date + Duration::seconds(1)));
        task.ended_early = true;
        assert!(!task.accepts_responses(now));
    }

    #[test]
    fn progress_counts_only_annotators_with_answers() {
        let mut task = task();
        task.responses_by_user
            .insert("u1".into(), vec![Some(Answer::Classification("Positive".into()))]);
        task.responses_by_user.insert("u2".into(), vec![None]);
        task.completed_by_user.insert("u1".into(), true);
        assert_eq!(task.active_annotators(), 1);
        assert_eq!(task.completed_annotators(), 1);
        assert!((task.annotator_progress_percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_target_reports_zero_progress() {
        let mut task = task();
        task.total_annotators_target = 0;
        assert_eq!(task.annotator_progress_percent(), 0.0);
    }
}
