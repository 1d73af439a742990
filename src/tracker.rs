//! Response tracker - one annotator working through one task.
//!
//! A tracker owns the annotator's position in the dataset and an in-memory
//! copy of their answers that runs ahead of the stored copy. Edits are
//! buffered and auto-saved after a period of inactivity; navigation and
//! completion save first and refuse to proceed if the save fails, so an
//! unsaved answer is never silently dropped.
//!
//! Saves from one tracker are serialized: a debounced save that fires while
//! an explicit save is in flight waits for it rather than racing it. Two
//! trackers for the same annotator (two open sessions) are not coordinated;
//! the later write wins.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::generation::{response_stats, ResponseStats};
use crate::config::TrackerConfig;
use crate::model::{
    check_answer, is_valid_answer, Answer, AnswerSequence, Item, TaskType, ValidationError,
};
use crate::store::{StoreError, TaskStore};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Task {0} not found")]
    NotFound(String),

    #[error("Invalid answer: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to save answers: {0}")]
    Persistence(#[source] StoreError),

    #[error("Item {} has no valid answer", .index + 1)]
    Incomplete { index: usize },

    #[error("Task {0} no longer accepts responses")]
    Closed(String),
}

impl TrackerError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Answers not yet confirmed by the store.
#[derive(Debug)]
struct Buffer {
    answers: AnswerSequence,
    dirty: bool,
    /// Bumped on every edit so a save only clears `dirty` for what it wrote.
    revision: u64,
}

/// State reachable from the debounce task.
struct Shared {
    store: Arc<dyn TaskStore>,
    task_id: String,
    user_id: String,
    buffer: Mutex<Buffer>,
    write_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn buffer(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().expect("tracker buffer lock poisoned")
    }

    async fn persist(&self) -> Result<(), TrackerError> {
        let _write = self.write_lock.lock().await;
        let (answers, revision) = {
            let buffer = self.buffer();
            (buffer.answers.clone(), buffer.revision)
        };

        self.store
            .write_user_answers(&self.task_id, &self.user_id, &answers)
            .await
            .map_err(TrackerError::Persistence)?;

        let mut buffer = self.buffer();
        if buffer.revision == revision {
            buffer.dirty = false;
        }
        debug!(
            task_id = %self.task_id,
            user = %self.user_id,
            revision,
            "Answers saved"
        );
        Ok(())
    }
}

/// Tracks one annotator's progress through one task.
///
/// Only obtainable through [`ResponseTracker::initialize`], so no edit can be
/// accepted before the stored answers are loaded.
pub struct ResponseTracker {
    shared: Arc<Shared>,
    task_type: TaskType,
    items: Vec<Item>,
    config: TrackerConfig,
    accepts_responses: bool,
    completed: bool,
    /// 1-based position in the dataset.
    current_index: usize,
    pending_save: Option<CancellationToken>,
}

impl ResponseTracker {
    /// Load `user_id`'s answers for `task_id` and position the tracker on
    /// the first item without a valid answer (or the last item if every
    /// answer is valid).
    pub async fn initialize(
        store: Arc<dyn TaskStore>,
        task_id: &str,
        user_id: &str,
        config: TrackerConfig,
    ) -> Result<Self, TrackerError> {
        let task = store
            .read_task(task_id)
            .await
            .map_err(TrackerError::Persistence)?
            .ok_or_else(|| TrackerError::NotFound(task_id.to_string()))?;

        let len = task.dataset_len();
        let mut answers = task.answers_for(user_id).cloned().unwrap_or_default();
        if answers.len() > len {
            warn!(
                task_id,
                user = user_id,
                stored = answers.len(),
                len,
                "Dropping answers beyond the end of the dataset"
            );
        }
        answers.resize(len, None);

        let first_invalid = answers.iter().zip(&task.items).position(|(answer, item)| {
            !is_valid_answer(task.task_type, item, answer.as_ref(), &config.rules)
        });
        let current_index = match first_invalid {
            Some(index) => index + 1,
            None => len.max(1),
        };

        info!(
            task_id,
            user = user_id,
            task_type = %task.task_type,
            current_index,
            "Response tracker initialized"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                store,
                task_id: task_id.to_string(),
                user_id: user_id.to_string(),
                buffer: Mutex::new(Buffer {
                    answers,
                    dirty: false,
                    revision: 0,
                }),
                write_lock: tokio::sync::Mutex::new(()),
            }),
            task_type: task.task_type,
            accepts_responses: task.accepts_responses(Utc::now()),
            completed: task.is_completed_by(user_id),
            items: task.items,
            config,
            current_index,
            pending_save: None,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.shared.task_id
    }

    pub fn user_id(&self) -> &str {
        &self.shared.user_id
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn dataset_len(&self) -> usize {
        self.items.len()
    }

    /// 1-based position of the item being worked on.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.items.get(self.current_index - 1)
    }

    pub fn current_answer(&self) -> Option<Answer> {
        self.answer(self.current_index - 1)
    }

    pub fn answer(&self, index: usize) -> Option<Answer> {
        self.shared.buffer().answers.get(index).cloned().flatten()
    }

    /// Snapshot of the buffered answers, one slot per item.
    pub fn answers(&self) -> AnswerSequence {
        self.shared.buffer().answers.clone()
    }

    /// Whether there are edits the store has not confirmed.
    pub fn is_dirty(&self) -> bool {
        self.shared.buffer().dirty
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn accepts_responses(&self) -> bool {
        self.accepts_responses
    }

    /// Buffer an answer for item `index` (0-based) and schedule an auto-save.
    ///
    /// `None` or a blank answer clears the slot. Invalid edits are rejected
    /// and leave the buffer unchanged.
    pub fn set_answer(&mut self, index: usize, value: Option<Answer>) -> Result<(), TrackerError> {
        if !self.accepts_responses {
            return Err(TrackerError::Closed(self.shared.task_id.clone()));
        }
        let item = self.items.get(index).ok_or(ValidationError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })?;
        if let Some(answer) = &value {
            check_answer(self.task_type, item, answer)?;
        }
        let value = value.filter(|answer| !answer.is_blank());

        {
            let mut buffer = self.shared.buffer();
            buffer.answers[index] = value;
            buffer.dirty = true;
            buffer.revision += 1;
        }
        self.schedule_save();
        Ok(())
    }

    /// Whether item `index` (0-based) holds any answer at all.
    ///
    /// An unanswered item and an answered-but-invalid one both fail
    /// [`is_valid`](Self::is_valid); only the latter warrants a validation
    /// message.
    pub fn is_answered(&self, index: usize) -> bool {
        matches!(self.shared.buffer().answers.get(index), Some(Some(_)))
    }

    /// Whether item `index` (0-based) holds a complete, valid answer.
    pub fn is_valid(&self, index: usize) -> bool {
        let Some(item) = self.items.get(index) else {
            return false;
        };
        let buffer = self.shared.buffer();
        is_valid_answer(
            self.task_type,
            item,
            buffer.answers.get(index).and_then(Option::as_ref),
            &self.config.rules,
        )
    }

    pub fn first_invalid_index(&self) -> Option<usize> {
        (0..self.items.len()).find(|&index| !self.is_valid(index))
    }

    pub fn valid_answer_count(&self) -> usize {
        (0..self.items.len())
            .filter(|&index| self.is_valid(index))
            .count()
    }

    pub fn all_valid(&self) -> bool {
        self.first_invalid_index().is_none()
    }

    /// Word and character statistics over this annotator's valid generation answers.
    pub fn response_stats(&self) -> ResponseStats {
        response_stats(&self.shared.buffer().answers, &self.config.rules)
    }

    /// Write the buffered answers now, cancelling any pending auto-save.
    ///
    /// On failure nothing is discarded and the tracker stays dirty.
    pub async fn persist(&mut self) -> Result<(), TrackerError> {
        self.cancel_pending_save();
        self.shared.persist().await
    }

    pub async fn go_to_next(&mut self) -> Result<(), TrackerError> {
        self.go_to(self.current_index + 1).await
    }

    pub async fn go_to_previous(&mut self) -> Result<(), TrackerError> {
        self.go_to(self.current_index.saturating_sub(1)).await
    }

    /// Save, then move to the 1-based `position`, clamped to the dataset.
    /// If the save fails the position does not change.
    pub async fn go_to(&mut self, position: usize) -> Result<(), TrackerError> {
        if self.accepts_responses {
            self.persist().await?;
        }
        self.current_index = position.clamp(1, self.items.len().max(1));
        Ok(())
    }

    /// Save the answers and record this annotator as finished.
    ///
    /// Refuses with [`TrackerError::Incomplete`] while any item lacks a
    /// valid answer; the completion flag is then left untouched.
    pub async fn mark_complete(&mut self) -> Result<(), TrackerError> {
        if !self.accepts_responses {
            return Err(TrackerError::Closed(self.shared.task_id.clone()));
        }
        if let Some(index) = self.first_invalid_index() {
            return Err(TrackerError::Incomplete { index });
        }
        self.persist().await?;
        self.shared
            .store
            .write_user_completion(&self.shared.task_id, &self.shared.user_id, true)
            .await
            .map_err(TrackerError::Persistence)?;
        self.completed = true;
        info!(
            task_id = %self.shared.task_id,
            user = %self.shared.user_id,
            "Annotator marked complete"
        );
        Ok(())
    }

    /// Cancel any pending auto-save and make one best-effort save of unsaved
    /// edits. A failure is logged, not returned.
    pub async fn close(mut self) {
        self.cancel_pending_save();
        if !self.is_dirty() {
            return;
        }
        if let Err(e) = self.shared.persist().await {
            warn!(
                task_id = %self.shared.task_id,
                user = %self.shared.user_id,
                "Unsaved answers lost on close: {}",
                e
            );
        }
    }

    fn cancel_pending_save(&mut self) {
        if let Some(token) = self.pending_save.take() {
            token.cancel();
        }
    }

    fn schedule_save(&mut self) {
        self.cancel_pending_save();
        let delay = self.config.save_delay(self.task_type);
        if delay.is_zero() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, auto-save disabled");
            return;
        };

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let shared = Arc::clone(&self.shared);
        runtime.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Err(e) = shared.persist().await {
                        warn!(
                            task_id = %shared.task_id,
                            user = %shared.user_id,
                            "Auto-save failed: {}",
                            e
                        );
                    }
                }
            }
        });
        debug!(delay_ms = delay.as_millis() as u64, "Auto-save scheduled");
        self.pending_save = Some(token);
    }
}

impl Drop for ResponseTracker {
    fn drop(&mut self) {
        self.cancel_pending_save();
    }
}
