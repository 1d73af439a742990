//! Task document storage.
//!
//! The tracker only ever reads a whole task and writes back one annotator's
//! slice of it. Every write is scoped to a single annotator key so that
//! concurrent annotators never overwrite each other.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Answer, NewTask, Task};

pub use file::JsonFileTaskStore;
pub use memory::InMemoryTaskStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task {0} not found")]
    NotFound(String),

    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether writes survive a restart.
    fn is_persistent(&self) -> bool;

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError>;

    /// Load a task, or `None` if it does not exist.
    async fn read_task(&self, task_id: &str) -> Result<Option<Task>, StoreError>;

    /// Replace `responses_by_user[user_id]` and nothing else.
    async fn write_user_answers(
        &self,
        task_id: &str,
        user_id: &str,
        answers: &[Option<Answer>],
    ) -> Result<(), StoreError>;

    /// Replace `completed_by_user[user_id]` and nothing else.
    async fn write_user_completion(
        &self,
        task_id: &str,
        user_id: &str,
        completed: bool,
    ) -> Result<(), StoreError>;
}
