//! In-memory task store (non-persistent).

use super::{StoreError, TaskStore};
use crate::model::{Answer, NewTask, Task};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Seed the store with a fully formed task, replacing any with the same id.
    pub async fn insert_task(&self, task: Task) {
        self.tasks.write().await.insert(task.id.clone(), task);
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let task = task.into_task(Uuid::new_v4().to_string());
        self.tasks
            .write()
            .await
            .insert(task.id.clone(), task.clone());
        Ok(task)
    }

    async fn read_task(&self, task_id: &str) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(task_id).cloned())
    }

    async fn write_user_answers(
        &self,
        task_id: &str,
        user_id: &str,
        answers: &[Option<Answer>],
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        task.responses_by_user.insert(user_id.to_string(), answers.to_vec());
        Ok(())
    }

    async fn write_user_completion(
        &self,
        task_id: &str,
        user_id: &str,
        completed: bool,
    ) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        task.completed_by_user.insert(user_id.to_string(), completed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, TaskType};
    use chrono::{Duration, Utc};

    fn new_task() -> NewTask {
        NewTask {
            title: "Sentiment".into(),
            description: "Label reviews".into(),
            creator_id: "creator".into(),
            task_type: TaskType::Classification,
            items: vec![Item::new("good", &["Positive", "Negative"])],
            total_annotators_target: 2,
            total_credits: 10,
            end_date: Utc::now() + Duration::days(1),
        }
    }

    #[tokio::test]
    async fn answer_writes_are_scoped_to_one_user() {
        let store = InMemoryTaskStore::new();
        let task = store.create_task(new_task()).await.expect("create task");

        let positive = vec![Some(Answer::Classification("Positive".into()))];
        let negative = vec![Some(Answer::Classification("Negative".into()))];
        store
            .write_user_answers(&task.id, "alice", &positive)
            .await
            .expect("write alice");
        store
            .write_user_answers(&task.id, "bob", &negative)
            .await
            .expect("write bob");
        store
            .write_user_answers(&task.id, "alice", &[None])
            .await
            .expect("rewrite alice");

        let task = store
            .read_task(&task.id)
            .await
            .expect("read task")
            .expect("task exists");
        assert_eq!(task.answers_for("alice"), Some(&vec![None]));
        assert_eq!(task.answers_for("bob"), Some(&negative));
        assert_eq!(
            task.responses_by_user.keys().collect::<Vec<_>>(),
            vec!["alice", "bob"]
        );
    }

    #[tokio::test]
    async fn writes_to_missing_task_fail() {
        let store = InMemoryTaskStore::new();
        let err = store
            .write_user_completion("missing", "alice", true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
        assert!(store.read_task("missing").await.expect("read").is_none());
    }
}
