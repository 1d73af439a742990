//! Task store backed by JSON documents on disk.
//!
//! Each task lives at `{root}/{task_id}.json` in the stored document format
//! (see [`TaskDocument`]). Partial writes load the document, replace one
//! annotator's key and write it back, so data this crate does not understand
//! survives untouched.

use super::{StoreError, TaskStore};
use crate::model::{Answer, NewTask, Task, TaskDocument};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug)]
pub struct JsonFileTaskStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileTaskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, task_id: &str) -> Result<PathBuf, StoreError> {
        let valid = !task_id.is_empty()
            && task_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::NotFound(task_id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", task_id)))
    }

    async fn load_document(&self, task_id: &str) -> Result<Option<TaskDocument>, StoreError> {
        let path = self.path_for(task_id)?;
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let doc = serde_json::from_str(&contents)?;
        Ok(Some(doc))
    }

    async fn save_document(&self, task_id: &str, doc: &TaskDocument) -> Result<(), StoreError> {
        let path = self.path_for(task_id)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let contents = serde_json::to_string_pretty(doc)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, &path).await?;
        tracing::debug!("Saved task document to {}", path.display());
        Ok(())
    }

    async fn update_document<F>(&self, task_id: &str, update: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut TaskDocument) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut doc = self
            .load_document(task_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        update(&mut doc);
        self.save_document(task_id, &doc).await
    }
}

#[async_trait]
impl TaskStore for JsonFileTaskStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let task = task.into_task(Uuid::new_v4().to_string());
        let _guard = self.write_lock.lock().await;
        self.save_document(&task.id, &TaskDocument::from_task(&task))
            .await?;
        tracing::info!(task_id = %task.id, "Created task in {}", self.root.display());
        Ok(task)
    }

    async fn read_task(&self, task_id: &str) -> Result<Option<Task>, StoreError> {
        if self.path_for(task_id).is_err() {
            return Ok(None);
        }
        Ok(self
            .load_document(task_id)
            .await?
            .map(|doc| doc.into_task(task_id)))
    }

    async fn write_user_answers(
        &self,
        task_id: &str,
        user_id: &str,
        answers: &[Option<Answer>],
    ) -> Result<(), StoreError> {
        self.update_document(task_id, |doc| doc.set_user_answers(user_id, answers))
            .await
    }

    async fn write_user_completion(
        &self,
        task_id: &str,
        user_id: &str,
        completed: bool,
    ) -> Result<(), StoreError> {
        self.update_document(task_id, |doc| doc.set_user_completion(user_id, completed))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Item, TaskType};
    use chrono::{Duration, Utc};
    use serde_json::Value;

    fn new_task() -> NewTask {
        NewTask {
            title: "Rank answers".into(),
            description: "Order by relevance".into(),
            creator_id: "creator".into(),
            task_type: TaskType::Ranking,
            items: vec![Item::new("query", &["a", "b", "c"])],
            total_annotators_target: 3,
            total_credits: 30,
            end_date: Utc::now() + Duration::days(1),
        }
    }

    #[tokio::test]
    async fn round_trips_answers_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileTaskStore::new(dir.path());
        let task = store.create_task(new_task()).await.expect("create task");

        store
            .write_user_answers(&task.id, "alice", &[Some(Answer::Ranking(vec![2, 0, 1]))])
            .await
            .expect("write answers");
        store
            .write_user_completion(&task.id, "alice", true)
            .await
            .expect("write completion");

        let loaded = store
            .read_task(&task.id)
            .await
            .expect("read task")
            .expect("task exists");
        assert_eq!(loaded.answer_at("alice", 0), Some(&Answer::Ranking(vec![2, 0, 1])));
        assert!(loaded.is_completed_by("alice"));
        assert_eq!(loaded.items, task.items);
    }

    #[tokio::test]
    async fn partial_write_preserves_unknown_fields_and_other_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            r#"{
                "title": "Legacy",
                "type": "text-classification",
                "dataset": [{"text": "x", "choices": ["A", "B"]}],
                "answers": {"bob": ["B", 42]},
                "endDate": "2030-01-01T00:00:00Z"
            }"#,
        )
        .expect("seed document");

        let store = JsonFileTaskStore::new(dir.path());
        store
            .write_user_answers("legacy", "alice", &[Some(Answer::Classification("A".into()))])
            .await
            .expect("write answers");

        let raw: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(raw["answers"]["bob"], serde_json::json!(["B", 42]));
        assert_eq!(raw["answers"]["alice"], serde_json::json!(["A"]));
        assert!(raw["lastUpdated"].is_i64());
    }

    #[tokio::test]
    async fn missing_and_unsafe_ids_read_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileTaskStore::new(dir.path());
        assert!(store.read_task("nope").await.expect("read").is_none());
        assert!(store.read_task("../etc/passwd").await.expect("read").is_none());
        let err = store
            .write_user_completion("nope", "alice", true)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
