use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::task::{Task, TaskDraft};

/// Create/update sink for tasks. Both calls are fire-and-forget: callers do
/// not learn whether the write landed, the store reports its own failures.
pub trait TaskStore {
    fn add_task(&self, draft: TaskDraft) -> impl Future<Output = ()> + Send;

    fn update_task(&self, id: &str, changes: TaskDraft) -> impl Future<Output = ()> + Send;
}

#[derive(Default)]
struct MemoryInner {
    tasks: Vec<Task>,
    next_id: u64,
}

/// In-memory store with `demo-N` ids.
#[derive(Clone, Default)]
pub struct MemoryTaskStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(drafts: impl IntoIterator<Item = TaskDraft>) -> Self {
        let store = Self::new();
        for draft in drafts {
            store.insert(draft);
        }
        store
    }

    /// Insert and return the new id.
    pub fn insert(&self, draft: TaskDraft) -> String {
        let Ok(mut inner) = self.inner.lock() else {
            tracing::error!("memory task store lock poisoned");
            return String::new();
        };
        inner.next_id += 1;
        let id = format!("demo-{}", inner.next_id);
        inner.tasks.push(draft.into_task(id.clone()));
        id
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let inner = self.inner.lock().ok()?;
        inner.tasks.iter().find(|task| task.id == id).cloned()
    }

    pub fn all(&self) -> Vec<Task> {
        self.inner
            .lock()
            .map(|inner| inner.tasks.clone())
            .unwrap_or_default()
    }

    fn replace(&self, id: &str, changes: TaskDraft) {
        let Ok(mut inner) = self.inner.lock() else {
            tracing::error!("memory task store lock poisoned");
            return;
        };
        match inner.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => *task = changes.into_task(id),
            None => tracing::warn!(id, "update for unknown task ignored"),
        }
    }
}

impl TaskStore for MemoryTaskStore {
    async fn add_task(&self, draft: TaskDraft) {
        let id = self.insert(draft);
        tracing::debug!(%id, "task added");
    }

    async fn update_task(&self, id: &str, changes: TaskDraft) {
        self.replace(id, changes);
    }
}
