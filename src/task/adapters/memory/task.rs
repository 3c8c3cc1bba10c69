//! In-memory repository for task records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::patch::PatchOutcome;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::workspace::domain::ExternalWorkspaceId;

/// Thread-safe in-memory task repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.state.write().map_err(|err| lock_error(&err))?;
        if tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(tasks.get(&id).cloned())
    }

    async fn list_active_by_workspace(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.state.read().map_err(|err| lock_error(&err))?;
        let mut active: Vec<Task> = tasks
            .values()
            .filter(|task| {
                task.status().is_active() && task.assigned_workspace_id() == Some(workspace_id)
            })
            .cloned()
            .collect();
        active.sort_by_key(Task::created_at);
        Ok(active)
    }

    async fn patch_status(
        &self,
        id: TaskId,
        target: TaskStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<PatchOutcome<TaskStatus>> {
        let mut tasks = self.state.write().map_err(|err| lock_error(&err))?;
        let task = tasks.get_mut(&id).ok_or(TaskRepositoryError::NotFound(id))?;
        Ok(task.apply_status(target, at))
    }
}
