//! Repository port for task persistence and status patches.

use crate::patch::PatchOutcome;
use crate::task::domain::{Task, TaskId, TaskStatus};
use crate::workspace::domain::ExternalWorkspaceId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by internal task identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns queued and running tasks bound to the given external
    /// workspace identifier.
    async fn list_active_by_workspace(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Moves a single task to `target` if its current status permits it.
    ///
    /// The current status is read inside the same write, so concurrent
    /// callers never regress a terminal task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn patch_status(
        &self,
        id: TaskId,
        target: TaskStatus,
        at: DateTime<Utc>,
    ) -> TaskRepositoryResult<PatchOutcome<TaskStatus>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
