//! Repository port for execution log entries.

use crate::execution_log::domain::{ExecutionLog, ExecutionLogId};
use crate::workspace::domain::ExternalWorkspaceId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for execution log repository operations.
pub type ExecutionLogRepositoryResult<T> = Result<T, ExecutionLogRepositoryError>;

/// Append-only execution log storage.
#[async_trait]
pub trait ExecutionLogRepository: Send + Sync {
    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionLogRepositoryError::DuplicateEntry`] when the entry
    /// identifier already exists.
    async fn append(&self, entry: &ExecutionLog) -> ExecutionLogRepositoryResult<()>;

    /// Returns the newest entry written for the workspace, if any.
    async fn latest_for_workspace(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ExecutionLogRepositoryResult<Option<ExecutionLog>>;
}

/// Errors returned by execution log repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ExecutionLogRepositoryError {
    /// An entry with the same identifier already exists.
    #[error("duplicate execution log entry: {0:?}")]
    DuplicateEntry(ExecutionLogId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ExecutionLogRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
