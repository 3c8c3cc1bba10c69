//! In-memory execution log adapter.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::execution_log::{
    domain::ExecutionLog,
    ports::{ExecutionLogRepository, ExecutionLogRepositoryError, ExecutionLogRepositoryResult},
};
use crate::workspace::domain::ExternalWorkspaceId;

/// Thread-safe in-memory execution log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecutionLogRepository {
    entries: Arc<RwLock<Vec<ExecutionLog>>>,
}

impl InMemoryExecutionLogRepository {
    /// Creates an empty in-memory log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl ToString) -> ExecutionLogRepositoryError {
    ExecutionLogRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ExecutionLogRepository for InMemoryExecutionLogRepository {
    async fn append(&self, entry: &ExecutionLog) -> ExecutionLogRepositoryResult<()> {
        let mut entries = self.entries.write().map_err(|err| lock_error(&err))?;
        if entries.iter().any(|existing| existing.id() == entry.id()) {
            return Err(ExecutionLogRepositoryError::DuplicateEntry(entry.id()));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn latest_for_workspace(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ExecutionLogRepositoryResult<Option<ExecutionLog>> {
        let entries = self.entries.read().map_err(|err| lock_error(&err))?;
        Ok(entries
            .iter()
            .filter(|entry| entry.workspace_id() == workspace_id)
            .max_by_key(|entry| entry.created_at())
            .cloned())
    }
}
