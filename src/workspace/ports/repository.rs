//! Repository port for workspace persistence and status patches.

use crate::patch::PatchOutcome;
use crate::workspace::domain::{ExternalWorkspaceId, Workspace, WorkspaceId, WorkspaceStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for workspace repository operations.
pub type WorkspaceRepositoryResult<T> = Result<T, WorkspaceRepositoryError>;

/// Workspace persistence contract.
#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Stores a new workspace.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceRepositoryError::DuplicateWorkspace`] when the
    /// internal identifier exists, or
    /// [`WorkspaceRepositoryError::DuplicateExternalId`] when the provider
    /// identifier is already tracked.
    async fn store(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()>;

    /// Finds a workspace by internal identifier.
    async fn find_by_id(&self, id: WorkspaceId) -> WorkspaceRepositoryResult<Option<Workspace>>;

    /// Finds a workspace by provider-issued identifier.
    async fn find_by_external_id(
        &self,
        external_id: &ExternalWorkspaceId,
    ) -> WorkspaceRepositoryResult<Option<Workspace>>;

    /// Returns every workspace whose status is not `terminated`, oldest
    /// first.
    async fn list_non_terminal(&self) -> WorkspaceRepositoryResult<Vec<Workspace>>;

    /// Moves a single workspace to `target` if its current status permits it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceRepositoryError::NotFound`] when the workspace does
    /// not exist.
    async fn patch_status(
        &self,
        id: WorkspaceId,
        target: WorkspaceStatus,
    ) -> WorkspaceRepositoryResult<PatchOutcome<WorkspaceStatus>>;
}

/// Errors returned by workspace repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkspaceRepositoryError {
    /// A workspace with the same internal identifier already exists.
    #[error("duplicate workspace identifier: {0}")]
    DuplicateWorkspace(WorkspaceId),

    /// A workspace with the same provider identifier is already tracked.
    #[error("duplicate external workspace identifier: {0}")]
    DuplicateExternalId(ExternalWorkspaceId),

    /// The workspace was not found.
    #[error("workspace not found: {0}")]
    NotFound(WorkspaceId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkspaceRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
