//! In-memory repository for workspace records.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::patch::PatchOutcome;
use crate::workspace::{
    domain::{ExternalWorkspaceId, Workspace, WorkspaceId, WorkspaceStatus},
    ports::{WorkspaceRepository, WorkspaceRepositoryError, WorkspaceRepositoryResult},
};

/// Thread-safe in-memory workspace repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkspaceRepository {
    state: Arc<RwLock<InMemoryWorkspaceState>>,
}

#[derive(Debug, Default)]
struct InMemoryWorkspaceState {
    workspaces: HashMap<WorkspaceId, Workspace>,
    external_index: HashMap<ExternalWorkspaceId, WorkspaceId>,
}

impl InMemoryWorkspaceRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl ToString) -> WorkspaceRepositoryError {
    WorkspaceRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl WorkspaceRepository for InMemoryWorkspaceRepository {
    async fn store(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if state.workspaces.contains_key(&workspace.id()) {
            return Err(WorkspaceRepositoryError::DuplicateWorkspace(workspace.id()));
        }
        if state.external_index.contains_key(workspace.external_id()) {
            return Err(WorkspaceRepositoryError::DuplicateExternalId(
                workspace.external_id().clone(),
            ));
        }
        state
            .external_index
            .insert(workspace.external_id().clone(), workspace.id());
        state.workspaces.insert(workspace.id(), workspace.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: WorkspaceId) -> WorkspaceRepositoryResult<Option<Workspace>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state.workspaces.get(&id).cloned())
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalWorkspaceId,
    ) -> WorkspaceRepositoryResult<Option<Workspace>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        let workspace = state
            .external_index
            .get(external_id)
            .and_then(|id| state.workspaces.get(id))
            .cloned();
        Ok(workspace)
    }

    async fn list_non_terminal(&self) -> WorkspaceRepositoryResult<Vec<Workspace>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        let mut workspaces: Vec<Workspace> = state
            .workspaces
            .values()
            .filter(|workspace| !workspace.status().is_terminal())
            .cloned()
            .collect();
        workspaces.sort_by_key(Workspace::created_at);
        Ok(workspaces)
    }

    async fn patch_status(
        &self,
        id: WorkspaceId,
        target: WorkspaceStatus,
    ) -> WorkspaceRepositoryResult<PatchOutcome<WorkspaceStatus>> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        let workspace = state
            .workspaces
            .get_mut(&id)
            .ok_or(WorkspaceRepositoryError::NotFound(id))?;
        Ok(workspace.apply_status(target))
    }
}
