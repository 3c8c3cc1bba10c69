//! Task status sync against the provider's view of its workspace.

use super::reconcile::StateReconciler;
use crate::lifecycle::domain::{EngineSettings, ReconcileAction};
use crate::patch::PatchOutcome;
use crate::provisioning::{
    domain::{RemoteWorkspaceState, RemoteWorkspaceStatus},
    ports::{ProvisioningGateway, ProvisioningGatewayError, bounded},
};
use crate::task::{
    domain::{TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::workspace::{
    domain::ExternalWorkspaceId,
    ports::{WorkspaceRepository, WorkspaceRepositoryError},
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// One change applied by a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum SyncUpdate {
    /// The workspace record was corrected.
    Workspace {
        /// Corrected workspace.
        workspace_id: ExternalWorkspaceId,
        /// Correction applied.
        action: ReconcileAction,
    },
    /// The task status was corrected.
    Task {
        /// Status before the correction.
        from: TaskStatus,
        /// Status after the correction.
        to: TaskStatus,
    },
}

/// Result of syncing one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSyncReport {
    /// Synced task.
    pub task_id: TaskId,
    /// Task status after the sync.
    pub task_status: TaskStatus,
    /// Changes applied, in order.
    pub updates: Vec<SyncUpdate>,
    /// Provider failure that stopped the sync early.
    pub error: Option<String>,
}

/// Errors returned by task sync.
#[derive(Debug, Error)]
pub enum TaskSyncError {
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// Task repository operation failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),
    /// Workspace repository operation failed.
    #[error(transparent)]
    WorkspaceRepository(#[from] WorkspaceRepositoryError),
}

/// Result type for task sync operations.
pub type TaskSyncResult<T> = Result<T, TaskSyncError>;

/// Pulls the provider's status for a task's workspace and repairs both
/// records.
pub struct TaskSyncService<W, T, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    workspaces: Arc<W>,
    tasks: Arc<T>,
    gateway: Arc<G>,
    clock: Arc<C>,
    reconciler: StateReconciler<W, G>,
    settings: EngineSettings,
}

impl<W, T, G, C> TaskSyncService<W, T, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    /// Creates a sync service.
    #[must_use]
    pub fn new(
        workspaces: Arc<W>,
        tasks: Arc<T>,
        gateway: Arc<G>,
        clock: Arc<C>,
        settings: EngineSettings,
    ) -> Self {
        let reconciler =
            StateReconciler::new(Arc::clone(&workspaces), Arc::clone(&gateway), settings);
        Self {
            workspaces,
            tasks,
            gateway,
            clock,
            reconciler,
            settings,
        }
    }

    /// Syncs a task with its workspace.
    ///
    /// A running task whose workspace is gone or stopped is marked failed.
    /// Provider failures are returned in [`TaskSyncReport::error`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskSyncError::NotFound`] for unknown tasks and repository
    /// errors.
    pub async fn sync(&self, task_id: TaskId) -> TaskSyncResult<TaskSyncReport> {
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskSyncError::NotFound(task_id))?;
        let mut report = TaskSyncReport {
            task_id,
            task_status: task.status(),
            updates: Vec::new(),
            error: None,
        };

        let Some(workspace_id) = task.assigned_workspace_id() else {
            return Ok(report);
        };
        if !self.gateway.is_configured() {
            report.error = Some(ProvisioningGatewayError::NotConfigured.to_string());
            return Ok(report);
        }

        let remote = match bounded(
            self.settings.gateway_timeout,
            self.gateway.status(workspace_id),
        )
        .await
        {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    task_id = %task_id,
                    workspace_id = %workspace_id,
                    error = %err,
                    "task sync lookup failed"
                );
                report.error = Some(err.to_string());
                return Ok(report);
            }
        };

        let workspace_action = match self.workspaces.find_by_external_id(workspace_id).await? {
            Some(workspace) => self.reconciler.apply_remote_state(&workspace, &remote).await?,
            None => None,
        };
        if let Some(action) = workspace_action {
            report.updates.push(SyncUpdate::Workspace {
                workspace_id: workspace_id.clone(),
                action,
            });
        }

        let workspace_down = remote.is_gone()
            || matches!(
                remote,
                RemoteWorkspaceState::Present(RemoteWorkspaceStatus::Stopped)
            );
        if workspace_down && task.status() == TaskStatus::Running {
            let outcome = self
                .tasks
                .patch_status(task_id, TaskStatus::Failed, self.clock.utc())
                .await?;
            if let PatchOutcome::Applied { from } = outcome {
                info!(
                    task_id = %task_id,
                    workspace_id = %workspace_id,
                    "task failed: workspace is down"
                );
                report.updates.push(SyncUpdate::Task {
                    from,
                    to: TaskStatus::Failed,
                });
            }
        }

        report.task_status = self
            .tasks
            .find_by_id(task_id)
            .await?
            .map_or(report.task_status, |current| current.status());
        Ok(report)
    }
}
