//! Task cancellation with optional ad hoc workspace termination.

use super::terminator::{LocalTermination, WorkspaceTerminator};
use crate::patch::PatchOutcome;
use crate::provisioning::ports::ProvisioningGateway;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::workspace::{domain::ExternalWorkspaceId, ports::WorkspaceRepository};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for cancelling a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelTaskRequest {
    /// Task to cancel.
    pub task_id: TaskId,
    /// Also destroy the task's workspace.
    pub terminate_workspace: bool,
}

impl CancelTaskRequest {
    /// Creates a cancellation request.
    #[must_use]
    pub const fn new(task_id: TaskId, terminate_workspace: bool) -> Self {
        Self {
            task_id,
            terminate_workspace,
        }
    }
}

/// Why no termination was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationSkip {
    /// The task never received a workspace.
    NoWorkspace,
    /// No provider credentials are configured.
    GatewayNotConfigured,
}

/// Outcome of the workspace termination attempted during cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WorkspaceTermination {
    /// The workspace is gone and its record terminated.
    Terminated {
        /// Terminated workspace.
        workspace_id: ExternalWorkspaceId,
        /// The provider had already destroyed it.
        already_gone: bool,
        /// Effect on the local record.
        local: LocalTermination,
    },
    /// The termination failed; cancellation went ahead regardless.
    Failed {
        /// Workspace that could not be terminated.
        workspace_id: ExternalWorkspaceId,
        /// Failure description.
        message: String,
    },
    /// Termination was not attempted.
    Skipped {
        /// Why it was skipped.
        reason: TerminationSkip,
    },
}

/// Result of a cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationReport {
    /// Cancelled task.
    pub task_id: TaskId,
    /// Task status after the call; always `cancelled`.
    pub status: TaskStatus,
    /// The task was already cancelled before this call.
    pub already_cancelled: bool,
    /// Workspace termination outcome, when requested.
    pub workspace: Option<WorkspaceTermination>,
}

/// Errors returned by task cancellation.
#[derive(Debug, Error)]
pub enum CancellationError {
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    NotFound(TaskId),
    /// The task already finished and can no longer be cancelled.
    #[error("task {task_id} is {status} and cannot be cancelled")]
    NotCancellable {
        /// Task identifier.
        task_id: TaskId,
        /// Terminal status held by the task.
        status: TaskStatus,
    },
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// Result type for cancellation operations.
pub type CancellationResult<T> = Result<T, CancellationError>;

/// Cancels tasks and, on request, reclaims their workspaces immediately.
pub struct TaskCancellationService<W, T, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    gateway: Arc<G>,
    clock: Arc<C>,
    terminator: WorkspaceTerminator<W, G>,
}

impl<W, T, G, C> TaskCancellationService<W, T, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    /// Creates a cancellation service.
    #[must_use]
    pub fn new(
        workspaces: Arc<W>,
        tasks: Arc<T>,
        gateway: Arc<G>,
        clock: Arc<C>,
        gateway_timeout: Duration,
    ) -> Self {
        let terminator =
            WorkspaceTerminator::new(workspaces, Arc::clone(&gateway), gateway_timeout);
        Self {
            tasks,
            gateway,
            clock,
            terminator,
        }
    }

    /// Cancels a task.
    ///
    /// The task is patched to `cancelled` before any workspace termination
    /// is attempted. Cancelling an already cancelled task succeeds again. A
    /// failed workspace termination is reported in the result and never
    /// blocks the cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`CancellationError::NotFound`] for unknown tasks,
    /// [`CancellationError::NotCancellable`] for completed or failed tasks,
    /// including tasks that finish while the call is in flight, and
    /// repository errors.
    pub async fn cancel(
        &self,
        request: CancelTaskRequest,
    ) -> CancellationResult<CancellationReport> {
        let task = self
            .tasks
            .find_by_id(request.task_id)
            .await?
            .ok_or(CancellationError::NotFound(request.task_id))?;
        ensure_cancellable(&task)?;
        let already_cancelled = self.mark_cancelled(&task).await?;

        let workspace = if request.terminate_workspace {
            Some(self.terminate_assigned(&task).await)
        } else {
            None
        };

        info!(task_id = %task.id(), already_cancelled, "task cancelled");
        Ok(CancellationReport {
            task_id: task.id(),
            status: TaskStatus::Cancelled,
            already_cancelled,
            workspace,
        })
    }

    /// Returns whether the task was cancelled before this call.
    async fn mark_cancelled(&self, task: &Task) -> CancellationResult<bool> {
        if task.status() == TaskStatus::Cancelled {
            return Ok(true);
        }
        let outcome = self
            .tasks
            .patch_status(task.id(), TaskStatus::Cancelled, self.clock.utc())
            .await?;
        match outcome {
            PatchOutcome::Applied { .. } => Ok(false),
            PatchOutcome::Unchanged => Ok(true),
            PatchOutcome::Rejected { current } => Err(CancellationError::NotCancellable {
                task_id: task.id(),
                status: current,
            }),
        }
    }

    async fn terminate_assigned(&self, task: &Task) -> WorkspaceTermination {
        let Some(workspace_id) = task.assigned_workspace_id() else {
            return WorkspaceTermination::Skipped {
                reason: TerminationSkip::NoWorkspace,
            };
        };
        if !self.gateway.is_configured() {
            warn!(
                task_id = %task.id(),
                "provisioning gateway not configured; workspace left running"
            );
            return WorkspaceTermination::Skipped {
                reason: TerminationSkip::GatewayNotConfigured,
            };
        }

        match self.terminator.terminate(workspace_id).await {
            Ok(report) => WorkspaceTermination::Terminated {
                workspace_id: workspace_id.clone(),
                already_gone: report.provider.was_already_gone(),
                local: report.local,
            },
            Err(err) => {
                warn!(
                    task_id = %task.id(),
                    workspace_id = %workspace_id,
                    error = %err,
                    "workspace termination failed; cancelling task anyway"
                );
                WorkspaceTermination::Failed {
                    workspace_id: workspace_id.clone(),
                    message: err.to_string(),
                }
            }
        }
    }
}

const fn ensure_cancellable(task: &Task) -> CancellationResult<()> {
    match task.status() {
        TaskStatus::Completed | TaskStatus::Failed => Err(CancellationError::NotCancellable {
            task_id: task.id(),
            status: task.status(),
        }),
        TaskStatus::Queued
        | TaskStatus::Running
        | TaskStatus::NeedsReview
        | TaskStatus::Cancelled => Ok(()),
    }
}
