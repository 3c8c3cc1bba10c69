//! Idempotent workspace termination shared by every lifecycle path.

use crate::patch::PatchOutcome;
use crate::provisioning::{
    domain::TerminationOutcome,
    ports::{ProvisioningGateway, ProvisioningGatewayError, bounded},
};
use crate::workspace::{
    domain::{ExternalWorkspaceId, WorkspaceStatus},
    ports::{WorkspaceRepository, WorkspaceRepositoryError},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// What happened to the local record after a successful termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LocalTermination {
    /// This call moved the record to `terminated`.
    Patched {
        /// Status held before the patch.
        from: WorkspaceStatus,
    },
    /// Another caller had already marked the record terminated.
    AlreadyTerminated,
    /// No local record tracks the workspace.
    MissingRecord,
}

/// Combined provider and store outcome of a termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationReport {
    /// Provider answer.
    pub provider: TerminationOutcome,
    /// Local store effect.
    pub local: LocalTermination,
}

/// Errors returned while terminating a workspace.
#[derive(Debug, Clone, Error)]
pub enum TerminationError {
    /// The provider call failed; the local record was not touched.
    #[error(transparent)]
    Provider(#[from] ProvisioningGatewayError),
    /// The provider call succeeded but the local patch failed.
    #[error(transparent)]
    Repository(#[from] WorkspaceRepositoryError),
}

/// Terminates a workspace at the provider, then marks its record.
///
/// The record is only patched after the provider confirms the workspace is
/// gone, so a failed call never changes local status.
pub struct WorkspaceTerminator<W, G>
where
    W: WorkspaceRepository,
    G: ProvisioningGateway,
{
    workspaces: Arc<W>,
    gateway: Arc<G>,
    timeout: Duration,
}

impl<W, G> WorkspaceTerminator<W, G>
where
    W: WorkspaceRepository,
    G: ProvisioningGateway,
{
    /// Creates a terminator with the given gateway deadline.
    #[must_use]
    pub const fn new(workspaces: Arc<W>, gateway: Arc<G>, timeout: Duration) -> Self {
        Self {
            workspaces,
            gateway,
            timeout,
        }
    }

    /// Terminates `workspace_id` and marks its record terminated.
    ///
    /// # Errors
    ///
    /// Returns [`TerminationError::Provider`] when the provider call fails or
    /// times out, and [`TerminationError::Repository`] when the record cannot
    /// be read or patched.
    pub async fn terminate(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> Result<TerminationReport, TerminationError> {
        let provider = bounded(self.timeout, self.gateway.terminate(workspace_id)).await?;
        let local = self.mark_terminated(workspace_id).await?;
        Ok(TerminationReport { provider, local })
    }

    /// Re-reads the record for `workspace_id` and patches it to `terminated`.
    ///
    /// # Errors
    ///
    /// Returns repository errors from the lookup or the patch.
    pub async fn mark_terminated(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> Result<LocalTermination, WorkspaceRepositoryError> {
        let Some(workspace) = self.workspaces.find_by_external_id(workspace_id).await? else {
            debug!(workspace_id = %workspace_id, "no local record for terminated workspace");
            return Ok(LocalTermination::MissingRecord);
        };
        let outcome = self
            .workspaces
            .patch_status(workspace.id(), WorkspaceStatus::Terminated)
            .await?;
        Ok(match outcome {
            PatchOutcome::Applied { from } => LocalTermination::Patched { from },
            PatchOutcome::Unchanged | PatchOutcome::Rejected { .. } => {
                LocalTermination::AlreadyTerminated
            }
        })
    }
}
