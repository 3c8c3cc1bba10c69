//! State reconciler: corrects cached workspace status from the provider.

use crate::lifecycle::domain::{
    EngineSettings, ReconcileAction, ReconcileDetail, ReconciliationSummary, WorkspaceError,
    drift_target,
};
use crate::patch::PatchOutcome;
use crate::provisioning::{
    domain::RemoteWorkspaceState,
    ports::{ProvisioningGateway, bounded},
};
use crate::workspace::{
    domain::{Workspace, WorkspaceStatus},
    ports::{WorkspaceRepository, WorkspaceRepositoryError},
};
use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

enum ReconcileOutcome {
    InSync,
    Corrected(ReconcileDetail),
    Failed(WorkspaceError),
}

/// Compares each non-terminal workspace with the provider and moves drifted
/// records forward.
///
/// A failed lookup never changes local state, and a record is only ever
/// moved forward along its state machine.
pub struct StateReconciler<W, G>
where
    W: WorkspaceRepository,
    G: ProvisioningGateway,
{
    workspaces: Arc<W>,
    gateway: Arc<G>,
    settings: EngineSettings,
}

impl<W, G> StateReconciler<W, G>
where
    W: WorkspaceRepository,
    G: ProvisioningGateway,
{
    /// Creates a reconciler.
    #[must_use]
    pub const fn new(workspaces: Arc<W>, gateway: Arc<G>, settings: EngineSettings) -> Self {
        Self {
            workspaces,
            gateway,
            settings,
        }
    }

    /// Runs one reconciliation pass.
    ///
    /// Never fails: provider and store problems are reported per workspace
    /// in [`ReconciliationSummary::errors`].
    pub async fn run(&self) -> ReconciliationSummary {
        if !self.gateway.is_configured() {
            info!("provisioning gateway not configured; skipping reconciliation");
            return ReconciliationSummary::default();
        }

        let candidates = match self.workspaces.list_non_terminal().await {
            Ok(found) => found,
            Err(err) => {
                error!(error = %err, "failed to list workspaces for reconciliation");
                return ReconciliationSummary {
                    errors: vec![WorkspaceError::for_scan(err.to_string())],
                    ..ReconciliationSummary::default()
                };
            }
        };

        let outcomes: Vec<ReconcileOutcome> = stream::iter(candidates)
            .map(|workspace| self.process(workspace))
            .buffer_unordered(self.settings.max_concurrency.get())
            .collect()
            .await;

        let mut summary = ReconciliationSummary::default();
        for outcome in outcomes {
            match outcome {
                ReconcileOutcome::InSync => {}
                ReconcileOutcome::Corrected(detail) => {
                    summary.reconciled += 1;
                    summary.details.push(detail);
                }
                ReconcileOutcome::Failed(failure) => summary.errors.push(failure),
            }
        }
        summary
            .details
            .sort_by(|left, right| left.workspace_id.cmp(&right.workspace_id));
        summary
            .errors
            .sort_by(|left, right| left.workspace_id.cmp(&right.workspace_id));

        info!(
            reconciled = summary.reconciled,
            errors = summary.errors.len(),
            "workspace reconciliation pass finished"
        );
        summary
    }

    async fn process(&self, listed: Workspace) -> ReconcileOutcome {
        let external_id = listed.external_id().clone();
        let remote = match bounded(
            self.settings.gateway_timeout,
            self.gateway.status(&external_id),
        )
        .await
        {
            Ok(state) => state,
            Err(err) => {
                warn!(workspace_id = %external_id, error = %err, "provider status lookup failed");
                return ReconcileOutcome::Failed(WorkspaceError::for_workspace(
                    external_id,
                    err.to_string(),
                ));
            }
        };

        match self.apply_remote_state(&listed, &remote).await {
            Ok(Some(action)) => ReconcileOutcome::Corrected(ReconcileDetail {
                workspace_id: external_id,
                action,
            }),
            Ok(None) => ReconcileOutcome::InSync,
            Err(err) => ReconcileOutcome::Failed(WorkspaceError::for_workspace(
                external_id,
                err.to_string(),
            )),
        }
    }

    /// Re-reads `workspace` and moves it toward the provider's view.
    ///
    /// Returns the correction applied, or `None` when the record already
    /// agrees, has vanished, or the remote status would be a backward move.
    ///
    /// # Errors
    ///
    /// Returns repository errors from the re-read or the patch.
    pub async fn apply_remote_state(
        &self,
        workspace: &Workspace,
        remote: &RemoteWorkspaceState,
    ) -> Result<Option<ReconcileAction>, WorkspaceRepositoryError> {
        let Some(fresh) = self.workspaces.find_by_id(workspace.id()).await? else {
            return Ok(None);
        };
        let Some(target) = drift_target(fresh.status(), remote) else {
            return Ok(None);
        };

        let outcome = self.workspaces.patch_status(fresh.id(), target).await?;
        let PatchOutcome::Applied { from } = outcome else {
            debug!(
                workspace_id = %fresh.external_id(),
                target = %target,
                "workspace changed concurrently; no correction needed"
            );
            return Ok(None);
        };

        let action = if target == WorkspaceStatus::Terminated {
            ReconcileAction::MarkedTerminated
        } else {
            ReconcileAction::StatusUpdated { from, to: target }
        };
        info!(workspace_id = %fresh.external_id(), action = %action, "workspace reconciled");
        Ok(Some(action))
    }
}
