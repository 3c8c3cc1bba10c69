//! Cleanup scanner: reclaims idle, orphaned and finished workspaces.

use super::terminator::{LocalTermination, WorkspaceTerminator};
use crate::execution_log::ports::ExecutionLogRepository;
use crate::lifecycle::domain::{
    CleanupAction, CleanupResult, CleanupSummary, Eligibility, EngineSettings, KeepReason,
    WorkspaceError,
};
use crate::provisioning::ports::ProvisioningGateway;
use crate::task::{
    domain::Task,
    ports::{TaskRepository, TaskRepositoryError},
};
use crate::workspace::{domain::Workspace, ports::WorkspaceRepository};
use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

enum ScanOutcome {
    Kept,
    Reclaimed(CleanupResult),
    Failed(WorkspaceError),
}

/// Walks every non-terminal workspace and terminates the ones the cleanup
/// policy selects.
pub struct CleanupScanner<W, T, L, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    L: ExecutionLogRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    workspaces: Arc<W>,
    tasks: Arc<T>,
    logs: Arc<L>,
    gateway: Arc<G>,
    clock: Arc<C>,
    terminator: WorkspaceTerminator<W, G>,
    settings: EngineSettings,
}

impl<W, T, L, G, C> CleanupScanner<W, T, L, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    L: ExecutionLogRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    /// Creates a scanner.
    #[must_use]
    pub fn new(
        workspaces: Arc<W>,
        tasks: Arc<T>,
        logs: Arc<L>,
        gateway: Arc<G>,
        clock: Arc<C>,
        settings: EngineSettings,
    ) -> Self {
        let terminator = WorkspaceTerminator::new(
            Arc::clone(&workspaces),
            Arc::clone(&gateway),
            settings.gateway_timeout,
        );
        Self {
            workspaces,
            tasks,
            logs,
            gateway,
            clock,
            terminator,
            settings,
        }
    }

    /// Runs one cleanup pass.
    ///
    /// Never fails: per-workspace problems are reported in
    /// [`CleanupSummary::errors`] and a listing failure is reported as a
    /// single error without a workspace id.
    pub async fn run(&self) -> CleanupSummary {
        if !self.settings.cleanup_enabled {
            info!("workspace cleanup disabled; skipping pass");
            return CleanupSummary::default();
        }
        if !self.gateway.is_configured() {
            info!("provisioning gateway not configured; skipping cleanup");
            return CleanupSummary::default();
        }

        let candidates = match self.workspaces.list_non_terminal().await {
            Ok(found) => found,
            Err(err) => {
                error!(error = %err, "failed to list workspaces for cleanup");
                return CleanupSummary {
                    errors: vec![WorkspaceError::for_scan(err.to_string())],
                    ..CleanupSummary::default()
                };
            }
        };

        let now = self.clock.utc();
        let processed = candidates.len();
        let outcomes: Vec<ScanOutcome> = stream::iter(candidates)
            .map(|workspace| self.process(workspace, now))
            .buffer_unordered(self.settings.max_concurrency.get())
            .collect()
            .await;

        let mut summary = CleanupSummary {
            processed,
            ..CleanupSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                ScanOutcome::Kept => {}
                ScanOutcome::Reclaimed(result) => {
                    summary.terminated += 1;
                    summary.results.push(result);
                }
                ScanOutcome::Failed(failure) => summary.errors.push(failure),
            }
        }
        summary
            .results
            .sort_by(|left, right| left.workspace_id.cmp(&right.workspace_id));
        summary
            .errors
            .sort_by(|left, right| left.workspace_id.cmp(&right.workspace_id));

        info!(
            processed = summary.processed,
            terminated = summary.terminated,
            errors = summary.errors.len(),
            "workspace cleanup pass finished"
        );
        summary
    }

    async fn process(&self, listed: Workspace, now: DateTime<Utc>) -> ScanOutcome {
        let external_id = listed.external_id().clone();
        let workspace = match self.workspaces.find_by_id(listed.id()).await {
            Ok(Some(fresh)) if !fresh.status().is_terminal() => fresh,
            Ok(_) => {
                debug!(workspace_id = %external_id, "workspace gone or terminated since listing");
                return ScanOutcome::Kept;
            }
            Err(err) => {
                return ScanOutcome::Failed(WorkspaceError::for_workspace(
                    external_id,
                    err.to_string(),
                ));
            }
        };

        let tasks = match self.resolve_tasks(&workspace).await {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(workspace_id = %external_id, error = %err, "failed to load workspace tasks");
                return ScanOutcome::Failed(WorkspaceError::for_workspace(
                    external_id,
                    err.to_string(),
                ));
            }
        };

        let latest_log = match self.logs.latest_for_workspace(&external_id).await {
            Ok(entry) => entry.map(|found| found.created_at()),
            Err(err) => {
                warn!(
                    workspace_id = %external_id,
                    error = %err,
                    "execution log unavailable; using last_used_at"
                );
                None
            }
        };

        let eligibility = self
            .settings
            .policy
            .evaluate(&workspace, &tasks, latest_log, now);
        let reason = match eligibility {
            Eligibility::Reclaim(reason) => reason,
            Eligibility::Keep(KeepReason::ActiveTask(task_id)) => {
                debug!(
                    workspace_id = %external_id,
                    task_id = %task_id,
                    "workspace has an active task"
                );
                return ScanOutcome::Kept;
            }
            Eligibility::Keep(KeepReason::InUse) => return ScanOutcome::Kept,
        };

        match self.terminator.terminate(&external_id).await {
            Ok(report) => match report.local {
                LocalTermination::Patched { from } => {
                    info!(
                        workspace_id = %external_id,
                        reason = %reason,
                        from = %from,
                        already_gone = report.provider.was_already_gone(),
                        "workspace reclaimed"
                    );
                    ScanOutcome::Reclaimed(CleanupResult {
                        workspace_id: external_id,
                        action: CleanupAction::Terminated,
                        reason,
                        already_gone: report.provider.was_already_gone(),
                    })
                }
                LocalTermination::AlreadyTerminated | LocalTermination::MissingRecord => {
                    debug!(workspace_id = %external_id, "workspace terminated concurrently");
                    ScanOutcome::Kept
                }
            },
            Err(err) => {
                warn!(workspace_id = %external_id, error = %err, "workspace termination failed");
                ScanOutcome::Failed(WorkspaceError::for_workspace(external_id, err.to_string()))
            }
        }
    }

    async fn resolve_tasks(
        &self,
        workspace: &Workspace,
    ) -> Result<Vec<Task>, TaskRepositoryError> {
        let mut resolved: Vec<Task> = Vec::with_capacity(workspace.assigned_tasks().len());
        for task_id in workspace.assigned_tasks() {
            let Some(task) = self.tasks.find_by_id(*task_id).await? else {
                warn!(
                    workspace_id = %workspace.external_id(),
                    task_id = %task_id,
                    "assigned task record missing; ignoring"
                );
                continue;
            };
            resolved.push(task);
        }
        let active = self
            .tasks
            .list_active_by_workspace(workspace.external_id())
            .await?;
        for task in active {
            if !resolved.iter().any(|known| known.id() == task.id()) {
                resolved.push(task);
            }
        }
        Ok(resolved)
    }
}
