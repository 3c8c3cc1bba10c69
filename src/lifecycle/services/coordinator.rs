//! Lifecycle coordinator: the single entry point for scheduled cycles and
//! on-demand task operations.

use super::cancellation::{
    CancelTaskRequest, CancellationReport, CancellationResult, TaskCancellationService,
};
use super::cleanup::CleanupScanner;
use super::reconcile::StateReconciler;
use super::sync::{TaskSyncReport, TaskSyncResult, TaskSyncService};
use crate::execution_log::ports::ExecutionLogRepository;
use crate::lifecycle::domain::{CycleReport, EngineSettings};
use crate::provisioning::ports::ProvisioningGateway;
use crate::task::{domain::TaskId, ports::TaskRepository};
use crate::workspace::ports::WorkspaceRepository;
use mockable::Clock;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Store and provider handles the engine runs against.
pub struct LifecyclePorts<W, T, L, G> {
    /// Workspace records.
    pub workspaces: Arc<W>,
    /// Task records.
    pub tasks: Arc<T>,
    /// Execution log records.
    pub logs: Arc<L>,
    /// Provisioning provider.
    pub gateway: Arc<G>,
}

impl<W, T, L, G> Clone for LifecyclePorts<W, T, L, G> {
    fn clone(&self) -> Self {
        Self {
            workspaces: Arc::clone(&self.workspaces),
            tasks: Arc::clone(&self.tasks),
            logs: Arc::clone(&self.logs),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

/// Runs cleanup and reconciliation cycles and serves task cancellation and
/// sync requests.
///
/// Every operation is safe to call concurrently with any other, including
/// overlapping cycles.
pub struct LifecycleCoordinator<W, T, L, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    L: ExecutionLogRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    scanner: CleanupScanner<W, T, L, G, C>,
    reconciler: StateReconciler<W, G>,
    cancellation: TaskCancellationService<W, T, G, C>,
    sync: TaskSyncService<W, T, G, C>,
    clock: Arc<C>,
    settings: EngineSettings,
}

impl<W, T, L, G, C> LifecycleCoordinator<W, T, L, G, C>
where
    W: WorkspaceRepository,
    T: TaskRepository,
    L: ExecutionLogRepository,
    G: ProvisioningGateway,
    C: Clock + Send + Sync,
{
    /// Wires the lifecycle services over shared ports.
    #[must_use]
    pub fn new(ports: LifecyclePorts<W, T, L, G>, settings: EngineSettings, clock: Arc<C>) -> Self {
        let LifecyclePorts {
            workspaces,
            tasks,
            logs,
            gateway,
        } = ports;
        let scanner = CleanupScanner::new(
            Arc::clone(&workspaces),
            Arc::clone(&tasks),
            logs,
            Arc::clone(&gateway),
            Arc::clone(&clock),
            settings,
        );
        let reconciler = StateReconciler::new(
            Arc::clone(&workspaces),
            Arc::clone(&gateway),
            settings,
        );
        let cancellation = TaskCancellationService::new(
            Arc::clone(&workspaces),
            Arc::clone(&tasks),
            Arc::clone(&gateway),
            Arc::clone(&clock),
            settings.gateway_timeout,
        );
        let sync = TaskSyncService::new(workspaces, tasks, gateway, Arc::clone(&clock), settings);
        Self {
            scanner,
            reconciler,
            cancellation,
            sync,
            clock,
            settings,
        }
    }

    /// Settings this coordinator was built with.
    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Runs a cleanup pass and, when requested, a reconciliation pass.
    ///
    /// Never fails: problems are reported inside the returned summaries.
    pub async fn run_cycle(&self, also_reconcile: bool) -> CycleReport {
        let timestamp = self.clock.utc();
        let started = Instant::now();

        let cleanup = self.scanner.run().await;
        let reconciliation = if also_reconcile {
            Some(self.reconciler.run().await)
        } else {
            None
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            processed = cleanup.processed,
            terminated = cleanup.terminated,
            reconciled = reconciliation.as_ref().map_or(0, |summary| summary.reconciled),
            duration_ms,
            "lifecycle cycle finished"
        );
        CycleReport {
            cleanup,
            reconciliation,
            duration_ms,
            timestamp,
        }
    }

    /// Cancels a task, optionally terminating its workspace.
    ///
    /// # Errors
    ///
    /// See [`TaskCancellationService::cancel`].
    pub async fn cancel_task(
        &self,
        request: CancelTaskRequest,
    ) -> CancellationResult<CancellationReport> {
        self.cancellation.cancel(request).await
    }

    /// Syncs a task with the provider's view of its workspace.
    ///
    /// # Errors
    ///
    /// See [`TaskSyncService::sync`].
    pub async fn sync_task(&self, task_id: TaskId) -> TaskSyncResult<TaskSyncReport> {
        self.sync.sync(task_id).await
    }
}
