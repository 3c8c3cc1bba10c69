//! Shared world state for workspace lifecycle BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use mockable::DefaultClock;
use reclaimer::execution_log::adapters::memory::InMemoryExecutionLogRepository;
use reclaimer::lifecycle::{
    domain::{CycleReport, EngineSettings},
    services::{CancellationReport, LifecycleCoordinator, LifecyclePorts},
};
use reclaimer::provisioning::{
    adapters::InMemoryProvisioningGateway, domain::RemoteWorkspaceStatus,
};
use reclaimer::task::{adapters::memory::InMemoryTaskRepository, domain::TaskId};
use reclaimer::workspace::{
    adapters::memory::InMemoryWorkspaceRepository,
    domain::{ExternalWorkspaceId, PersistedWorkspaceData, Workspace, WorkspaceId, WorkspaceStatus},
    ports::WorkspaceRepository,
};
use rstest::fixture;

/// Coordinator type used by the BDD world.
pub type WorldCoordinator = LifecycleCoordinator<
    InMemoryWorkspaceRepository,
    InMemoryTaskRepository,
    InMemoryExecutionLogRepository,
    InMemoryProvisioningGateway,
    DefaultClock,
>;

/// A workspace described by Given steps and stored on the first When step.
pub struct PendingWorkspace {
    pub external_id: ExternalWorkspaceId,
    pub idle_for: TimeDelta,
    pub known_remotely: bool,
    pub tasks: Vec<TaskId>,
}

/// Scenario world for workspace lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub workspaces: Arc<InMemoryWorkspaceRepository>,
    pub tasks: Arc<InMemoryTaskRepository>,
    pub gateway: Arc<InMemoryProvisioningGateway>,
    pub engine: WorldCoordinator,
    pub pending: Vec<PendingWorkspace>,
    pub task_ids: HashMap<String, TaskId>,
    pub last_report: Option<CycleReport>,
    pub last_cancellation: Option<CancellationReport>,
}

impl LifecycleWorld {
    /// Creates a world with empty stores and a configured provider.
    #[must_use]
    pub fn new() -> Self {
        let ports = LifecyclePorts {
            workspaces: Arc::new(InMemoryWorkspaceRepository::new()),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            logs: Arc::new(InMemoryExecutionLogRepository::new()),
            gateway: Arc::new(InMemoryProvisioningGateway::new()),
        };
        let engine = LifecycleCoordinator::new(
            ports.clone(),
            EngineSettings::default(),
            Arc::new(DefaultClock),
        );

        Self {
            workspaces: ports.workspaces,
            tasks: ports.tasks,
            gateway: ports.gateway,
            engine,
            pending: Vec::new(),
            task_ids: HashMap::new(),
            last_report: None,
            last_cancellation: None,
        }
    }

    /// Stores every pending workspace and registers it with the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a record.
    pub async fn flush(&mut self) -> Result<(), eyre::Report> {
        let now = Utc::now();
        for pending in self.pending.drain(..) {
            let workspace = Workspace::from_persisted(PersistedWorkspaceData {
                id: WorkspaceId::new(),
                external_id: pending.external_id.clone(),
                template: "default".to_owned(),
                status: WorkspaceStatus::Running,
                assigned_tasks: pending.tasks,
                created_at: now - TimeDelta::minutes(30).max(pending.idle_for),
                last_used_at: now - pending.idle_for,
            });
            self.workspaces.store(&workspace).await?;
            if pending.known_remotely {
                self.gateway
                    .insert(pending.external_id, RemoteWorkspaceStatus::Running);
            }
        }
        Ok(())
    }

    /// Looks up the identifier of a task by its scenario label.
    ///
    /// # Errors
    ///
    /// Returns an error if no task was created under `label`.
    pub fn task_id(&self, label: &str) -> Result<TaskId, eyre::Report> {
        self.task_ids
            .get(label)
            .copied()
            .ok_or_else(|| eyre::eyre!("no task labelled {label} in scenario world"))
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
