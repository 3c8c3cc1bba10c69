//! Shared fixtures for lifecycle unit tests.

use crate::task::domain::{PersistedTaskData, Task, TaskId, TaskStatus};
use crate::workspace::domain::{
    ExternalWorkspaceId, PersistedWorkspaceData, Workspace, WorkspaceId, WorkspaceStatus,
};
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .expect("valid fixed instant")
}

pub fn external(id: &str) -> ExternalWorkspaceId {
    ExternalWorkspaceId::new(id).expect("valid external id")
}

/// Builds a workspace created and last used `age` before [`now`].
pub fn workspace(
    id: &str,
    status: WorkspaceStatus,
    age: TimeDelta,
    assigned_tasks: Vec<TaskId>,
) -> Workspace {
    touched_workspace(id, status, age, age, assigned_tasks)
}

/// Builds a workspace created `age` and last used `idle_for` before [`now`].
pub fn touched_workspace(
    id: &str,
    status: WorkspaceStatus,
    age: TimeDelta,
    idle_for: TimeDelta,
    assigned_tasks: Vec<TaskId>,
) -> Workspace {
    Workspace::from_persisted(PersistedWorkspaceData {
        id: WorkspaceId::new(),
        external_id: external(id),
        template: "default".to_owned(),
        status,
        assigned_tasks,
        created_at: now() - age,
        last_used_at: now() - idle_for,
    })
}

/// Builds a task bound to `workspace_id` whose status changed `age` ago.
pub fn task(workspace_id: &str, status: TaskStatus, age: TimeDelta) -> Task {
    let at = now() - age;
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        status,
        assigned_workspace_id: Some(external(workspace_id)),
        branch_name: None,
        pull_request_url: None,
        created_at: at,
        updated_at: at,
    })
}
