//! Workspace aggregate root and workspace status state machine.

use super::{ExternalWorkspaceId, ParseWorkspaceStatusError, WorkspaceDomainError, WorkspaceId};
use crate::patch::PatchOutcome;
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Locally cached status of a provisioned workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    /// The provider is still building the workspace.
    Creating,
    /// The workspace is up and can run tasks.
    Running,
    /// The workspace exists but is not running.
    Stopped,
    /// The workspace has been destroyed.
    Terminated,
}

impl WorkspaceStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
        }
    }

    /// Returns whether the status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// Transitions only move forward along
    /// `creating -> running -> stopped -> terminated`, and any non-terminal
    /// status may jump straight to `terminated`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Creating,
                Self::Running | Self::Stopped | Self::Terminated
            ) | (Self::Running, Self::Stopped | Self::Terminated)
                | (Self::Stopped, Self::Terminated)
        )
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkspaceStatus {
    type Error = ParseWorkspaceStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "creating" => Ok(Self::Creating),
            "running" => Ok(Self::Running),
            "stopped" => Ok(Self::Stopped),
            "terminated" => Ok(Self::Terminated),
            _ => Err(ParseWorkspaceStatusError(value.to_owned())),
        }
    }
}

/// Workspace aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    id: WorkspaceId,
    external_id: ExternalWorkspaceId,
    template: String,
    status: WorkspaceStatus,
    assigned_tasks: Vec<TaskId>,
    created_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted workspace aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkspaceData {
    /// Persisted internal identifier.
    pub id: WorkspaceId,
    /// Persisted provider identifier.
    pub external_id: ExternalWorkspaceId,
    /// Persisted template name.
    pub template: String,
    /// Persisted cached status.
    pub status: WorkspaceStatus,
    /// Tasks ever bound to the workspace.
    pub assigned_tasks: Vec<TaskId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last-use timestamp.
    pub last_used_at: DateTime<Utc>,
}

impl Workspace {
    /// Records a freshly requested workspace in the `creating` status.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::EmptyTemplate`] when `template` is
    /// blank.
    pub fn new(
        external_id: ExternalWorkspaceId,
        template: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Self, WorkspaceDomainError> {
        let template_name = template.into();
        if template_name.trim().is_empty() {
            return Err(WorkspaceDomainError::EmptyTemplate);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: WorkspaceId::new(),
            external_id,
            template: template_name,
            status: WorkspaceStatus::Creating,
            assigned_tasks: Vec::new(),
            created_at: timestamp,
            last_used_at: timestamp,
        })
    }

    /// Reconstructs a workspace from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkspaceData) -> Self {
        Self {
            id: data.id,
            external_id: data.external_id,
            template: data.template,
            status: data.status,
            assigned_tasks: data.assigned_tasks,
            created_at: data.created_at,
            last_used_at: data.last_used_at,
        }
    }

    /// Returns the internal identifier.
    #[must_use]
    pub const fn id(&self) -> WorkspaceId {
        self.id
    }

    /// Returns the provider-issued identifier.
    #[must_use]
    pub const fn external_id(&self) -> &ExternalWorkspaceId {
        &self.external_id
    }

    /// Returns the template the workspace was created from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the cached status.
    #[must_use]
    pub const fn status(&self) -> WorkspaceStatus {
        self.status
    }

    /// Returns every task ever bound to the workspace.
    ///
    /// This list is bookkeeping only; the task record decides whether work
    /// is still running.
    #[must_use]
    pub fn assigned_tasks(&self) -> &[TaskId] {
        &self.assigned_tasks
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last time work was scheduled onto the workspace.
    #[must_use]
    pub const fn last_used_at(&self) -> DateTime<Utc> {
        self.last_used_at
    }

    /// Binds a task to the workspace and refreshes its last-use timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::TerminalWorkspaceAssignment`] when the
    /// workspace has already been terminated.
    pub fn assign_task(
        &mut self,
        task_id: TaskId,
        clock: &impl Clock,
    ) -> Result<(), WorkspaceDomainError> {
        if self.status.is_terminal() {
            return Err(WorkspaceDomainError::TerminalWorkspaceAssignment {
                workspace_id: self.id,
                task_id,
            });
        }
        if !self.assigned_tasks.contains(&task_id) {
            self.assigned_tasks.push(task_id);
        }
        self.last_used_at = clock.utc();
        Ok(())
    }

    /// Applies a status patch evaluated against the current status.
    ///
    /// Status patches never refresh `last_used_at`.
    pub fn apply_status(&mut self, target: WorkspaceStatus) -> PatchOutcome<WorkspaceStatus> {
        let outcome =
            PatchOutcome::evaluate(self.status, target, WorkspaceStatus::can_transition_to);
        if outcome.is_applied() {
            self.status = target;
        }
        outcome
    }
}
