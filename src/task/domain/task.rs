//! Task aggregate root and task status state machine.

use super::{ParseTaskStatusError, TaskDomainError, TaskId};
use crate::patch::PatchOutcome;
use crate::workspace::domain::ExternalWorkspaceId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting for the execution pipeline.
    Queued,
    /// Task is executing inside its workspace.
    Running,
    /// Task finished successfully.
    Completed,
    /// Task finished unsuccessfully.
    Failed,
    /// Task produced changes that await human review.
    NeedsReview,
    /// Task was cancelled by a user.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NeedsReview => "needs_review",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether the task is still waiting for or holding a workspace.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }

    /// Returns whether the status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// Terminal statuses have no outgoing transitions.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (
                Self::Queued,
                Self::Running | Self::Failed | Self::Cancelled
            ) | (
                Self::Running,
                Self::Completed | Self::Failed | Self::NeedsReview | Self::Cancelled
            ) | (
                Self::NeedsReview,
                Self::Running | Self::Completed | Self::Failed | Self::Cancelled
            )
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "needs_review" => Ok(Self::NeedsReview),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    status: TaskStatus,
    assigned_workspace_id: Option<ExternalWorkspaceId>,
    branch_name: Option<String>,
    pull_request_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted execution status.
    pub status: TaskStatus,
    /// External identifier of the workspace bound to the task, if any.
    pub assigned_workspace_id: Option<ExternalWorkspaceId>,
    /// Branch produced by the task, if any.
    pub branch_name: Option<String>,
    /// Pull request opened by the task, if any.
    pub pull_request_url: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest status timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new queued task.
    #[must_use]
    pub fn new(clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            status: TaskStatus::Queued,
            assigned_workspace_id: None,
            branch_name: None,
            pull_request_url: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            status: data.status,
            assigned_workspace_id: data.assigned_workspace_id,
            branch_name: data.branch_name,
            pull_request_url: data.pull_request_url,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the execution status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the external identifier of the assigned workspace, if any.
    #[must_use]
    pub const fn assigned_workspace_id(&self) -> Option<&ExternalWorkspaceId> {
        self.assigned_workspace_id.as_ref()
    }

    /// Returns the branch produced by the task, if any.
    #[must_use]
    pub fn branch_name(&self) -> Option<&str> {
        self.branch_name.as_deref()
    }

    /// Returns the pull request URL produced by the task, if any.
    #[must_use]
    pub fn pull_request_url(&self) -> Option<&str> {
        self.pull_request_url.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest status timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Binds the task to a provisioned workspace.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TerminalTaskAssignment`] when the task has
    /// already reached a terminal status.
    pub fn assign_workspace(
        &mut self,
        workspace_id: ExternalWorkspaceId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.status.is_terminal() {
            return Err(TaskDomainError::TerminalTaskAssignment {
                task_id: self.id,
                status: self.status,
            });
        }
        self.assigned_workspace_id = Some(workspace_id);
        self.touch(clock);
        Ok(())
    }

    /// Applies a status patch evaluated against the current status.
    ///
    /// Adapters call this on the freshly read record; the aggregate is only
    /// mutated when the outcome is [`PatchOutcome::Applied`].
    pub fn apply_status(
        &mut self,
        target: TaskStatus,
        at: DateTime<Utc>,
    ) -> PatchOutcome<TaskStatus> {
        let outcome = PatchOutcome::evaluate(self.status, target, TaskStatus::can_transition_to);
        if outcome.is_applied() {
            self.status = target;
            self.updated_at = at;
        }
        outcome
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
