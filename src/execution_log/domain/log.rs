//! Append-only execution log entries.

use crate::task::domain::TaskId;
use crate::workspace::domain::ExternalWorkspaceId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionLogId(Uuid);

impl ExecutionLogId {
    /// Creates a new random log identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a log identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ExecutionLogId {
    fn default() -> Self {
        Self::new()
    }
}

/// Status recorded by an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Execution started.
    Running,
    /// Execution finished successfully.
    Completed,
    /// Execution finished with an error.
    Failed,
}

impl ExecutionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned while parsing execution statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown execution status: {0}")]
pub struct ParseExecutionStatusError(pub String);

impl TryFrom<&str> for ExecutionStatus {
    type Error = ParseExecutionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseExecutionStatusError(value.to_owned())),
        }
    }
}

/// One execution event for a task inside a workspace.
///
/// Entries are never updated. The lifecycle engine only reads the newest
/// entry per workspace as evidence of recent activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLog {
    id: ExecutionLogId,
    task_id: TaskId,
    workspace_id: ExternalWorkspaceId,
    status: ExecutionStatus,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExecutionLog {
    /// Records an execution event at the current clock time.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        workspace_id: ExternalWorkspaceId,
        status: ExecutionStatus,
        clock: &impl Clock,
    ) -> Self {
        Self::at(task_id, workspace_id, status, clock.utc())
    }

    /// Records an execution event at an explicit timestamp.
    #[must_use]
    pub fn at(
        task_id: TaskId,
        workspace_id: ExternalWorkspaceId,
        status: ExecutionStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ExecutionLogId::new(),
            task_id,
            workspace_id,
            status,
            error: None,
            created_at,
        }
    }

    /// Attaches an error message to a failed execution.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Rebuilds an entry read back from storage.
    #[must_use]
    pub const fn from_persisted(
        id: ExecutionLogId,
        task_id: TaskId,
        workspace_id: ExternalWorkspaceId,
        status: ExecutionStatus,
        error: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            workspace_id,
            status,
            error,
            created_at,
        }
    }

    /// Returns the entry identifier.
    #[must_use]
    pub const fn id(&self) -> ExecutionLogId {
        self.id
    }

    /// Returns the task that produced the entry.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the workspace the task ran in.
    #[must_use]
    pub const fn workspace_id(&self) -> &ExternalWorkspaceId {
        &self.workspace_id
    }

    /// Returns the recorded status.
    #[must_use]
    pub const fn status(&self) -> ExecutionStatus {
        self.status
    }

    /// Returns the recorded error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns when the entry was written.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
