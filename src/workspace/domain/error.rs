//! Error types for workspace domain validation and parsing.

use super::WorkspaceId;
use crate::task::domain::TaskId;
use thiserror::Error;

/// Errors returned by workspace domain operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceDomainError {
    /// The provider-issued identifier is not usable.
    #[error("invalid external workspace identifier: {0:?}")]
    InvalidExternalId(String),

    /// The template name is empty.
    #[error("workspace template must not be empty")]
    EmptyTemplate,

    /// A task cannot be bound to a workspace that has been terminated.
    #[error("workspace {workspace_id} is terminated and cannot take task {task_id}")]
    TerminalWorkspaceAssignment {
        /// Terminated workspace.
        workspace_id: WorkspaceId,
        /// Task that was refused.
        task_id: TaskId,
    },
}

/// Error returned while parsing workspace statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown workspace status: {0}")]
pub struct ParseWorkspaceStatusError(pub String);
