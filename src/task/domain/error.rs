//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned by task aggregate operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// A workspace cannot be bound to a task that already reached a terminal
    /// status.
    #[error("task {task_id} is {status} and cannot be bound to a workspace")]
    TerminalTaskAssignment {
        /// Task identifier.
        task_id: TaskId,
        /// Terminal status held by the task.
        status: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
