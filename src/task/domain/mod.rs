//! Domain model for tasks executed inside workspaces.
//!
//! The lifecycle engine reads tasks to decide whether a workspace is still in
//! use and patches their status on cancellation and provider sync. Everything
//! else about a task belongs to the execution pipeline.

mod error;
mod ids;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use task::{PersistedTaskData, Task, TaskStatus};
