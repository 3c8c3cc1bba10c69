//! Diesel row models for task persistence.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Execution status.
    pub status: String,
    /// External identifier of the assigned workspace.
    pub assigned_workspace_id: Option<String>,
    /// Branch produced by the task.
    pub branch_name: Option<String>,
    /// Pull request opened by the task.
    pub pull_request_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Internal task identifier.
    pub id: uuid::Uuid,
    /// Execution status.
    pub status: String,
    /// External identifier of the assigned workspace.
    pub assigned_workspace_id: Option<String>,
    /// Branch produced by the task.
    pub branch_name: Option<String>,
    /// Pull request opened by the task.
    pub pull_request_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
