//! Diesel row models for workspace persistence.

use super::schema::workspaces;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for workspace records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = workspaces)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WorkspaceRow {
    /// Internal workspace identifier.
    pub id: uuid::Uuid,
    /// Provider-issued workspace identifier.
    pub external_id: String,
    /// Template name.
    pub template: String,
    /// Cached status.
    pub status: String,
    /// Tasks ever bound to the workspace.
    pub assigned_tasks: Vec<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-use timestamp.
    pub last_used_at: DateTime<Utc>,
}

/// Insert model for workspace records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = workspaces)]
pub struct NewWorkspaceRow {
    /// Internal workspace identifier.
    pub id: uuid::Uuid,
    /// Provider-issued workspace identifier.
    pub external_id: String,
    /// Template name.
    pub template: String,
    /// Cached status.
    pub status: String,
    /// Tasks ever bound to the workspace.
    pub assigned_tasks: Vec<uuid::Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-use timestamp.
    pub last_used_at: DateTime<Utc>,
}
