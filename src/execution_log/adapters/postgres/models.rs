//! Diesel row models for execution log persistence.

use super::schema::execution_logs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape shared by reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = execution_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExecutionLogRow {
    /// Entry identifier.
    pub id: uuid::Uuid,
    /// Task identifier.
    pub task_id: uuid::Uuid,
    /// Provider-issued workspace identifier.
    pub workspace_id: String,
    /// Execution status.
    pub status: String,
    /// Error message.
    pub error: Option<String>,
    /// Write timestamp.
    pub created_at: DateTime<Utc>,
}
