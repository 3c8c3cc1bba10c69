//! `PostgreSQL` repository implementation for execution logs.

use super::{models::ExecutionLogRow, schema::execution_logs};
use crate::execution_log::{
    domain::{ExecutionLog, ExecutionLogId, ExecutionStatus},
    ports::{ExecutionLogRepository, ExecutionLogRepositoryError, ExecutionLogRepositoryResult},
};
use crate::task::domain::TaskId;
use crate::workspace::domain::ExternalWorkspaceId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by execution log adapters.
pub type ExecutionLogPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed execution log.
#[derive(Debug, Clone)]
pub struct PostgresExecutionLogRepository {
    pool: ExecutionLogPgPool,
}

impl PostgresExecutionLogRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ExecutionLogPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ExecutionLogRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ExecutionLogRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(ExecutionLogRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ExecutionLogRepositoryError::persistence)?
    }
}

#[async_trait]
impl ExecutionLogRepository for PostgresExecutionLogRepository {
    async fn append(&self, entry: &ExecutionLog) -> ExecutionLogRepositoryResult<()> {
        let entry_id = entry.id();
        let row = ExecutionLogRow {
            id: entry.id().into_inner(),
            task_id: entry.task_id().into_inner(),
            workspace_id: entry.workspace_id().as_str().to_owned(),
            status: entry.status().as_str().to_owned(),
            error: entry.error().map(str::to_owned),
            created_at: entry.created_at(),
        };

        self.run_blocking(move |connection| {
            diesel::insert_into(execution_logs::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ExecutionLogRepositoryError::DuplicateEntry(entry_id)
                    }
                    _ => ExecutionLogRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn latest_for_workspace(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ExecutionLogRepositoryResult<Option<ExecutionLog>> {
        let lookup_id = workspace_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = execution_logs::table
                .filter(execution_logs::workspace_id.eq(lookup_id))
                .order(execution_logs::created_at.desc())
                .select(ExecutionLogRow::as_select())
                .first::<ExecutionLogRow>(connection)
                .optional()
                .map_err(ExecutionLogRepositoryError::persistence)?;
            row.map(row_to_entry).transpose()
        })
        .await
    }
}

fn row_to_entry(row: ExecutionLogRow) -> ExecutionLogRepositoryResult<ExecutionLog> {
    let workspace_id = ExternalWorkspaceId::new(row.workspace_id)
        .map_err(ExecutionLogRepositoryError::persistence)?;
    let status = ExecutionStatus::try_from(row.status.as_str())
        .map_err(ExecutionLogRepositoryError::persistence)?;
    Ok(ExecutionLog::from_persisted(
        ExecutionLogId::from_uuid(row.id),
        TaskId::from_uuid(row.task_id),
        workspace_id,
        status,
        row.error,
        row.created_at,
    ))
}
