//! `PostgreSQL` repository implementation for workspace storage.

use super::{
    models::{NewWorkspaceRow, WorkspaceRow},
    schema::workspaces,
};
use crate::patch::PatchOutcome;
use crate::task::domain::TaskId;
use crate::workspace::{
    domain::{
        ExternalWorkspaceId, PersistedWorkspaceData, Workspace, WorkspaceId, WorkspaceStatus,
    },
    ports::{WorkspaceRepository, WorkspaceRepositoryError, WorkspaceRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by workspace adapters.
pub type WorkspacePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed workspace repository.
#[derive(Debug, Clone)]
pub struct PostgresWorkspaceRepository {
    pool: WorkspacePgPool,
}

impl PostgresWorkspaceRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: WorkspacePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> WorkspaceRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> WorkspaceRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(WorkspaceRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(WorkspaceRepositoryError::persistence)?
    }
}

impl From<DieselError> for WorkspaceRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl WorkspaceRepository for PostgresWorkspaceRepository {
    async fn store(&self, workspace: &Workspace) -> WorkspaceRepositoryResult<()> {
        let workspace_id = workspace.id();
        let external_id = workspace.external_id().clone();
        let new_row = to_new_row(workspace);

        self.run_blocking(move |connection| {
            diesel::insert_into(workspaces::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_external_id_unique_violation(info.as_ref()) =>
                    {
                        WorkspaceRepositoryError::DuplicateExternalId(external_id.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        WorkspaceRepositoryError::DuplicateWorkspace(workspace_id)
                    }
                    _ => WorkspaceRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: WorkspaceId) -> WorkspaceRepositoryResult<Option<Workspace>> {
        self.run_blocking(move |connection| {
            let row = workspaces::table
                .filter(workspaces::id.eq(id.into_inner()))
                .select(WorkspaceRow::as_select())
                .first::<WorkspaceRow>(connection)
                .optional()?;
            row.map(row_to_workspace).transpose()
        })
        .await
    }

    async fn find_by_external_id(
        &self,
        external_id: &ExternalWorkspaceId,
    ) -> WorkspaceRepositoryResult<Option<Workspace>> {
        let lookup_id = external_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = workspaces::table
                .filter(workspaces::external_id.eq(lookup_id))
                .select(WorkspaceRow::as_select())
                .first::<WorkspaceRow>(connection)
                .optional()?;
            row.map(row_to_workspace).transpose()
        })
        .await
    }

    async fn list_non_terminal(&self) -> WorkspaceRepositoryResult<Vec<Workspace>> {
        self.run_blocking(move |connection| {
            let rows = workspaces::table
                .filter(workspaces::status.ne(WorkspaceStatus::Terminated.as_str()))
                .order(workspaces::created_at.asc())
                .select(WorkspaceRow::as_select())
                .load::<WorkspaceRow>(connection)?;
            rows.into_iter().map(row_to_workspace).collect()
        })
        .await
    }

    async fn patch_status(
        &self,
        id: WorkspaceId,
        target: WorkspaceStatus,
    ) -> WorkspaceRepositoryResult<PatchOutcome<WorkspaceStatus>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, WorkspaceRepositoryError, _>(|tx| {
                let row = workspaces::table
                    .filter(workspaces::id.eq(id.into_inner()))
                    .select(WorkspaceRow::as_select())
                    .for_update()
                    .first::<WorkspaceRow>(tx)
                    .optional()?
                    .ok_or(WorkspaceRepositoryError::NotFound(id))?;
                let mut workspace = row_to_workspace(row)?;
                let outcome = workspace.apply_status(target);
                if outcome.is_applied() {
                    diesel::update(workspaces::table.filter(workspaces::id.eq(id.into_inner())))
                        .set(workspaces::status.eq(workspace.status().as_str()))
                        .execute(tx)?;
                }
                Ok(outcome)
            })
        })
        .await
    }
}

fn to_new_row(workspace: &Workspace) -> NewWorkspaceRow {
    NewWorkspaceRow {
        id: workspace.id().into_inner(),
        external_id: workspace.external_id().as_str().to_owned(),
        template: workspace.template().to_owned(),
        status: workspace.status().as_str().to_owned(),
        assigned_tasks: workspace
            .assigned_tasks()
            .iter()
            .copied()
            .map(TaskId::into_inner)
            .collect(),
        created_at: workspace.created_at(),
        last_used_at: workspace.last_used_at(),
    }
}

fn row_to_workspace(row: WorkspaceRow) -> WorkspaceRepositoryResult<Workspace> {
    let WorkspaceRow {
        id,
        external_id: persisted_external_id,
        template,
        status: persisted_status,
        assigned_tasks: persisted_tasks,
        created_at,
        last_used_at,
    } = row;

    let external_id = ExternalWorkspaceId::new(persisted_external_id)
        .map_err(WorkspaceRepositoryError::persistence)?;
    let status = WorkspaceStatus::try_from(persisted_status.as_str())
        .map_err(WorkspaceRepositoryError::persistence)?;

    Ok(Workspace::from_persisted(PersistedWorkspaceData {
        id: WorkspaceId::from_uuid(id),
        external_id,
        template,
        status,
        assigned_tasks: persisted_tasks.into_iter().map(TaskId::from_uuid).collect(),
        created_at,
        last_used_at,
    }))
}

fn is_external_id_unique_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == "idx_workspaces_external_id_unique")
}
