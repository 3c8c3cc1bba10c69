//! `PostgreSQL` integration tests for workspace storage and status patches.

use eyre::{OptionExt, ensure};
use reclaimer::patch::PatchOutcome;
use reclaimer::workspace::{
    domain::{WorkspaceId, WorkspaceStatus},
    ports::{WorkspaceRepository, WorkspaceRepositoryError},
};
use rstest::rstest;

use crate::postgres::helpers::{PostgresCluster, PostgresContext, postgres_cluster, workspace};

#[rstest]
fn stored_workspace_reads_back_by_both_identifiers(
    postgres_cluster: Option<PostgresCluster>,
) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let stored = workspace("ws-roundtrip", WorkspaceStatus::Running, 10)?;

    context.block_on(async {
        context.workspaces.store(&stored).await?;
        let by_id = context
            .workspaces
            .find_by_id(stored.id())
            .await?
            .ok_or_eyre("workspace missing by id")?;
        let by_external = context
            .workspaces
            .find_by_external_id(stored.external_id())
            .await?
            .ok_or_eyre("workspace missing by external id")?;
        ensure!(by_id == stored, "read back {by_id:?}, stored {stored:?}");
        ensure!(by_external == stored);
        Ok(())
    })
}

#[rstest]
fn duplicate_external_id_is_refused(postgres_cluster: Option<PostgresCluster>) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let first = workspace("ws-shared", WorkspaceStatus::Running, 10)?;
    let second = workspace("ws-shared", WorkspaceStatus::Creating, 5)?;

    context.block_on(async {
        context.workspaces.store(&first).await?;
        let result = context.workspaces.store(&second).await;
        ensure!(
            matches!(result, Err(WorkspaceRepositoryError::DuplicateExternalId(ref id))
                if id.as_str() == "ws-shared"),
            "expected duplicate external id, got {result:?}"
        );
        Ok(())
    })
}

#[rstest]
fn terminated_to_running_is_rejected_and_row_unchanged(
    postgres_cluster: Option<PostgresCluster>,
) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let terminated = workspace("ws-gone", WorkspaceStatus::Terminated, 60)?;

    context.block_on(async {
        context.workspaces.store(&terminated).await?;
        let outcome = context
            .workspaces
            .patch_status(terminated.id(), WorkspaceStatus::Running)
            .await?;
        ensure!(
            outcome == PatchOutcome::Rejected { current: WorkspaceStatus::Terminated },
            "unexpected outcome {outcome:?}"
        );
        let reread = context
            .workspaces
            .find_by_id(terminated.id())
            .await?
            .ok_or_eyre("workspace missing after rejected patch")?;
        ensure!(reread == terminated, "row changed to {reread:?}");
        Ok(())
    })
}

#[rstest]
fn replayed_patch_is_unchanged(postgres_cluster: Option<PostgresCluster>) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let running = workspace("ws-stop-twice", WorkspaceStatus::Running, 30)?;

    context.block_on(async {
        context.workspaces.store(&running).await?;
        let first = context
            .workspaces
            .patch_status(running.id(), WorkspaceStatus::Stopped)
            .await?;
        let replay = context
            .workspaces
            .patch_status(running.id(), WorkspaceStatus::Stopped)
            .await?;
        ensure!(first == PatchOutcome::Applied { from: WorkspaceStatus::Running });
        ensure!(replay == PatchOutcome::Unchanged, "replay returned {replay:?}");
        let reread = context
            .workspaces
            .find_by_id(running.id())
            .await?
            .ok_or_eyre("workspace missing after patch")?;
        ensure!(reread.status() == WorkspaceStatus::Stopped);
        Ok(())
    })
}

#[rstest]
fn patching_unknown_workspace_is_not_found(
    postgres_cluster: Option<PostgresCluster>,
) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let missing = WorkspaceId::new();

    context.block_on(async {
        let result = context
            .workspaces
            .patch_status(missing, WorkspaceStatus::Terminated)
            .await;
        ensure!(
            matches!(result, Err(WorkspaceRepositoryError::NotFound(id)) if id == missing),
            "expected not found, got {result:?}"
        );
        Ok(())
    })
}

#[rstest]
fn list_non_terminal_excludes_terminated(
    postgres_cluster: Option<PostgresCluster>,
) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let oldest = workspace("ws-stopped", WorkspaceStatus::Stopped, 90)?;
    let gone = workspace("ws-terminated", WorkspaceStatus::Terminated, 60)?;
    let newest = workspace("ws-creating", WorkspaceStatus::Creating, 5)?;
    let middle = workspace("ws-running", WorkspaceStatus::Running, 30)?;

    context.block_on(async {
        for record in [&newest, &gone, &middle, &oldest] {
            context.workspaces.store(record).await?;
        }
        let listed: Vec<String> = context
            .workspaces
            .list_non_terminal()
            .await?
            .iter()
            .map(|listed_workspace| listed_workspace.external_id().as_str().to_owned())
            .collect();
        ensure!(
            listed == ["ws-stopped", "ws-running", "ws-creating"],
            "listed {listed:?}"
        );
        Ok(())
    })
}
