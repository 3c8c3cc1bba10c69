//! In-memory integration tests for task status sync.

use super::helpers::{Harness, WorkspaceSeed, external, harness};
use chrono::TimeDelta;
use eyre::ensure;
use reclaimer::lifecycle::domain::ReconcileAction;
use reclaimer::lifecycle::services::{SyncUpdate, TaskSyncError};
use reclaimer::provisioning::domain::RemoteWorkspaceStatus;
use reclaimer::task::domain::{TaskId, TaskStatus};
use reclaimer::workspace::domain::WorkspaceStatus;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn running_task_fails_when_workspace_is_gone(harness: Harness) -> eyre::Result<()> {
    let running = harness
        .seed_task(Some("ws-vanished"), TaskStatus::Running, TimeDelta::minutes(10))
        .await?;
    harness
        .seed_workspace(
            WorkspaceSeed::running("ws-vanished")
                .with_tasks(&[running.id()])
                .missing_remotely(),
        )
        .await?;

    let report = harness.engine.sync_task(running.id()).await?;

    ensure!(report.error.is_none());
    ensure!(report.task_status == TaskStatus::Failed);
    ensure!(
        report.updates
            == vec![
                SyncUpdate::Workspace {
                    workspace_id: external("ws-vanished"),
                    action: ReconcileAction::MarkedTerminated,
                },
                SyncUpdate::Task {
                    from: TaskStatus::Running,
                    to: TaskStatus::Failed,
                },
            ]
    );
    ensure!(harness.task_status(running.id()).await? == TaskStatus::Failed);
    ensure!(harness.workspace_status("ws-vanished").await? == WorkspaceStatus::Terminated);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn running_task_fails_when_workspace_is_stopped(harness: Harness) -> eyre::Result<()> {
    let running = harness
        .seed_task(Some("ws-stopped"), TaskStatus::Running, TimeDelta::minutes(10))
        .await?;
    harness
        .seed_workspace(
            WorkspaceSeed::running("ws-stopped")
                .with_tasks(&[running.id()])
                .remote(RemoteWorkspaceStatus::Stopped),
        )
        .await?;

    let report = harness.engine.sync_task(running.id()).await?;

    ensure!(report.task_status == TaskStatus::Failed);
    ensure!(report.updates.len() == 2);
    ensure!(harness.workspace_status("ws-stopped").await? == WorkspaceStatus::Stopped);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn healthy_workspace_changes_nothing(harness: Harness) -> eyre::Result<()> {
    let running = harness
        .seed_task(Some("ws-ok"), TaskStatus::Running, TimeDelta::minutes(10))
        .await?;
    harness
        .seed_workspace(WorkspaceSeed::running("ws-ok").with_tasks(&[running.id()]))
        .await?;

    let report = harness.engine.sync_task(running.id()).await?;

    ensure!(report.updates.is_empty());
    ensure!(report.error.is_none());
    ensure!(report.task_status == TaskStatus::Running);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn queued_task_survives_workspace_loss(harness: Harness) -> eyre::Result<()> {
    let queued = harness
        .seed_task(Some("ws-lost"), TaskStatus::Queued, TimeDelta::minutes(10))
        .await?;
    harness
        .seed_workspace(
            WorkspaceSeed::running("ws-lost")
                .with_tasks(&[queued.id()])
                .missing_remotely(),
        )
        .await?;

    let report = harness.engine.sync_task(queued.id()).await?;

    ensure!(report.task_status == TaskStatus::Queued);
    ensure!(report.updates.len() == 1);
    ensure!(harness.workspace_status("ws-lost").await? == WorkspaceStatus::Terminated);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provider_failure_is_reported_not_raised(harness: Harness) -> eyre::Result<()> {
    let running = harness
        .seed_task(Some("ws-err"), TaskStatus::Running, TimeDelta::minutes(10))
        .await?;
    harness
        .seed_workspace(WorkspaceSeed::running("ws-err").with_tasks(&[running.id()]))
        .await?;
    harness.gateway.fail_with(external("ws-err"), "provider unavailable");

    let report = harness.engine.sync_task(running.id()).await?;

    ensure!(report.error.is_some());
    ensure!(report.updates.is_empty());
    ensure!(harness.task_status(running.id()).await? == TaskStatus::Running);
    ensure!(harness.workspace_status("ws-err").await? == WorkspaceStatus::Running);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_without_workspace_has_nothing_to_sync(harness: Harness) -> eyre::Result<()> {
    let queued = harness
        .seed_task(None, TaskStatus::Queued, TimeDelta::minutes(1))
        .await?;

    let report = harness.engine.sync_task(queued.id()).await?;

    ensure!(report.updates.is_empty() && report.error.is_none());
    ensure!(harness.gateway.status_calls().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_not_found(harness: Harness) -> eyre::Result<()> {
    let missing = TaskId::new();

    let result = harness.engine.sync_task(missing).await;

    ensure!(matches!(result, Err(TaskSyncError::NotFound(id)) if id == missing));
    Ok(())
}
