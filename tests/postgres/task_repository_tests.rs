//! `PostgreSQL` integration tests for task storage and status patches.

use chrono::TimeDelta;
use eyre::{OptionExt, ensure};
use reclaimer::patch::PatchOutcome;
use reclaimer::task::{
    domain::{Task, TaskStatus},
    ports::{TaskRepository, TaskRepositoryError},
};
use reclaimer::workspace::domain::ExternalWorkspaceId;
use rstest::rstest;

use crate::postgres::helpers::{PostgresCluster, PostgresContext, instant, postgres_cluster, task};

#[rstest]
fn duplicate_task_id_is_refused(postgres_cluster: Option<PostgresCluster>) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let queued = task(TaskStatus::Queued, None)?;

    context.block_on(async {
        context.tasks.store(&queued).await?;
        let result = context.tasks.store(&queued).await;
        ensure!(
            matches!(result, Err(TaskRepositoryError::DuplicateTask(id)) if id == queued.id()),
            "expected duplicate task, got {result:?}"
        );
        Ok(())
    })
}

#[rstest]
fn terminal_task_refuses_to_run_again(
    postgres_cluster: Option<PostgresCluster>,
) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let completed = task(TaskStatus::Completed, Some("ws-done"))?;
    let later = instant()? + TimeDelta::minutes(5);

    context.block_on(async {
        context.tasks.store(&completed).await?;
        let outcome = context
            .tasks
            .patch_status(completed.id(), TaskStatus::Running, later)
            .await?;
        ensure!(
            outcome == PatchOutcome::Rejected { current: TaskStatus::Completed },
            "unexpected outcome {outcome:?}"
        );
        let reread = context
            .tasks
            .find_by_id(completed.id())
            .await?
            .ok_or_eyre("task missing after rejected patch")?;
        ensure!(reread == completed, "row changed to {reread:?}");
        Ok(())
    })
}

#[rstest]
fn applied_patch_stamps_updated_at_and_replay_is_unchanged(
    postgres_cluster: Option<PostgresCluster>,
) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let running = task(TaskStatus::Running, Some("ws-busy"))?;
    let finished_at = instant()? + TimeDelta::minutes(3);
    let replayed_at = finished_at + TimeDelta::minutes(1);

    context.block_on(async {
        context.tasks.store(&running).await?;
        let first = context
            .tasks
            .patch_status(running.id(), TaskStatus::Cancelled, finished_at)
            .await?;
        let replay = context
            .tasks
            .patch_status(running.id(), TaskStatus::Cancelled, replayed_at)
            .await?;
        ensure!(first == PatchOutcome::Applied { from: TaskStatus::Running });
        ensure!(replay == PatchOutcome::Unchanged, "replay returned {replay:?}");

        let reread = context
            .tasks
            .find_by_id(running.id())
            .await?
            .ok_or_eyre("task missing after patch")?;
        ensure!(reread.status() == TaskStatus::Cancelled);
        ensure!(
            reread.updated_at() == finished_at,
            "replay moved updated_at to {}",
            reread.updated_at()
        );
        Ok(())
    })
}

#[rstest]
fn list_active_by_workspace_returns_only_queued_and_running(
    postgres_cluster: Option<PostgresCluster>,
) -> eyre::Result<()> {
    let Some(context) = PostgresContext::prepare(postgres_cluster)? else {
        return Ok(());
    };
    let queued = task(TaskStatus::Queued, Some("ws-target"))?;
    let running = task(TaskStatus::Running, Some("ws-target"))?;
    let inactive = [
        task(TaskStatus::Completed, Some("ws-target"))?,
        task(TaskStatus::Failed, Some("ws-target"))?,
        task(TaskStatus::NeedsReview, Some("ws-target"))?,
        task(TaskStatus::Cancelled, Some("ws-target"))?,
        task(TaskStatus::Running, Some("ws-other"))?,
        task(TaskStatus::Queued, None)?,
    ];
    let target = ExternalWorkspaceId::new("ws-target")?;

    context.block_on(async {
        context.tasks.store(&queued).await?;
        context.tasks.store(&running).await?;
        for record in &inactive {
            context.tasks.store(record).await?;
        }
        let mut active: Vec<_> = context
            .tasks
            .list_active_by_workspace(&target)
            .await?
            .iter()
            .map(Task::id)
            .collect();
        active.sort();
        let mut expected = vec![queued.id(), running.id()];
        expected.sort();
        ensure!(active == expected, "active tasks {active:?}, expected {expected:?}");
        Ok(())
    })
}
