//! Then steps for workspace lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use reclaimer::lifecycle::domain::CycleReport;
use reclaimer::task::{domain::TaskStatus, ports::TaskRepository};
use reclaimer::workspace::{
    domain::{ExternalWorkspaceId, WorkspaceStatus},
    ports::WorkspaceRepository,
};
use rstest_bdd_macros::then;

fn workspace_status(
    world: &LifecycleWorld,
    workspace_id: &str,
) -> Result<WorkspaceStatus, eyre::Report> {
    let external_id = ExternalWorkspaceId::new(workspace_id)?;
    let workspace = run_async(world.workspaces.find_by_external_id(&external_id))?
        .ok_or_else(|| eyre::eyre!("workspace {external_id} not stored"))?;
    Ok(workspace.status())
}

fn last_report(world: &LifecycleWorld) -> Result<&CycleReport, eyre::Report> {
    world
        .last_report
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no cycle has run in this scenario"))
}

#[then(r#"workspace "{workspace_id}" is terminated"#)]
fn workspace_terminated(world: &LifecycleWorld, workspace_id: String) -> Result<(), eyre::Report> {
    let status = workspace_status(world, &workspace_id)?;
    eyre::ensure!(
        status == WorkspaceStatus::Terminated,
        "expected terminated, found {status}"
    );
    Ok(())
}

#[then(r#"workspace "{workspace_id}" is running"#)]
fn workspace_running(world: &LifecycleWorld, workspace_id: String) -> Result<(), eyre::Report> {
    let status = workspace_status(world, &workspace_id)?;
    eyre::ensure!(
        status == WorkspaceStatus::Running,
        "expected running, found {status}"
    );
    Ok(())
}

#[then("the cleanup pass terminated {count:usize} workspaces")]
fn cleanup_terminated(world: &LifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let terminated = last_report(world)?.cleanup.terminated;
    eyre::ensure!(
        terminated == count,
        "expected {count} terminated, found {terminated}"
    );
    Ok(())
}

#[then("the cleanup pass recorded {count:usize} errors")]
fn cleanup_errors(world: &LifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let errors = last_report(world)?.cleanup.errors.len();
    eyre::ensure!(errors == count, "expected {count} errors, found {errors}");
    Ok(())
}

#[then("the reconciliation pass reconciled {count:usize} workspaces")]
fn reconciled(world: &LifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let reconciled = last_report(world)?
        .reconciliation
        .as_ref()
        .map_or(0, |summary| summary.reconciled);
    eyre::ensure!(
        reconciled == count,
        "expected {count} reconciled, found {reconciled}"
    );
    Ok(())
}

#[then(r#"task "{label}" is cancelled"#)]
fn task_cancelled(world: &LifecycleWorld, label: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&label)?;
    let task = run_async(world.tasks.find_by_id(task_id))?
        .ok_or_else(|| eyre::eyre!("task {label} not stored"))?;
    eyre::ensure!(
        task.status() == TaskStatus::Cancelled,
        "expected cancelled, found {}",
        task.status()
    );
    Ok(())
}

#[then("the last cancellation found the task already cancelled")]
fn already_cancelled(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let report = world
        .last_cancellation
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no cancellation ran in this scenario"))?;
    eyre::ensure!(
        report.already_cancelled,
        "expected an idempotent repeat cancellation"
    );
    Ok(())
}
