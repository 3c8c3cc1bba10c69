//! When steps for workspace lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use eyre::WrapErr;
use reclaimer::lifecycle::services::CancelTaskRequest;
use rstest_bdd_macros::when;

#[when("a lifecycle cycle runs")]
fn cycle_runs(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    run_async(world.flush()).wrap_err("seed scenario workspaces")?;
    let report = run_async(world.engine.run_cycle(true));
    world.last_report = Some(report);
    Ok(())
}

#[when(r#"task "{label}" is cancelled with workspace termination"#)]
fn cancel_task(world: &mut LifecycleWorld, label: String) -> Result<(), eyre::Report> {
    run_async(world.flush()).wrap_err("seed scenario workspaces")?;
    let task_id = world.task_id(&label)?;
    let report = run_async(
        world
            .engine
            .cancel_task(CancelTaskRequest::new(task_id, true)),
    )
    .wrap_err("cancel scenario task")?;
    world.last_cancellation = Some(report);
    Ok(())
}
