//! Runs the workspace lifecycle engine against `PostgreSQL` and Daytona.
//!
//! Usage:
//!
//! ```text
//! reclaimer cycle [--skip-reconcile]
//! reclaimer cancel <task-id> [--terminate-workspace]
//! reclaimer sync <task-id>
//! reclaimer daemon [--interval-secs <secs>]
//! ```
//!
//! Settings are read from the environment (see [`reclaimer::config`]).
//! Reports are written to stdout as JSON; logs go to stderr.

use clap::{Parser, Subcommand};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use mockable::DefaultClock;
use reclaimer::config::EngineConfig;
use reclaimer::execution_log::adapters::postgres::PostgresExecutionLogRepository;
use reclaimer::lifecycle::services::{
    CancelTaskRequest, CancellationError, LifecycleCoordinator, LifecyclePorts, TaskSyncError,
};
use reclaimer::provisioning::adapters::DaytonaGateway;
use reclaimer::provisioning::ports::ProvisioningGatewayError;
use reclaimer::task::adapters::postgres::PostgresTaskRepository;
use reclaimer::task::domain::TaskId;
use reclaimer::telemetry;
use reclaimer::workspace::adapters::postgres::PostgresWorkspaceRepository;
use serde::Serialize;
use std::future::Future;
use std::io::Write;
use std::num::NonZeroU64;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Engine = LifecycleCoordinator<
    PostgresWorkspaceRepository,
    PostgresTaskRepository,
    PostgresExecutionLogRepository,
    DaytonaGateway,
    DefaultClock,
>;

#[derive(Debug, Error)]
enum CliError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("failed to open database pool: {0}")]
    Pool(#[source] PoolError),
    #[error("failed to build provisioning client: {0}")]
    Gateway(#[from] ProvisioningGatewayError),
    #[error(transparent)]
    Cancel(#[from] CancellationError),
    #[error(transparent)]
    Sync(#[from] TaskSyncError),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

#[derive(Debug, Parser)]
#[command(name = "reclaimer", version, about = "Workspace lifecycle engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one cleanup pass followed by a reconciliation pass.
    Cycle {
        /// Run the cleanup pass only.
        #[arg(long)]
        skip_reconcile: bool,
    },
    /// Cancel a task.
    Cancel {
        /// Task identifier.
        task_id: Uuid,
        /// Also terminate the task's workspace.
        #[arg(long)]
        terminate_workspace: bool,
    },
    /// Sync a task with the provider's view of its workspace.
    Sync {
        /// Task identifier.
        task_id: Uuid,
    },
    /// Run cycles on a fixed interval until interrupted.
    Daemon {
        /// Seconds between cycles; overrides `RECLAIMER_INTERVAL_SECS`.
        #[arg(long)]
        interval_secs: Option<NonZeroU64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    telemetry::init(config.log_format);
    for rejected in &config.rejected {
        warn!(key = rejected.key, value = %rejected.value, "ignoring invalid setting");
    }
    run(cli.command, config).await.map_err(Into::into)
}

async fn run(command: Command, config: EngineConfig) -> Result<(), CliError> {
    let engine = build_engine(&config)?;
    match command {
        Command::Cycle { skip_reconcile } => emit(&engine.run_cycle(!skip_reconcile).await),
        Command::Cancel {
            task_id,
            terminate_workspace,
        } => {
            let request = CancelTaskRequest::new(TaskId::from_uuid(task_id), terminate_workspace);
            emit(&engine.cancel_task(request).await?)
        }
        Command::Sync { task_id } => {
            emit(&engine.sync_task(TaskId::from_uuid(task_id)).await?)
        }
        Command::Daemon { interval_secs } => {
            let period = interval_secs.map_or(config.interval, |secs| {
                Duration::from_secs(secs.get())
            });
            run_daemon(&engine, period).await;
            Ok(())
        }
    }
}

fn build_engine(config: &EngineConfig) -> Result<Engine, CliError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(CliError::MissingDatabaseUrl)?;
    let pool = Pool::builder()
        .build(ConnectionManager::<PgConnection>::new(database_url))
        .map_err(CliError::Pool)?;
    let gateway = DaytonaGateway::new(config.gateway.clone())?;
    let ports = LifecyclePorts {
        workspaces: Arc::new(PostgresWorkspaceRepository::new(pool.clone())),
        tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
        logs: Arc::new(PostgresExecutionLogRepository::new(pool)),
        gateway: Arc::new(gateway),
    };
    Ok(LifecycleCoordinator::new(
        ports,
        config.settings,
        Arc::new(DefaultClock),
    ))
}

async fn run_daemon(engine: &Engine, period: Duration) {
    let settings = engine.settings();
    info!(
        interval_secs = period.as_secs(),
        cleanup_enabled = settings.cleanup_enabled,
        max_concurrency = settings.max_concurrency.get(),
        idle_threshold_minutes = settings.policy.idle_threshold.num_minutes(),
        "reclaimer daemon started"
    );

    drive(period, tokio::signal::ctrl_c(), move || async move {
        let report = engine.run_cycle(true).await;
        if let Err(err) = emit(&report) {
            error!(error = %err, "failed to write cycle report");
        }
    })
    .await;
}

/// Runs `cycle` once per `period` until `shutdown` resolves, whether the
/// loop is waiting for the next tick or a cycle is in flight.
async fn drive<S, C, F>(period: Duration, shutdown: S, mut cycle: C)
where
    S: Future<Output = std::io::Result<()>>,
    C: FnMut() -> F,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            signal = &mut shutdown => {
                log_shutdown(&signal);
                return;
            }
        }
        // Shutdown abandons an in-flight cycle between single-record writes.
        tokio::select! {
            () = cycle() => {}
            signal = &mut shutdown => {
                log_shutdown(&signal);
                return;
            }
        }
    }
}

fn log_shutdown(signal: &std::io::Result<()>) {
    if let Err(err) = signal {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown requested; stopping daemon");
}

fn emit(report: &impl Serialize) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(report)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{encoded}")?;
    Ok(())
}
