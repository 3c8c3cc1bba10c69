//! Reclaimer: lifecycle engine for ephemeral task workspaces.
//!
//! Tasks run inside sandbox workspaces leased from an external provisioning
//! service. This crate reclaims workspaces that are idle, orphaned or
//! finished, keeps cached workspace status in step with the provider, and
//! terminates a task's workspace when the task is cancelled.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, APIs, etc.)
//!
//! # Modules
//!
//! - [`workspace`]: Workspace records and their status state machine
//! - [`task`]: Task records as far as workspace lifecycle needs them
//! - [`execution_log`]: Execution history used as activity evidence
//! - [`provisioning`]: Gateway to the external provisioning service
//! - [`lifecycle`]: Cleanup, reconciliation, cancellation and sync services
//! - [`config`] and [`telemetry`]: Environment configuration and logging

pub mod config;
pub mod execution_log;
pub mod lifecycle;
pub mod patch;
pub mod provisioning;
pub mod task;
pub mod telemetry;
pub mod workspace;
