//! Workspace lifecycle engine.
//!
//! Reclaims sandbox workspaces that are idle, orphaned or finished, keeps
//! cached workspace status in line with the provisioning provider, and
//! terminates workspaces on demand when their task is cancelled.
//!
//! - Policy, settings and result types in [`domain`]
//! - Cleanup, reconciliation, cancellation and sync in [`services`]
//!
//! Every service depends only on the repository and gateway ports, so the
//! same code runs against `PostgreSQL` and the in-memory adapters.

pub mod domain;
pub mod services;
