//! Workspaces provisioned for task execution.
//!
//! Records are created by the provisioning pipeline. The lifecycle engine
//! only reads them and patches their status toward `terminated`.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
