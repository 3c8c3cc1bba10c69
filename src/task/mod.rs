//! Task records as seen by the workspace lifecycle engine.
//!
//! The engine never creates or runs tasks. It reads them to protect busy
//! workspaces and patches their status when a task is cancelled or its
//! workspace disappears. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
