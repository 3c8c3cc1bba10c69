//! Access to the external workspace provisioning service.
//!
//! The gateway port exposes exactly three capabilities: a configuration
//! check, a status lookup and an idempotent termination. "Not found" is a
//! successful answer, so callers only ever see errors for transient
//! failures.

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
