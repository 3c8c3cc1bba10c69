//! Adapter implementations for the workspace repository port.

pub mod memory;
pub mod postgres;
