//! Adapter implementations for the execution log port.

pub mod memory;
pub mod postgres;
