//! Step definitions for workspace lifecycle scenarios.

pub mod then;
pub mod when;
pub mod world;
