//! Port contracts for execution log storage.

pub mod repository;

pub use repository::{
    ExecutionLogRepository, ExecutionLogRepositoryError, ExecutionLogRepositoryResult,
};
