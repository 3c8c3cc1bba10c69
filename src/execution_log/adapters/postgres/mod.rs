//! `PostgreSQL` adapter for execution log storage.

mod models;
mod repository;
mod schema;

pub use repository::{ExecutionLogPgPool, PostgresExecutionLogRepository};
