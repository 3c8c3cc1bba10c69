//! Domain model for task execution logs.

mod log;

pub use log::{ExecutionLog, ExecutionLogId, ExecutionStatus, ParseExecutionStatusError};
