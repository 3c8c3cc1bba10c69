//! Diesel schema for execution log persistence.

diesel::table! {
    /// Append-only task execution events.
    execution_logs (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Task that produced the entry.
        task_id -> Uuid,
        /// Provider-issued identifier of the workspace the task ran in.
        #[max_length = 255]
        workspace_id -> Varchar,
        /// Execution status.
        #[max_length = 50]
        status -> Varchar,
        /// Error message for failed executions.
        error -> Nullable<Text>,
        /// Write timestamp.
        created_at -> Timestamptz,
    }
}
