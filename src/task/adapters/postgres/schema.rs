//! Diesel schema for task persistence.

diesel::table! {
    /// Task records read and patched by the lifecycle engine.
    tasks (id) {
        /// Internal task identifier.
        id -> Uuid,
        /// Task execution status.
        #[max_length = 50]
        status -> Varchar,
        /// External identifier of the assigned workspace.
        #[max_length = 255]
        assigned_workspace_id -> Nullable<Varchar>,
        /// Branch produced by the task.
        #[max_length = 255]
        branch_name -> Nullable<Varchar>,
        /// Pull request opened by the task.
        pull_request_url -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
