//! Diesel schema for workspace persistence.

diesel::table! {
    /// Workspace records tracked against the provisioning service.
    workspaces (id) {
        /// Internal workspace identifier.
        id -> Uuid,
        /// Provider-issued workspace identifier.
        #[max_length = 255]
        external_id -> Varchar,
        /// Template the workspace was created from.
        #[max_length = 255]
        template -> Varchar,
        /// Cached workspace status.
        #[max_length = 50]
        status -> Varchar,
        /// Tasks ever bound to the workspace.
        assigned_tasks -> Array<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last time work was scheduled onto the workspace.
        last_used_at -> Timestamptz,
    }
}
