//! Lifecycle services: cleanup, reconciliation, cancellation and sync.

mod cancellation;
mod cleanup;
mod coordinator;
mod reconcile;
mod sync;
mod terminator;

pub use cancellation::{
    CancelTaskRequest, CancellationError, CancellationReport, CancellationResult,
    TaskCancellationService, TerminationSkip, WorkspaceTermination,
};
pub use cleanup::CleanupScanner;
pub use coordinator::{LifecycleCoordinator, LifecyclePorts};
pub use reconcile::StateReconciler;
pub use sync::{SyncUpdate, TaskSyncError, TaskSyncReport, TaskSyncResult, TaskSyncService};
pub use terminator::{
    LocalTermination, TerminationError, TerminationReport, WorkspaceTerminator,
};
