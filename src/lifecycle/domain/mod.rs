//! Policy, settings and result types for the workspace lifecycle engine.

mod drift;
mod policy;
mod settings;
mod summary;

pub use drift::drift_target;
pub use policy::{CleanupPolicy, CleanupReason, Eligibility, KeepReason, last_activity};
pub use settings::EngineSettings;
pub use summary::{
    CleanupAction, CleanupResult, CleanupSummary, CycleReport, ParseReconcileActionError,
    ReconcileAction, ReconcileDetail, ReconciliationSummary, WorkspaceError,
};
