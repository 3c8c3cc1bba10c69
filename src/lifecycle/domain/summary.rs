//! Aggregate results returned by lifecycle passes.

use super::CleanupReason;
use crate::workspace::domain::{ExternalWorkspaceId, WorkspaceStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A failure recorded for one workspace, or for the whole pass when
/// `workspace_id` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceError {
    /// Workspace the failure belongs to.
    pub workspace_id: Option<ExternalWorkspaceId>,
    /// Human-readable failure description.
    pub message: String,
}

impl WorkspaceError {
    /// Records a failure for one workspace.
    #[must_use]
    pub fn for_workspace(workspace_id: ExternalWorkspaceId, message: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id),
            message: message.into(),
        }
    }

    /// Records a failure that prevented the pass from listing workspaces.
    #[must_use]
    pub fn for_scan(message: impl Into<String>) -> Self {
        Self {
            workspace_id: None,
            message: message.into(),
        }
    }
}

/// Action taken on a reclaimed workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupAction {
    /// The workspace was destroyed and its record marked terminated.
    Terminated,
}

/// One reclaimed workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupResult {
    /// Reclaimed workspace.
    pub workspace_id: ExternalWorkspaceId,
    /// Action taken.
    pub action: CleanupAction,
    /// Rule that selected the workspace.
    pub reason: CleanupReason,
    /// The provider had already destroyed the workspace.
    pub already_gone: bool,
}

/// Result of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSummary {
    /// Workspaces evaluated, whatever the outcome.
    pub processed: usize,
    /// Workspaces this pass moved to `terminated`.
    pub terminated: usize,
    /// Per-workspace failures.
    pub errors: Vec<WorkspaceError>,
    /// Per-workspace reclamations.
    pub results: Vec<CleanupResult>,
}

/// Correction applied by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReconcileAction {
    /// The provider no longer has the workspace.
    MarkedTerminated,
    /// The provider reports a later lifecycle status.
    StatusUpdated {
        /// Cached status before the correction.
        from: WorkspaceStatus,
        /// Status adopted from the provider.
        to: WorkspaceStatus,
    },
}

/// Error returned while parsing a reconcile action label.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown reconcile action: {0}")]
pub struct ParseReconcileActionError(pub String);

impl fmt::Display for ReconcileAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MarkedTerminated => formatter.write_str("marked_terminated"),
            Self::StatusUpdated { from, to } => write!(formatter, "status_updated_{from}_to_{to}"),
        }
    }
}

impl From<ReconcileAction> for String {
    fn from(value: ReconcileAction) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ReconcileAction {
    type Error = ParseReconcileActionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "marked_terminated" {
            return Ok(Self::MarkedTerminated);
        }
        let parsed = value
            .strip_prefix("status_updated_")
            .and_then(|rest| rest.split_once("_to_"))
            .and_then(|(from, to)| {
                let from_status = WorkspaceStatus::try_from(from).ok()?;
                let to_status = WorkspaceStatus::try_from(to).ok()?;
                Some(Self::StatusUpdated {
                    from: from_status,
                    to: to_status,
                })
            });
        parsed.ok_or(ParseReconcileActionError(value))
    }
}

/// One corrected workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileDetail {
    /// Corrected workspace.
    pub workspace_id: ExternalWorkspaceId,
    /// Correction applied.
    pub action: ReconcileAction,
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Workspaces this pass corrected.
    pub reconciled: usize,
    /// Per-workspace failures.
    pub errors: Vec<WorkspaceError>,
    /// Per-workspace corrections.
    pub details: Vec<ReconcileDetail>,
}

/// Result of one coordinator cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Cleanup pass summary.
    pub cleanup: CleanupSummary,
    /// Reconciliation pass summary, absent when it was skipped.
    pub reconciliation: Option<ReconciliationSummary>,
    /// Wall time spent on the cycle.
    pub duration_ms: u64,
    /// When the cycle started.
    pub timestamp: DateTime<Utc>,
}
