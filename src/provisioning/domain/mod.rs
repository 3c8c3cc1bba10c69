//! Provider-side view of a workspace.

use crate::workspace::domain::WorkspaceStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workspace status as reported by the provisioning service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteWorkspaceStatus {
    /// The provider is still building the workspace.
    Creating,
    /// The workspace is started.
    Running,
    /// The workspace exists but is stopped.
    Stopped,
    /// The workspace has been destroyed but is still listed.
    Terminated,
    /// A status this engine does not understand.
    Unknown(String),
}

impl RemoteWorkspaceStatus {
    /// Maps a provider status string onto the known vocabulary.
    ///
    /// Matching is case-insensitive. Unrecognised values are preserved as
    /// [`RemoteWorkspaceStatus::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "creating" | "starting" | "pending_build" | "building" => Self::Creating,
            "started" | "running" => Self::Running,
            "stopped" | "stopping" => Self::Stopped,
            "terminated" | "destroyed" | "deleted" => Self::Terminated,
            _ => Self::Unknown(raw.trim().to_owned()),
        }
    }

    /// Returns the local status this remote status corresponds to.
    #[must_use]
    pub const fn local_equivalent(&self) -> Option<WorkspaceStatus> {
        match self {
            Self::Creating => Some(WorkspaceStatus::Creating),
            Self::Running => Some(WorkspaceStatus::Running),
            Self::Stopped => Some(WorkspaceStatus::Stopped),
            Self::Terminated => Some(WorkspaceStatus::Terminated),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for RemoteWorkspaceStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creating => formatter.write_str("creating"),
            Self::Running => formatter.write_str("running"),
            Self::Stopped => formatter.write_str("stopped"),
            Self::Terminated => formatter.write_str("terminated"),
            Self::Unknown(raw) => write!(formatter, "unknown({raw})"),
        }
    }
}

/// Result of a successful status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "status", rename_all = "snake_case")]
pub enum RemoteWorkspaceState {
    /// The provider knows the workspace.
    Present(RemoteWorkspaceStatus),
    /// The provider has no record of the workspace.
    NotFound,
}

impl RemoteWorkspaceState {
    /// Returns whether the workspace no longer exists at the provider.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::Present(RemoteWorkspaceStatus::Terminated)
        )
    }
}

/// Result of a successful termination request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationOutcome {
    /// The provider destroyed the workspace.
    Terminated,
    /// The provider had already destroyed or forgotten the workspace.
    AlreadyGone,
}

impl TerminationOutcome {
    /// Returns whether the workspace was gone before the request.
    #[must_use]
    pub const fn was_already_gone(self) -> bool {
        matches!(self, Self::AlreadyGone)
    }
}
