//! Domain model for provisioned workspaces.
//!
//! A workspace is tracked under two identities: the internal record id and
//! the identifier issued by the provisioning service. Status only moves
//! forward, and `terminated` is never left once reached.

mod error;
mod ids;
mod workspace;

pub use error::{ParseWorkspaceStatusError, WorkspaceDomainError};
pub use ids::{ExternalWorkspaceId, WorkspaceId};
pub use workspace::{PersistedWorkspaceData, Workspace, WorkspaceStatus};
