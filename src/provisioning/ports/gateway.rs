//! Provisioning gateway port and call deadline helper.

use crate::provisioning::domain::{RemoteWorkspaceState, TerminationOutcome};
use crate::workspace::domain::ExternalWorkspaceId;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for provisioning gateway operations.
pub type ProvisioningGatewayResult<T> = Result<T, ProvisioningGatewayError>;

/// Contract for the service that owns workspace infrastructure.
///
/// Implementations report "the workspace does not exist" as a value, never
/// as an error. Errors are transient and retried on a later cycle.
#[async_trait]
pub trait ProvisioningGateway: Send + Sync {
    /// Returns whether credentials for the provider are available.
    fn is_configured(&self) -> bool;

    /// Destroys a workspace. Destroying an absent workspace succeeds with
    /// [`TerminationOutcome::AlreadyGone`].
    async fn terminate(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ProvisioningGatewayResult<TerminationOutcome>;

    /// Looks up the provider's view of a workspace.
    async fn status(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ProvisioningGatewayResult<RemoteWorkspaceState>;
}

/// Errors returned by provisioning gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum ProvisioningGatewayError {
    /// No credentials are configured for the provider.
    #[error("provisioning gateway is not configured")]
    NotConfigured,

    /// The call did not finish within its deadline.
    #[error("provisioning call timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with an unexpected HTTP status.
    #[error("provider returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The provider answered with a body that could not be decoded.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// Network or client failure.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProvisioningGatewayError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}

/// Runs a gateway call under a deadline.
///
/// # Errors
///
/// Returns [`ProvisioningGatewayError::Timeout`] when `call` does not finish
/// within `deadline`, or the call's own error.
pub async fn bounded<T, F>(deadline: Duration, call: F) -> ProvisioningGatewayResult<T>
where
    F: Future<Output = ProvisioningGatewayResult<T>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| ProvisioningGatewayError::Timeout(deadline))?
}
