//! Scriptable in-memory provisioning gateway.

use crate::provisioning::{
    domain::{RemoteWorkspaceState, RemoteWorkspaceStatus, TerminationOutcome},
    ports::{ProvisioningGateway, ProvisioningGatewayError, ProvisioningGatewayResult},
};
use crate::workspace::domain::ExternalWorkspaceId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// In-memory stand-in for the provisioning service.
///
/// Terminated workspaces are forgotten, so later lookups report
/// [`RemoteWorkspaceState::NotFound`] just like the real provider. Failures
/// and latency can be scripted per workspace.
#[derive(Debug, Clone)]
pub struct InMemoryProvisioningGateway {
    state: Arc<RwLock<GatewayState>>,
}

#[derive(Debug, Default)]
struct GatewayState {
    configured: bool,
    workspaces: HashMap<ExternalWorkspaceId, RemoteWorkspaceStatus>,
    failures: HashMap<ExternalWorkspaceId, String>,
    latency: Option<Duration>,
    terminate_calls: Vec<ExternalWorkspaceId>,
    status_calls: Vec<ExternalWorkspaceId>,
}

impl Default for InMemoryProvisioningGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvisioningGateway {
    /// Creates a configured gateway with no workspaces.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(GatewayState {
                configured: true,
                ..GatewayState::default()
            })),
        }
    }

    /// Creates a gateway that reports itself as unconfigured.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            state: Arc::new(RwLock::new(GatewayState::default())),
        }
    }

    /// Registers or overwrites a workspace at the provider.
    pub fn insert(&self, workspace_id: ExternalWorkspaceId, status: RemoteWorkspaceStatus) {
        if let Ok(mut state) = self.state.write() {
            state.workspaces.insert(workspace_id, status);
        }
    }

    /// Makes every call for `workspace_id` fail with an HTTP 503.
    pub fn fail_with(&self, workspace_id: ExternalWorkspaceId, message: impl Into<String>) {
        if let Ok(mut state) = self.state.write() {
            state.failures.insert(workspace_id, message.into());
        }
    }

    /// Removes a scripted failure.
    pub fn clear_failure(&self, workspace_id: &ExternalWorkspaceId) {
        if let Ok(mut state) = self.state.write() {
            state.failures.remove(workspace_id);
        }
    }

    /// Delays every call by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut state) = self.state.write() {
            state.latency = Some(latency);
        }
    }

    /// Returns the provider's current status for a workspace.
    #[must_use]
    pub fn remote_status(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> Option<RemoteWorkspaceStatus> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.workspaces.get(workspace_id).cloned())
    }

    /// Returns every workspace a termination was requested for, in order.
    #[must_use]
    pub fn terminate_calls(&self) -> Vec<ExternalWorkspaceId> {
        self.state
            .read()
            .map(|state| state.terminate_calls.clone())
            .unwrap_or_default()
    }

    /// Returns every workspace a status lookup was requested for, in order.
    #[must_use]
    pub fn status_calls(&self) -> Vec<ExternalWorkspaceId> {
        self.state
            .read()
            .map(|state| state.status_calls.clone())
            .unwrap_or_default()
    }

    fn lock_error(err: &impl ToString) -> ProvisioningGatewayError {
        ProvisioningGatewayError::transport(std::io::Error::other(err.to_string()))
    }

    async fn wait(&self) -> ProvisioningGatewayResult<()> {
        let latency = self
            .state
            .read()
            .map_err(|err| Self::lock_error(&err))?
            .latency;
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn scripted_failure(message: &str) -> ProvisioningGatewayError {
    ProvisioningGatewayError::Http {
        status: 503,
        message: message.to_owned(),
    }
}

#[async_trait]
impl ProvisioningGateway for InMemoryProvisioningGateway {
    fn is_configured(&self) -> bool {
        self.state.read().is_ok_and(|state| state.configured)
    }

    async fn terminate(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ProvisioningGatewayResult<TerminationOutcome> {
        self.wait().await?;
        let mut state = self.state.write().map_err(|err| Self::lock_error(&err))?;
        if !state.configured {
            return Err(ProvisioningGatewayError::NotConfigured);
        }
        state.terminate_calls.push(workspace_id.clone());
        if let Some(message) = state.failures.get(workspace_id) {
            return Err(scripted_failure(message));
        }
        match state.workspaces.remove(workspace_id) {
            Some(RemoteWorkspaceStatus::Terminated) | None => Ok(TerminationOutcome::AlreadyGone),
            Some(_) => Ok(TerminationOutcome::Terminated),
        }
    }

    async fn status(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ProvisioningGatewayResult<RemoteWorkspaceState> {
        self.wait().await?;
        let mut state = self.state.write().map_err(|err| Self::lock_error(&err))?;
        if !state.configured {
            return Err(ProvisioningGatewayError::NotConfigured);
        }
        state.status_calls.push(workspace_id.clone());
        if let Some(message) = state.failures.get(workspace_id) {
            return Err(scripted_failure(message));
        }
        Ok(state
            .workspaces
            .get(workspace_id)
            .cloned()
            .map_or(RemoteWorkspaceState::NotFound, RemoteWorkspaceState::Present))
    }
}
