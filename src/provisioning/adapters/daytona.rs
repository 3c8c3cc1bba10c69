//! HTTP gateway for the Daytona workspace API.

use crate::provisioning::{
    domain::{RemoteWorkspaceState, RemoteWorkspaceStatus, TerminationOutcome},
    ports::{ProvisioningGateway, ProvisioningGatewayError, ProvisioningGatewayResult},
};
use crate::workspace::domain::ExternalWorkspaceId;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("reclaimer/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the Daytona API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaytonaGatewayConfig {
    /// API base URL, without a trailing `/workspace` segment.
    pub base_url: String,
    /// Bearer token. The gateway counts as unconfigured without one.
    pub api_key: Option<String>,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for DaytonaGatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://app.daytona.io/api".to_owned(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`ProvisioningGateway`] backed by the Daytona REST API.
#[derive(Debug, Clone)]
pub struct DaytonaGateway {
    client: Client,
    config: DaytonaGatewayConfig,
}

#[derive(Debug, Deserialize)]
struct WorkspacePayload {
    status: Option<String>,
    state: Option<String>,
}

impl DaytonaGateway {
    /// Builds the HTTP client for the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningGatewayError::Transport`] when the HTTP client
    /// cannot be constructed.
    pub fn new(config: DaytonaGatewayConfig) -> ProvisioningGatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ProvisioningGatewayError::transport)?;
        Ok(Self { client, config })
    }

    fn workspace_url(&self, workspace_id: &ExternalWorkspaceId) -> String {
        format!(
            "{}/workspace/{}",
            self.config.base_url.trim_end_matches('/'),
            workspace_id
        )
    }

    fn api_key(&self) -> ProvisioningGatewayResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProvisioningGatewayError::NotConfigured)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ProvisioningGatewayError {
        if err.is_timeout() {
            ProvisioningGatewayError::Timeout(self.config.timeout)
        } else {
            ProvisioningGatewayError::transport(err)
        }
    }
}

fn is_gone(status: StatusCode) -> bool {
    status == StatusCode::NOT_FOUND || status == StatusCode::GONE
}

async fn http_error(response: Response) -> ProvisioningGatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        body
    };
    ProvisioningGatewayError::Http {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ProvisioningGateway for DaytonaGateway {
    fn is_configured(&self) -> bool {
        self.api_key().is_ok()
    }

    async fn terminate(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ProvisioningGatewayResult<TerminationOutcome> {
        let api_key = self.api_key()?;
        let url = self.workspace_url(workspace_id);
        debug!(url = %url, "requesting workspace termination");

        let response = self
            .client
            .delete(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|err| self.map_send_error(err))?;

        let status = response.status();
        if status.is_success() {
            info!(workspace_id = %workspace_id, "provider terminated workspace");
            return Ok(TerminationOutcome::Terminated);
        }
        if is_gone(status) {
            debug!(workspace_id = %workspace_id, "workspace already gone at provider");
            return Ok(TerminationOutcome::AlreadyGone);
        }
        let err = http_error(response).await;
        warn!(workspace_id = %workspace_id, error = %err, "termination request failed");
        Err(err)
    }

    async fn status(
        &self,
        workspace_id: &ExternalWorkspaceId,
    ) -> ProvisioningGatewayResult<RemoteWorkspaceState> {
        let api_key = self.api_key()?;
        let url = self.workspace_url(workspace_id);
        debug!(url = %url, "fetching workspace status");

        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .send()
            .await
            .map_err(|err| self.map_send_error(err))?;

        let status = response.status();
        if is_gone(status) {
            return Ok(RemoteWorkspaceState::NotFound);
        }
        if !status.is_success() {
            return Err(http_error(response).await);
        }

        let payload: WorkspacePayload = response
            .json()
            .await
            .map_err(|err| ProvisioningGatewayError::InvalidResponse(err.to_string()))?;
        let raw = payload
            .status
            .or(payload.state)
            .ok_or_else(|| {
                ProvisioningGatewayError::InvalidResponse("missing status field".to_owned())
            })?;
        Ok(RemoteWorkspaceState::Present(RemoteWorkspaceStatus::parse(
            &raw,
        )))
    }
}
