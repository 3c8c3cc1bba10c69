//! Runtime settings shared by the lifecycle services.

use super::CleanupPolicy;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Settings for one lifecycle engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Master switch for the cleanup scanner.
    pub cleanup_enabled: bool,
    /// Reclamation thresholds.
    pub policy: CleanupPolicy,
    /// Maximum number of workspaces processed at once per pass.
    pub max_concurrency: NonZeroUsize,
    /// Deadline applied to every provisioning gateway call.
    pub gateway_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cleanup_enabled: true,
            policy: CleanupPolicy::default(),
            max_concurrency: NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN),
            gateway_timeout: Duration::from_secs(30),
        }
    }
}
