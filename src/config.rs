//! Environment-driven configuration for the lifecycle engine.

use crate::lifecycle::domain::{CleanupPolicy, EngineSettings};
use crate::provisioning::adapters::DaytonaGatewayConfig;
use crate::telemetry::LogFormat;
use chrono::TimeDelta;
use std::num::{NonZeroU64, NonZeroUsize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Master switch for the cleanup scanner.
pub const CLEANUP_ENABLED: &str = "WORKSPACE_CLEANUP_ENABLED";
/// Idle threshold in minutes.
pub const IDLE_TIMEOUT_MINUTES: &str = "WORKSPACE_IDLE_TIMEOUT_MINUTES";
/// Minimum age in minutes of a workspace that never received a task.
pub const ORPHAN_AGE_MINUTES: &str = "WORKSPACE_ORPHAN_AGE_MINUTES";
/// Grace period in minutes after a task completes.
pub const COMPLETION_GRACE_MINUTES: &str = "WORKSPACE_COMPLETION_GRACE_PERIOD_MINUTES";
/// Grace period in minutes after a task fails or is cancelled.
pub const FAILED_GRACE_MINUTES: &str = "WORKSPACE_FAILED_GRACE_PERIOD_MINUTES";
/// Whether active tasks protect their workspace.
pub const REQUIRE_NO_ACTIVE_TASKS: &str = "WORKSPACE_REQUIRE_NO_ACTIVE_TASKS";
/// Per-pass concurrency limit.
pub const MAX_CONCURRENCY: &str = "RECLAIMER_MAX_CONCURRENCY";
/// Deadline in seconds for each provisioning call.
pub const GATEWAY_TIMEOUT_SECS: &str = "RECLAIMER_GATEWAY_TIMEOUT_SECS";
/// Daemon cycle interval in seconds.
pub const INTERVAL_SECS: &str = "RECLAIMER_INTERVAL_SECS";
/// Log output format.
pub const LOG_FORMAT: &str = "RECLAIMER_LOG_FORMAT";
/// Daytona API base URL.
pub const DAYTONA_API_URL: &str = "DAYTONA_API_URL";
/// Daytona API key.
pub const DAYTONA_API_KEY: &str = "DAYTONA_API_KEY";
/// `PostgreSQL` connection string.
pub const DATABASE_URL: &str = "DATABASE_URL";

const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// A setting that could not be parsed and fell back to its default.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("ignoring invalid {key}={value:?}; using the default")]
pub struct InvalidSetting {
    /// Environment variable name.
    pub key: &'static str,
    /// Rejected value.
    pub value: String,
}

/// Fully resolved engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Lifecycle service settings.
    pub settings: EngineSettings,
    /// Provisioning gateway connection.
    pub gateway: DaytonaGatewayConfig,
    /// `PostgreSQL` connection string, when set.
    pub database_url: Option<String>,
    /// Pause between daemon cycles.
    pub interval: Duration,
    /// Log output format.
    pub log_format: LogFormat,
    /// Values that were rejected while loading.
    pub rejected: Vec<InvalidSetting>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settings: EngineSettings::default(),
            gateway: DaytonaGatewayConfig::default(),
            database_url: None,
            interval: DEFAULT_INTERVAL,
            log_format: LogFormat::default(),
            rejected: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// Unset or blank variables take their defaults. Unparseable values also
    /// take their defaults and are listed in [`EngineConfig::rejected`].
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut reader = Reader {
            lookup,
            rejected: Vec::new(),
        };
        let defaults = Self::default();
        let default_policy = defaults.settings.policy;

        let policy = CleanupPolicy {
            idle_threshold: reader.minutes(IDLE_TIMEOUT_MINUTES, default_policy.idle_threshold),
            require_no_active_tasks: reader
                .flag(REQUIRE_NO_ACTIVE_TASKS, default_policy.require_no_active_tasks),
            orphan_age: reader.minutes(ORPHAN_AGE_MINUTES, default_policy.orphan_age),
            completion_grace: reader
                .minutes(COMPLETION_GRACE_MINUTES, default_policy.completion_grace),
            failure_grace: reader.minutes(FAILED_GRACE_MINUTES, default_policy.failure_grace),
        };
        let gateway_timeout = reader
            .parsed::<NonZeroU64>(GATEWAY_TIMEOUT_SECS)
            .map_or(defaults.settings.gateway_timeout, |secs| {
                Duration::from_secs(secs.get())
            });
        let settings = EngineSettings {
            cleanup_enabled: reader.flag(CLEANUP_ENABLED, defaults.settings.cleanup_enabled),
            policy,
            max_concurrency: reader
                .parsed::<NonZeroUsize>(MAX_CONCURRENCY)
                .unwrap_or(defaults.settings.max_concurrency),
            gateway_timeout,
        };
        let gateway = DaytonaGatewayConfig {
            base_url: reader
                .text(DAYTONA_API_URL)
                .unwrap_or(defaults.gateway.base_url),
            api_key: reader.text(DAYTONA_API_KEY),
            timeout: gateway_timeout,
        };
        let interval = reader
            .parsed::<NonZeroU64>(INTERVAL_SECS)
            .map_or(defaults.interval, |secs| Duration::from_secs(secs.get()));
        let log_format = reader
            .parsed::<LogFormat>(LOG_FORMAT)
            .unwrap_or(defaults.log_format);
        let database_url = reader.text(DATABASE_URL);

        Self {
            settings,
            gateway,
            database_url,
            interval,
            log_format,
            rejected: reader.rejected,
        }
    }
}

struct Reader<F> {
    lookup: F,
    rejected: Vec<InvalidSetting>,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn text(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn parsed<T: FromStr>(&mut self, key: &'static str) -> Option<T> {
        let raw = self.text(key)?;
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                self.rejected.push(InvalidSetting { key, value: raw });
                None
            }
        }
    }

    fn flag(&mut self, key: &'static str, default: bool) -> bool {
        let Some(raw) = self.text(key) else {
            return default;
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                self.rejected.push(InvalidSetting { key, value: raw });
                default
            }
        }
    }

    fn minutes(&mut self, key: &'static str, default: TimeDelta) -> TimeDelta {
        self.parsed::<u32>(key)
            .map_or(default, |minutes| TimeDelta::minutes(i64::from(minutes)))
    }
}
