//! Configuration structures
//!
//! Every field carries a serde default so partial files (or none at all)
//! produce a usable configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    API_PREFIX, AUTH_REFRESH_PATH, DEFAULT_API_URL, DEFAULT_FAILURE_THRESHOLD,
    DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_MAX_RETRIES,
    DEFAULT_OPEN_TIMEOUT_MS, DEFAULT_REDIRECT_DELAY_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SIGN_IN_PATH, DEFAULT_USER_AGENT,
};
use crate::errors::{CampusError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// Settings for the resilient API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin, e.g. `https://campus.example.edu`
    pub base_url: String,
    /// Version prefix prepended to endpoints that lack it
    pub api_prefix: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub circuit_breaker: CircuitBreakerSettings,
    pub retry: RetrySettings,
    pub auth: AuthSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_prefix: API_PREFIX.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            circuit_breaker: CircuitBreakerSettings::default(),
            retry: RetrySettings::default(),
            auth: AuthSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Configuration pointed at `base_url` with every other field defaulted
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Per-request transport timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check invariants the client relies on
    ///
    /// # Errors
    ///
    /// Returns `CampusError::Config` when the base URL is empty or not
    /// http(s), the prefix does not start with `/`, or a threshold is zero.
    pub fn validate(&self) -> Result<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(CampusError::Config("api.base_url must not be empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CampusError::Config(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                base
            )));
        }
        if !self.api_prefix.starts_with('/') {
            return Err(CampusError::Config(format!(
                "api.api_prefix must start with '/', got '{}'",
                self.api_prefix
            )));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(CampusError::Config(
                "api.circuit_breaker.failure_threshold must be greater than 0".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CampusError::Config(
                "api.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Circuit breaker tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    /// Cooldown after the last failure before a trial request, in ms
    pub open_timeout_ms: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            open_timeout_ms: DEFAULT_OPEN_TIMEOUT_MS,
        }
    }
}

impl CircuitBreakerSettings {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }
}

/// Retry budget and backoff bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Session handling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Refresh endpoint relative to the API prefix
    pub refresh_path: String,
    /// Fallback sign-in location when the auth store has none
    pub sign_in_path: String,
    /// Delay before navigating to sign-in after a terminal 401
    pub redirect_delay_ms: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            refresh_path: AUTH_REFRESH_PATH.to_string(),
            sign_in_path: DEFAULT_SIGN_IN_PATH.to_string(),
            redirect_delay_ms: DEFAULT_REDIRECT_DELAY_MS,
        }
    }
}

impl AuthSettings {
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
