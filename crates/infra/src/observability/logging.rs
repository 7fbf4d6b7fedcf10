//! Tracing subscriber initialisation

use campus_domain::{CampusError, LoggingConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter from `RUST_LOG`, falling back to the configured level
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.trim()))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// # Errors
/// Returns `CampusError::Internal` if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), CampusError> {
    let registry = tracing_subscriber::registry().with(build_filter(config));

    let result = if config.json {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    result.map_err(|e| CampusError::Internal(format!("failed to initialise tracing: {e}")))
}
