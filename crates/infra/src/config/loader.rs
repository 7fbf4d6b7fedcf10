//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Probe the standard locations for a config file (JSON or TOML)
//! 2. Fall back to built-in defaults when none is found
//! 3. Apply environment variable overrides
//! 4. Validate the API settings
//!
//! ## Environment Variables
//! - `CAMPUS_API_URL`: Backend origin
//! - `CAMPUS_CIRCUIT_BREAKER_THRESHOLD`: Failures before the circuit opens
//! - `CAMPUS_CIRCUIT_BREAKER_TIMEOUT`: Open-state cooldown in milliseconds
//! - `CAMPUS_REQUEST_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `CAMPUS_MAX_RETRIES`: Retries after the first attempt
//! - `CAMPUS_LOG_LEVEL`: Default log filter
//! - `CAMPUS_LOG_JSON`: Emit JSON logs (true/false)
//!
//! Unparseable or zero numeric values are ignored with a warning.
//!
//! ## File Locations
//! `campus.toml`, `campus.json`, `config.toml` and `config.json` are probed
//! in the working directory, its parent and grandparent, then next to the
//! executable.

use std::path::{Path, PathBuf};

use campus_domain::{CampusError, Config, Result};

use crate::errors::InfraError;

const CONFIG_FILE_NAMES: [&str; 4] = ["campus.toml", "campus.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// Uses the first config file found by [`probe_config_paths`] (or defaults),
/// then applies environment overrides.
///
/// # Errors
/// Returns `CampusError::Config` if a found file cannot be parsed or the
/// resulting configuration is invalid.
pub fn load() -> Result<Config> {
    let mut config = match probe_config_paths() {
        Some(path) => read_config(&path)?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config);
    config.api.validate()?;
    Ok(config)
}

/// Defaults plus environment overrides, ignoring config files
///
/// # Errors
/// Returns `CampusError::Config` if the resulting configuration is invalid
/// (for example an empty `CAMPUS_API_URL`).
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    config.api.validate()?;
    tracing::info!("Configuration loaded from environment variables");
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Environment
/// variables are not consulted.
///
/// # Errors
/// Returns `CampusError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CampusError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CampusError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    let config = read_config(&config_path)?;
    config.api.validate()?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<Config> {
    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| CampusError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Parse configuration, detecting the format by file extension
///
/// # Errors
/// Returns `CampusError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| InfraError::from(e).into()),
        "json" => serde_json::from_str(contents).map_err(|e| InfraError::from(e).into()),
        _ => Err(CampusError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.clone());
        dirs.push(cwd.join(".."));
        dirs.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = std::env::var("CAMPUS_API_URL") {
        config.api.base_url = url;
    }
    if let Some(threshold) = env_positive::<u32>("CAMPUS_CIRCUIT_BREAKER_THRESHOLD") {
        config.api.circuit_breaker.failure_threshold = threshold;
    }
    if let Some(timeout_ms) = env_positive::<u64>("CAMPUS_CIRCUIT_BREAKER_TIMEOUT") {
        config.api.circuit_breaker.open_timeout_ms = timeout_ms;
    }
    if let Some(secs) = env_positive::<u64>("CAMPUS_REQUEST_TIMEOUT_SECS") {
        config.api.request_timeout_secs = secs;
    }
    if let Some(retries) = env_parse::<u32>("CAMPUS_MAX_RETRIES") {
        config.api.retry.max_retries = retries;
    }
    if let Ok(level) = std::env::var("CAMPUS_LOG_LEVEL") {
        if !level.trim().is_empty() {
            config.logging.level = level;
        }
    }
    config.logging.json = env_bool("CAMPUS_LOG_JSON", config.logging.json);
}

/// Parse an environment variable, ignoring (with a warning) invalid values
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid environment value");
            None
        }
    }
}

/// Like [`env_parse`] but zero is also ignored
fn env_positive<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value = env_parse::<T>(key)?;
    if value == T::default() {
        tracing::warn!(key, "Ignoring zero environment value");
        return None;
    }
    Some(value)
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
