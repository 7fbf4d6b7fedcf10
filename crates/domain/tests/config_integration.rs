//! Integration tests for configuration and error types
//!
//! Covers how configuration documents written by operators map onto the
//! typed settings, and how errors cross a serialization boundary.

use std::time::Duration;

use campus_domain::{ApiConfig, CampusError, Config};

/// Partial documents keep defaults for everything they omit.
#[test]
fn test_partial_document_keeps_defaults() {
    let config: Config = serde_json::from_str(
        r#"{
            "api": {
                "base_url": "https://campus.example.edu",
                "retry": { "max_retries": 0 },
                "auth": { "redirect_delay_ms": 250 }
            }
        }"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://campus.example.edu");
    assert_eq!(config.api.retry.max_retries, 0);
    assert_eq!(config.api.retry.initial_backoff(), Duration::from_millis(500));
    assert_eq!(config.api.auth.redirect_delay(), Duration::from_millis(250));
    assert_eq!(config.api.auth.refresh_path, "/auth/refresh");
    assert_eq!(config.api.request_timeout(), Duration::from_secs(30));
    assert!(config.api.validate().is_ok());
}

/// Validation names the offending field.
#[test]
fn test_validation_errors_name_the_field() {
    let mut config = ApiConfig::with_base_url("https://campus.example.edu");
    config.api_prefix = "api/v1".to_string();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CampusError::Config(ref msg) if msg.contains("api_prefix")));

    let mut config = ApiConfig::with_base_url("https://campus.example.edu");
    config.request_timeout_secs = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("request_timeout_secs"));

    let err = ApiConfig::with_base_url("ftp://campus.example.edu").validate().unwrap_err();
    assert!(err.to_string().contains("http://"));
}

/// Errors serialize with a type tag so a host UI can branch on them.
#[test]
fn test_error_wire_format() {
    let err = CampusError::Network("connection refused".to_string());
    let value = serde_json::to_value(&err).unwrap();
    assert_eq!(value, serde_json::json!({ "type": "Network", "message": "connection refused" }));

    let parsed: CampusError =
        serde_json::from_str(r#"{ "type": "Auth", "message": "Session expired" }"#).unwrap();
    assert_eq!(parsed, CampusError::Auth("Session expired".to_string()));
}
