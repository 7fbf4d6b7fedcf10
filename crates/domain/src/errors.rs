//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Campus
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CampusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Campus operations
pub type Result<T> = std::result::Result<T, CampusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(
            CampusError::Config("missing base_url".into()).to_string(),
            "Configuration error: missing base_url"
        );
        assert_eq!(CampusError::Auth("expired".into()).to_string(), "Authentication error: expired");
    }

    #[test]
    fn test_serde_tagged_shape() {
        let json = serde_json::to_value(CampusError::Network("timeout".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Network", "message": "timeout" }));

        let back: CampusError =
            serde_json::from_value(serde_json::json!({ "type": "NotFound", "message": "user" }))
                .unwrap();
        assert_eq!(back, CampusError::NotFound("user".into()));
    }
}
