//! API-specific error types
//!
//! Every failure the client surfaces is an [`ApiError`]. Callers never see a
//! raw transport error; they get a message, an optional machine-readable
//! code, an optional HTTP status and a session flag.

use std::time::Duration;

use campus_common::error::{CommonError, ErrorClassification, ErrorSeverity};
use campus_domain::constants::{
    CODE_CIRCUIT_OPEN, CODE_NETWORK_ERROR, CODE_RATE_LIMITED, MSG_CIRCUIT_OPEN, MSG_NETWORK_ERROR,
    MSG_RATE_LIMITED, MSG_SERVER_ERROR,
};
use campus_domain::CampusError;
use serde::Serialize;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Breaker rejected the call before any I/O
    CircuitOpen,
    /// Session missing or expired (401)
    Authentication,
    /// Authenticated but not allowed (403)
    Authorization,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) and undecodable bodies - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Bad request descriptor or client setup - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{}", MSG_CIRCUIT_OPEN)]
    CircuitOpen,

    #[error("{}", MSG_RATE_LIMITED)]
    RateLimited,

    #[error("{message}")]
    Unauthorized { message: String, code: Option<String>, session: bool },

    #[error("{message}")]
    Forbidden { message: String, code: Option<String> },

    #[error("{message}")]
    NotFound { message: String, code: String },

    /// 5xx; the server's own message is never surfaced
    #[error("{}", MSG_SERVER_ERROR)]
    Server { status: u16 },

    /// Transport failure; `detail` is for logs only
    #[error("{message}")]
    Network { message: String, detail: String },

    #[error("{message}")]
    Http { status: u16, message: String, code: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File I/O failed: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Transport failure with the standard user-facing message
    pub fn network(detail: impl Into<String>) -> Self {
        Self::Network { message: MSG_NETWORK_ERROR.to_string(), detail: detail.into() }
    }

    /// Human-readable message, safe to show to users
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Machine-readable code, when one applies
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::CircuitOpen => Some(CODE_CIRCUIT_OPEN),
            Self::RateLimited => Some(CODE_RATE_LIMITED),
            Self::Unauthorized { code, .. } | Self::Forbidden { code, .. } => code.as_deref(),
            Self::NotFound { code, .. } | Self::Http { code, .. } => Some(code),
            Self::Network { .. } => Some(CODE_NETWORK_ERROR),
            _ => None,
        }
    }

    /// HTTP status that produced this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RateLimited => Some(429),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Server { status } | Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server said the session (not the credentials) is the
    /// problem
    pub fn is_session_error(&self) -> bool {
        matches!(self, Self::Unauthorized { session: true, .. })
    }

    /// True for connectivity failures UI layers may want to mute
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::CircuitOpen => ApiErrorCategory::CircuitOpen,
            Self::Unauthorized { .. } => ApiErrorCategory::Authentication,
            Self::Forbidden { .. } => ApiErrorCategory::Authorization,
            Self::RateLimited => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::NotFound { .. } | Self::Http { .. } | Self::Decode(_) => ApiErrorCategory::Client,
            Self::Network { .. } => ApiErrorCategory::Network,
            Self::InvalidRequest(_) | Self::Io(_) | Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried by the dispatcher
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    /// Flatten into the single shape handed to UI layers
    pub fn to_payload(&self) -> ApiErrorPayload {
        ApiErrorPayload {
            message: self.message(),
            code: self.code().map(str::to_string),
            status: self.status(),
            is_session_error: self.is_session_error(),
        }
    }
}

/// Serializable error shape shared by every variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub is_session_error: bool,
}

impl From<&ApiError> for ApiErrorPayload {
    fn from(err: &ApiError) -> Self {
        err.to_payload()
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        self.should_retry()
    }

    fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ApiErrorCategory::Client | ApiErrorCategory::Authentication => ErrorSeverity::Info,
            ApiErrorCategory::CircuitOpen
            | ApiErrorCategory::Authorization
            | ApiErrorCategory::RateLimit
            | ApiErrorCategory::Network => ErrorSeverity::Warning,
            ApiErrorCategory::Server | ApiErrorCategory::Config => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Invalid breaker settings surface as configuration errors
impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convert from the domain error raised by transport and config layers
impl From<CampusError> for ApiError {
    fn from(err: CampusError) -> Self {
        match err {
            CampusError::Network(detail) => Self::network(detail),
            CampusError::Auth(message) => Self::Unauthorized { message, code: None, session: false },
            CampusError::NotFound(message) => Self::NotFound {
                message,
                code: campus_domain::constants::CODE_RESOURCE_NOT_FOUND.to_string(),
            },
            CampusError::InvalidInput(message) => Self::InvalidRequest(message),
            CampusError::Config(message) | CampusError::Internal(message) => Self::Config(message),
        }
    }
}
