//! Common error types and classification shared by Campus crates
//!
//! The error handling system is built on three pieces:
//!
//! 1. **`CommonError`**: errors raised by the shared primitives (invalid
//!    breaker settings).
//! 2. **`ErrorClassification`**: a uniform way to ask any error whether it is
//!    retryable, how severe it is, and whether a retry delay is suggested.
//! 3. **`ErrorSeverity`**: severity levels used for logging decisions.
//!
//! Module-specific errors compose with `CommonError` through `From` rather
//! than duplicating its variants:
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum GatewayError {
//!     #[error("Upstream rejected request: {0}")]
//!     Rejected(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//! ```

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Standard result type using CommonError
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised by the shared primitives themselves
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommonError {
    /// A settings value failed validation
    #[error("Configuration error in field '{field}': {message}")]
    Config { field: String, message: String },
}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl CommonError {
    /// Create a configuration error for a specific field
    pub fn config_field<S: Into<String>, F: Into<String>>(field: F, message: S) -> Self {
        Self::Config { field: field.into(), message: message.into() }
    }

    /// Name of the offending settings field
    pub fn field(&self) -> &str {
        match self {
            Self::Config { field, .. } => field,
        }
    }
}

/// Uniform classification of errors across the workspace
///
/// Retry loops, logging and UI-facing layers ask errors these questions
/// instead of matching on concrete variants.
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient: timeouts, throttling, server faults,
    /// connectivity loss.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "foundation", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
