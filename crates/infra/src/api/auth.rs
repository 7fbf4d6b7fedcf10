//! Session collaborators injected into the API client
//!
//! The client never reaches into a global auth store. It is handed small
//! capability traits at construction so hosts (and tests) decide what
//! "clear the session" and "go to sign-in" mean.

use async_trait::async_trait;
use campus_domain::constants::{AUTH_ENDPOINTS, DEFAULT_SIGN_IN_PATH};
use tracing::{debug, info};

/// Local authentication state owned by the host application
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Drop any cached session; `reason` is the server's message when known
    async fn clear_auth(&self, reason: Option<&str>);

    /// Where the current user should sign in again
    fn sign_in_url(&self) -> String;
}

/// Host navigation primitive
pub trait Navigator: Send + Sync {
    /// Navigate to `url`
    fn redirect(&self, url: &str);
}

/// Attempt to renew the session
///
/// Implementations never fail; they report whether the session was renewed.
#[async_trait]
pub trait SessionRefresh: Send + Sync {
    async fn refresh(&self) -> bool;
}

/// Auth store for hosts without local session state
#[derive(Debug, Clone)]
pub struct NoopAuthStore {
    sign_in_url: String,
}

impl NoopAuthStore {
    pub fn new(sign_in_url: impl Into<String>) -> Self {
        Self { sign_in_url: sign_in_url.into() }
    }
}

impl Default for NoopAuthStore {
    fn default() -> Self {
        Self::new(DEFAULT_SIGN_IN_PATH)
    }
}

#[async_trait]
impl AuthStore for NoopAuthStore {
    async fn clear_auth(&self, reason: Option<&str>) {
        debug!(reason = reason.unwrap_or_default(), "no local auth state to clear");
    }

    fn sign_in_url(&self) -> String {
        self.sign_in_url.clone()
    }
}

/// Navigator that only records the redirect in the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn redirect(&self, url: &str) {
        info!(url, "sign-in required");
    }
}

/// True for endpoints whose 401 must surface directly
pub fn is_auth_endpoint(path: &str) -> bool {
    AUTH_ENDPOINTS.iter().any(|endpoint| path.contains(endpoint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_auth_endpoints() {
        assert!(is_auth_endpoint("/auth/login"));
        assert!(is_auth_endpoint("/api/v1/auth/register"));
        assert!(is_auth_endpoint("auth/refresh"));
        assert!(is_auth_endpoint("/api/v1/auth/forgot-password"));
        assert!(is_auth_endpoint("/api/v1/auth/reset-password?token=abc"));
    }

    #[test]
    fn other_endpoints_are_not_auth() {
        assert!(!is_auth_endpoint("/api/v1/auth/profile"));
        assert!(!is_auth_endpoint("/api/v1/classes"));
        assert!(!is_auth_endpoint("/api/v1/auth/logout"));
    }

    #[tokio::test]
    async fn noop_store_defaults_to_sign_in() {
        let store = NoopAuthStore::default();
        store.clear_auth(Some("Session expired")).await;
        assert_eq!(store.sign_in_url(), "/sign-in");
    }
}
