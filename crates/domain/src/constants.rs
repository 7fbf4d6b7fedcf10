//! Client constants
//!
//! Centralized location for the API surface and user-facing messages shared
//! by every crate that talks to the Campus backend.

// API surface
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const API_PREFIX: &str = "/api/v1";
pub const HEALTH_PATH: &str = "/health";
pub const AUTH_PROFILE_PATH: &str = "/auth/profile";
pub const AUTH_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_SIGN_IN_PATH: &str = "/sign-in";

/// Endpoints whose 401 responses surface directly, without refresh or
/// clearing local auth state.
pub const AUTH_ENDPOINTS: [&str; 5] = [
    "/auth/login",
    "/auth/register",
    "/auth/refresh",
    "/auth/forgot-password",
    "/auth/reset-password",
];

/// Machine code the refresh endpoint returns for anonymous users
pub const NO_REFRESH_TOKEN_CODE: &str = "NO_REFRESH_TOKEN";

// Circuit breaker defaults
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 7;
pub const DEFAULT_OPEN_TIMEOUT_MS: u64 = 30_000;

// Retry defaults
pub const DEFAULT_MAX_RETRIES: u32 = 1;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 2_000;

// Transport defaults
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("campus-client/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 100;

// User-facing messages
pub const MSG_CIRCUIT_OPEN: &str =
    "Service temporarily unavailable. Too many failed requests. Please try again later.";
pub const MSG_RATE_LIMITED: &str = "Too Many Requests - Please try again later";
pub const MSG_UNAUTHORIZED: &str = "Authentication required. Please log in again.";
pub const MSG_FORBIDDEN: &str = "You don't have permission to access this resource";
pub const MSG_NOT_FOUND: &str = "Resource not found";
pub const MSG_SERVER_ERROR: &str = "Server error - Please try again later";
pub const MSG_NETWORK_ERROR: &str = "Network error: Could not reach server";
pub const MSG_SERVER_UNREACHABLE: &str = "API server is not reachable";

// Machine-readable codes
pub const CODE_RESOURCE_NOT_FOUND: &str = "RESOURCE_NOT_FOUND";
pub const CODE_CIRCUIT_OPEN: &str = "CIRCUIT_OPEN";
pub const CODE_RATE_LIMITED: &str = "RATE_LIMITED";
pub const CODE_NETWORK_ERROR: &str = "NETWORK_ERROR";
