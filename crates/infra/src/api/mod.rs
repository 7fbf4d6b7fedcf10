//! Campus backend API client
//!
//! Every request goes through one dispatcher that applies, in order:
//!
//! - A shared circuit breaker checked once per request
//! - Bounded retries with capped exponential backoff for 429, 5xx and
//!   transport failures
//! - One silent session refresh (and immediate replay) on 401
//! - Unwrapping of the `{ success, data }` response envelope
//!
//! # Architecture
//!
//! - Uses the [`crate::http::HttpClient`] transport (no direct reqwest
//!   client construction)
//! - Session side effects go through injected [`AuthStore`], [`Navigator`]
//!   and [`SessionRefresh`] implementations
//! - Failures are classified as [`ApiError`] for callers to branch on

pub mod auth;
pub mod client;
pub mod envelope;
pub mod errors;
pub mod refresh;
pub mod request;

pub use auth::{
    is_auth_endpoint, AuthStore, Navigator, NoopAuthStore, SessionRefresh, TracingNavigator,
};
pub use client::{ApiClient, ApiClientBuilder, ApiResponse, AuthStatus, HealthStatus};
pub use envelope::unwrap_envelope;
pub use errors::{ApiError, ApiErrorCategory, ApiErrorPayload};
pub use refresh::SessionRefresher;
pub use request::{
    append_query, normalize_endpoint, ApiRequest, MultipartForm, MultipartPart, QueryValue,
    RequestBody, ResponseShape,
};
