//! # Campus Infrastructure
//!
//! I/O side of the Campus client.
//!
//! This crate contains:
//! - The resilient API client (dispatch, retry, circuit breaking, session
//!   refresh, envelope unwrapping)
//! - The HTTP transport wrapper around reqwest
//! - Configuration loading from files and environment
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Builds on `campus-common` resilience primitives
//! - Uses `campus-domain` configuration and error types
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, ApiError, ApiRequest};
pub use http::*;
