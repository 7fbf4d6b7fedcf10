//! # Campus Domain
//!
//! Domain types shared by the Campus client crates.
//!
//! This crate contains:
//! - Domain error types and Result definitions
//! - Configuration structures with their defaults
//! - Domain constants (API prefix, auth endpoints, user-facing messages)
//!
//! ## Architecture
//! - No dependencies on other Campus crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
