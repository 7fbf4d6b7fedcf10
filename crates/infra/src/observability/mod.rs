//! Observability setup
//!
//! The library itself only emits `tracing` events. Binaries call
//! [`init_tracing`] once at startup to install a subscriber.

mod logging;

pub use logging::{build_filter, init_tracing};
