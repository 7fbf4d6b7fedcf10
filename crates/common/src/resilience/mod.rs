//! Resilience patterns for fault tolerance
//!
//! - **Circuit Breaker**: stops calling a failing backend once a failure
//!   pattern is detected, then probes recovery with a single trial request
//! - **Backoff**: capped exponential delays between retry attempts
//!
//! Both are generic over the caller; the HTTP client in `campus-infra`
//! drives them from its dispatch loop.

pub mod backoff;
pub mod circuit_breaker;

pub use backoff::ExponentialBackoff;
pub use circuit_breaker::{
    Breaker, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder,
    CircuitBreakerMetrics, CircuitState, Clock, MockClock, SystemClock,
};
