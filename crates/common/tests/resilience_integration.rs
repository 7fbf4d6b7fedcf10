//! Integration tests for resilience module
//!
//! Exercises the circuit breaker across threads and tasks and checks the
//! backoff schedule used by the API client.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use campus_common::resilience::{
    Breaker, CircuitBreaker, CircuitBreakerConfig, CircuitState, ExponentialBackoff, MockClock,
};

fn mock_breaker(threshold: u32, timeout: Duration) -> (CircuitBreaker<MockClock>, MockClock) {
    let clock = MockClock::new();
    let config = CircuitBreakerConfig::builder()
        .failure_threshold(threshold)
        .timeout(timeout)
        .build()
        .expect("valid config");
    let breaker = CircuitBreaker::with_clock(config, clock.clone()).expect("valid breaker");
    (breaker, clock)
}

/// Validates that exactly one of many racing callers wins the half-open
/// trial.
///
/// # Test Steps
/// 1. Open the breaker and let the cooldown elapse
/// 2. Race 16 threads on `can_request()`
/// 3. Count permitted callers
#[test]
fn test_half_open_trial_is_exclusive_across_threads() {
    let (breaker, clock) = mock_breaker(1, Duration::from_secs(5));
    breaker.record_failure();
    clock.advance(Duration::from_secs(5));

    let shared: Arc<dyn Breaker> = Arc::new(breaker.clone());
    let permitted = Arc::new(AtomicU32::new(0));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let permitted = Arc::clone(&permitted);
            thread::spawn(move || {
                if shared.can_request() {
                    permitted.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    assert_eq!(permitted.load(Ordering::SeqCst), 1);
    assert_eq!(breaker.get_state(), CircuitState::HalfOpen);
}

/// Validates that failures reported by unrelated tasks open the shared
/// breaker for everyone.
#[tokio::test(flavor = "multi_thread")]
async fn test_failures_from_independent_tasks_open_shared_breaker() {
    let (breaker, _clock) = mock_breaker(5, Duration::from_secs(30));
    let shared: Arc<dyn Breaker> = Arc::new(breaker);

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                assert!(shared.can_request());
                shared.on_failure();
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("task panicked");
    }

    assert_eq!(shared.state(), CircuitState::Open);
    assert!(!shared.can_request());
}

/// Validates a full open, probe, recover cycle through the trait object.
#[test]
fn test_full_recovery_cycle() {
    let (breaker, clock) = mock_breaker(2, Duration::from_millis(500));
    let shared: Arc<dyn Breaker> = Arc::new(breaker.clone());

    shared.on_failure();
    shared.on_failure();
    assert_eq!(shared.state(), CircuitState::Open);

    clock.advance_millis(499);
    assert!(!shared.can_request());

    clock.advance_millis(1);
    assert!(shared.can_request());
    shared.on_failure();
    assert_eq!(shared.state(), CircuitState::Open);

    clock.advance_millis(500);
    assert!(shared.can_request());
    shared.on_success();
    assert_eq!(shared.state(), CircuitState::Closed);

    let metrics = breaker.get_metrics();
    assert_eq!(metrics.failure_count, 0);
    assert_eq!(metrics.total_failures, 3);
    assert_eq!(metrics.total_successes, 1);
    assert!(metrics.rejected_calls >= 1);
}

/// Validates the client's retry schedule stays within its bounds.
#[test]
fn test_backoff_schedule_bounds() {
    let backoff = ExponentialBackoff::default();
    for retry in 1..10 {
        let delay = backoff.delay_for_retry(retry);
        assert!(delay >= Duration::from_millis(500));
        assert!(delay <= Duration::from_millis(2000));
    }
    assert!(backoff.delay_for_retry(2) >= backoff.delay_for_retry(1));
}
