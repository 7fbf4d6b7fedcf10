//! Circuit breaker shared by every request a client issues
//!
//! The breaker counts failures while `CLOSED`, rejects calls while `OPEN`,
//! and after the cooldown lets a single trial through in `HALF_OPEN` whose
//! outcome decides whether the circuit closes again or reopens.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{CommonError, CommonResult};

//==============================================================================
// Time Abstraction for Testability
//==============================================================================

/// Source of monotonic time for the breaker
///
/// Production code uses [`SystemClock`]; tests drive [`MockClock`] so the
/// cooldown can be crossed without sleeping.
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed offset, so a test can keep one handle and
/// hand another to the breaker.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += duration;
        }
    }

    /// Advance the mock clock by milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed = duration;
        }
    }

    /// Get the current elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or(Duration::ZERO)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

//==============================================================================
// State and Configuration
//==============================================================================

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "foundation", derive(serde::Serialize))]
#[cfg_attr(feature = "foundation", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CircuitState {
    /// Circuit is closed, allowing requests
    Closed,
    /// Circuit is open, rejecting requests
    Open,
    /// Cooldown elapsed, a trial request decides the next state
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: u32,
    /// Trial successes needed to close the circuit from half-open
    pub success_threshold: u32,
    /// Cooldown measured from the last failure before a trial is allowed
    pub timeout: Duration,
    /// Trials allowed in flight at once while half-open
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 7,
            success_threshold: 1,
            timeout: Duration::from_secs(30),
            half_open_max_calls: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration builder
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> CommonResult<()> {
        if self.failure_threshold == 0 {
            return Err(CommonError::config_field(
                "failure_threshold",
                "must be greater than 0",
            ));
        }

        if self.success_threshold == 0 {
            return Err(CommonError::config_field(
                "success_threshold",
                "must be greater than 0",
            ));
        }

        if self.half_open_max_calls == 0 {
            return Err(CommonError::config_field(
                "half_open_max_calls",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self { config: CircuitBreakerConfig::default() }
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn success_threshold(mut self, threshold: u32) -> Self {
        self.config.success_threshold = threshold;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn half_open_max_calls(mut self, max_calls: u32) -> Self {
        self.config.half_open_max_calls = max_calls;
        self
    }

    pub fn build(self) -> CommonResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Circuit breaker metrics for monitoring
#[derive(Debug, Clone)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub failure_count: u32,
    pub half_open_calls: u32,
    pub total_successes: u64,
    pub total_failures: u64,
    pub rejected_calls: u64,
    pub last_failure_time: Option<Instant>,
    pub state_change_time: Instant,
}

//==============================================================================
// Breaker Interface
//==============================================================================

/// Narrow interface the request dispatcher talks to
///
/// Clients hold an `Arc<dyn Breaker>` so tests can swap in their own
/// instance without touching process-wide state.
pub trait Breaker: Send + Sync + fmt::Debug {
    /// Whether a request may be dispatched now. May move `OPEN` to
    /// `HALF_OPEN` and claim the trial slot.
    fn can_request(&self) -> bool;

    /// Report a successful outcome
    fn on_success(&self);

    /// Report a failed outcome
    fn on_failure(&self);

    /// Report a request that ended without an outcome worth counting
    /// (rate limited). Frees its `HALF_OPEN` trial slot.
    fn on_neutral(&self);

    /// Current state
    fn state(&self) -> CircuitState;
}

//==============================================================================
// Circuit Breaker
//==============================================================================

/// Thread-safe circuit breaker with a pluggable clock
///
/// Clones share state. Locks are never held across an await point.
pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    state: Arc<RwLock<CircuitState>>,
    failure_count: Arc<AtomicU32>,
    half_open_successes: Arc<AtomicU32>,
    half_open_calls: Arc<AtomicU32>,
    total_successes: Arc<AtomicU64>,
    total_failures: Arc<AtomicU64>,
    rejected_calls: Arc<AtomicU64>,
    last_failure_time: Arc<RwLock<Option<Instant>>>,
    state_change_time: Arc<RwLock<Instant>>,
    clock: Arc<C>,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &self.get_state())
            .field("failure_count", &self.failure_count.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<C: Clock> Clone for CircuitBreaker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            failure_count: Arc::clone(&self.failure_count),
            half_open_successes: Arc::clone(&self.half_open_successes),
            half_open_calls: Arc::clone(&self.half_open_calls),
            total_successes: Arc::clone(&self.total_successes),
            total_failures: Arc::clone(&self.total_failures),
            rejected_calls: Arc::clone(&self.rejected_calls),
            last_failure_time: Arc::clone(&self.last_failure_time),
            state_change_time: Arc::clone(&self.state_change_time),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl CircuitBreaker<SystemClock> {
    /// Create a circuit breaker driven by the system clock
    pub fn new(config: CircuitBreakerConfig) -> CommonResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a circuit breaker with a custom clock (useful for testing)
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> CommonResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(CircuitState::Closed)),
            failure_count: Arc::new(AtomicU32::new(0)),
            half_open_successes: Arc::new(AtomicU32::new(0)),
            half_open_calls: Arc::new(AtomicU32::new(0)),
            total_successes: Arc::new(AtomicU64::new(0)),
            total_failures: Arc::new(AtomicU64::new(0)),
            rejected_calls: Arc::new(AtomicU64::new(0)),
            last_failure_time: Arc::new(RwLock::new(None)),
            state_change_time: Arc::new(RwLock::new(clock.now())),
            clock: Arc::new(clock),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CircuitState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CircuitState> {
        self.state.write().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn mark_failure_time(&self, now: Instant) {
        if let Ok(mut last_failure) = self.last_failure_time.write() {
            *last_failure = Some(now);
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        let last_failure = self.last_failure_time.read().ok().and_then(|guard| *guard);
        match last_failure {
            Some(at) => now.saturating_duration_since(at) >= self.config.timeout,
            None => true,
        }
    }

    /// Switch state under an already held write guard
    fn transition(&self, guard: &mut CircuitState, next: CircuitState, now: Instant) {
        if *guard == next {
            return;
        }
        debug!(from = %*guard, to = %next, "circuit breaker state change");
        *guard = next;
        if let Ok(mut changed) = self.state_change_time.write() {
            *changed = now;
        }
    }

    /// Claim a half-open trial slot if one is free
    fn try_claim_trial(&self) -> bool {
        let max = self.config.half_open_max_calls;
        self.half_open_calls
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |calls| {
                (calls < max).then_some(calls + 1)
            })
            .is_ok()
    }

    /// Take over a trial slot whose request never reported back
    ///
    /// A trial that ends without reporting back (cancelled) would otherwise
    /// hold the slot forever. After another full cooldown the next
    /// caller becomes the trial.
    fn reclaim_stale_trial(&self) -> bool {
        let now = self.clock.now();
        let state = self.write_state();
        if *state != CircuitState::HalfOpen {
            return *state == CircuitState::Closed;
        }
        let Ok(mut changed) = self.state_change_time.write() else {
            return false;
        };
        if now.saturating_duration_since(*changed) < self.config.timeout {
            return false;
        }
        *changed = now;
        self.half_open_calls.store(1, Ordering::Release);
        debug!("Reclaimed stale half-open trial slot");
        true
    }

    /// Check whether a request may proceed
    ///
    /// Once the cooldown since the last failure has elapsed the first caller
    /// moves the circuit to `HALF_OPEN` and takes the trial slot; callers
    /// arriving while the trial is in flight are rejected.
    pub fn can_execute(&self) -> bool {
        let current = *self.read_state();

        let permitted = match current {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => self.try_claim_trial() || self.reclaim_stale_trial(),
            CircuitState::Open => {
                let now = self.clock.now();
                if self.cooldown_elapsed(now) {
                    let mut state = self.write_state();
                    match *state {
                        CircuitState::Open => {
                            self.transition(&mut state, CircuitState::HalfOpen, now);
                            self.half_open_successes.store(0, Ordering::Release);
                            self.half_open_calls.store(1, Ordering::Release);
                            info!("Circuit breaker half-open, allowing trial request");
                            true
                        }
                        CircuitState::HalfOpen => self.try_claim_trial(),
                        CircuitState::Closed => true,
                    }
                } else {
                    false
                }
            }
        };

        if !permitted {
            self.rejected_calls.fetch_add(1, Ordering::Relaxed);
        }
        permitted
    }

    /// Record a successful operation
    pub fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now();
        let mut state = self.write_state();

        match *state {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                let successes = self.half_open_successes.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= self.config.success_threshold {
                    self.failure_count.store(0, Ordering::Release);
                    self.half_open_calls.store(0, Ordering::Release);
                    self.transition(&mut state, CircuitState::Closed, now);
                    info!(successes, "Circuit breaker closed after successful trial");
                } else {
                    self.half_open_calls.fetch_sub(1, Ordering::AcqRel);
                }
            }
            CircuitState::Open => {
                // A request dispatched before the circuit opened came back healthy.
                self.failure_count.store(0, Ordering::Release);
                self.transition(&mut state, CircuitState::Closed, now);
                info!("Circuit breaker closed by late success");
            }
        }
    }

    /// Record a failed operation
    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let failure_count = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
        let now = self.clock.now();
        self.mark_failure_time(now);

        let mut state = self.write_state();
        match *state {
            CircuitState::Closed => {
                if failure_count >= self.config.failure_threshold {
                    self.transition(&mut state, CircuitState::Open, now);
                    warn!(
                        failures = failure_count,
                        threshold = self.config.failure_threshold,
                        "Circuit breaker opened"
                    );
                }
            }
            CircuitState::HalfOpen => {
                self.half_open_calls.store(0, Ordering::Release);
                self.transition(&mut state, CircuitState::Open, now);
                warn!("Circuit breaker reopened after failed trial request");
            }
            CircuitState::Open => {}
        }
    }

    /// Give back a trial slot without recording success or failure
    ///
    /// The next caller may run the trial immediately. No effect outside
    /// `HALF_OPEN`.
    pub fn release_trial(&self) {
        let state = self.read_state();
        if *state != CircuitState::HalfOpen {
            return;
        }
        let released = self
            .half_open_calls
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |calls| calls.checked_sub(1))
            .is_ok();
        if released {
            debug!("Released half-open trial slot without an outcome");
        }
    }

    /// Get the current state of the circuit breaker
    pub fn get_state(&self) -> CircuitState {
        *self.read_state()
    }

    /// Current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Acquire)
    }

    /// Get circuit breaker metrics
    pub fn get_metrics(&self) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            state: self.get_state(),
            failure_count: self.failure_count.load(Ordering::Acquire),
            half_open_calls: self.half_open_calls.load(Ordering::Acquire),
            total_successes: self.total_successes.load(Ordering::Acquire),
            total_failures: self.total_failures.load(Ordering::Acquire),
            rejected_calls: self.rejected_calls.load(Ordering::Acquire),
            last_failure_time: self.last_failure_time.read().ok().and_then(|guard| *guard),
            state_change_time: self
                .state_change_time
                .read()
                .ok()
                .map_or_else(|| self.clock.now(), |guard| *guard),
        }
    }

    /// Reset the circuit breaker to closed state
    pub fn reset(&self) {
        let now = self.clock.now();
        let mut state = self.write_state();
        self.failure_count.store(0, Ordering::Release);
        self.half_open_successes.store(0, Ordering::Release);
        self.half_open_calls.store(0, Ordering::Release);
        if let Ok(mut last_failure) = self.last_failure_time.write() {
            *last_failure = None;
        }
        self.transition(&mut state, CircuitState::Closed, now);
        info!("Circuit breaker manually reset to closed state");
    }
}

impl<C: Clock> Breaker for CircuitBreaker<C> {
    fn can_request(&self) -> bool {
        self.can_execute()
    }

    fn on_success(&self) {
        self.record_success();
    }

    fn on_failure(&self) {
        self.record_failure();
    }

    fn on_neutral(&self) {
        self.release_trial();
    }

    fn state(&self) -> CircuitState {
        self.get_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, timeout: Duration) -> (CircuitBreaker<MockClock>, MockClock) {
        let clock = MockClock::new();
        let config = CircuitBreakerConfig::builder()
            .failure_threshold(threshold)
            .timeout(timeout)
            .build()
            .unwrap();
        (CircuitBreaker::with_clock(config, clock.clone()).unwrap(), clock)
    }

    /// Validates that clones of a mock clock share their elapsed offset.
    ///
    /// Assertions:
    /// - Advancing one handle moves `now()` on the other by the same amount.
    #[test]
    fn test_mock_clock_shared_between_clones() {
        let clock = MockClock::new();
        let other = clock.clone();
        let start = other.now();

        clock.advance(Duration::from_secs(5));
        clock.advance_millis(250);

        assert_eq!(other.now().duration_since(start), Duration::from_millis(5250));
        other.set_elapsed(Duration::ZERO);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    /// Validates the default configuration.
    ///
    /// Assertions:
    /// - Threshold 7, cooldown 30s, one trial call, one success closes.
    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 7);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.half_open_max_calls, 1);
        assert_eq!(config.success_threshold, 1);
        assert!(config.validate().is_ok());
    }

    /// Validates that zero thresholds are rejected.
    ///
    /// Assertions:
    /// - `build()` errors and names the offending field.
    #[test]
    fn test_config_validation_rejects_zero() {
        let err = CircuitBreakerConfig::builder().failure_threshold(0).build().unwrap_err();
        assert!(err.to_string().contains("failure_threshold"));

        let err = CircuitBreakerConfig::builder().half_open_max_calls(0).build().unwrap_err();
        assert!(err.to_string().contains("half_open_max_calls"));
    }

    /// Validates that the circuit opens exactly at the threshold.
    ///
    /// Assertions:
    /// - State stays `Closed` after N-1 failures.
    /// - State is `Open` after N failures and requests are rejected.
    #[test]
    fn test_opens_at_threshold() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitState::Closed);
        assert!(cb.can_execute());

        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitState::Open);
        assert!(!cb.can_execute());
        assert_eq!(cb.get_metrics().rejected_calls, 1);
    }

    /// Validates that a success while closed resets the failure counter.
    ///
    /// Assertions:
    /// - Counter returns to 0 and further failures start over.
    #[test]
    fn test_success_resets_failure_count() {
        let (cb, _clock) = breaker(3, Duration::from_secs(30));

        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitState::Closed);
    }

    /// Validates the cooldown boundary.
    ///
    /// Assertions:
    /// - Rejected just before the cooldown elapses.
    /// - First call after the cooldown is permitted and moves to `HalfOpen`.
    #[test]
    fn test_cooldown_moves_to_half_open() {
        let (cb, clock) = breaker(1, Duration::from_secs(30));
        cb.record_failure();

        clock.advance(Duration::from_millis(29_999));
        assert!(!cb.can_execute());
        assert_eq!(cb.get_state(), CircuitState::Open);

        clock.advance_millis(1);
        assert!(cb.can_execute());
        assert_eq!(cb.get_state(), CircuitState::HalfOpen);
    }

    /// Validates that only one trial is in flight while half-open.
    ///
    /// Assertions:
    /// - A second caller is rejected until the trial reports back.
    #[test]
    fn test_half_open_single_trial() {
        let (cb, clock) = breaker(1, Duration::from_secs(1));
        cb.record_failure();
        clock.advance(Duration::from_secs(1));

        assert!(cb.can_execute());
        assert!(!cb.can_execute());
        assert!(!cb.can_execute());
        assert_eq!(cb.get_metrics().half_open_calls, 1);
    }

    /// Validates that a trial which never reports back is reclaimed.
    ///
    /// Assertions:
    /// - Callers are rejected while the trial is fresh.
    /// - After another cooldown one caller takes over the slot.
    #[test]
    fn test_stale_trial_is_reclaimed() {
        let (cb, clock) = breaker(1, Duration::from_secs(5));
        cb.record_failure();
        clock.advance(Duration::from_secs(5));
        assert!(cb.can_execute());

        clock.advance(Duration::from_secs(4));
        assert!(!cb.can_execute());

        clock.advance(Duration::from_secs(1));
        assert!(cb.can_execute());
        assert!(!cb.can_execute());
        assert_eq!(cb.get_state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.get_state(), CircuitState::Closed);
    }

    /// Validates that a released trial lets the next caller probe at once.
    ///
    /// Assertions:
    /// - After release the next caller gets the slot without a new cooldown.
    /// - Release outside `HALF_OPEN` changes nothing.
    #[test]
    fn test_released_trial_is_available_immediately() {
        let (cb, clock) = breaker(1, Duration::from_secs(5));
        cb.release_trial();
        assert_eq!(cb.get_state(), CircuitState::Closed);

        cb.record_failure();
        clock.advance(Duration::from_secs(5));
        assert!(cb.can_execute());
        assert!(!cb.can_execute());

        cb.release_trial();
        assert_eq!(cb.get_metrics().half_open_calls, 0);
        assert!(cb.can_execute());
        assert!(!cb.can_execute());
        assert_eq!(cb.get_state(), CircuitState::HalfOpen);

        cb.record_success();
        assert_eq!(cb.get_state(), CircuitState::Closed);
    }

    /// Validates that a successful trial closes the circuit.
    ///
    /// Assertions:
    /// - State is `Closed`, counter 0, requests flow again.
    #[test]
    fn test_half_open_success_closes() {
        let (cb, clock) = breaker(2, Duration::from_secs(1));
        cb.record_failure();
        cb.record_failure();
        clock.advance(Duration::from_secs(2));

        assert!(cb.can_execute());
        cb.record_success();

        assert_eq!(cb.get_state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.can_execute());
        assert!(cb.can_execute());
    }

    /// Validates that a failed trial reopens and restarts the cooldown.
    ///
    /// Assertions:
    /// - State is `Open` right after the failed trial.
    /// - Requests stay rejected until a fresh cooldown elapses.
    #[test]
    fn test_half_open_failure_reopens() {
        let (cb, clock) = breaker(5, Duration::from_secs(10));
        for _ in 0..5 {
            cb.record_failure();
        }
        clock.advance(Duration::from_secs(10));
        assert!(cb.can_execute());

        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitState::Open);

        clock.advance(Duration::from_secs(9));
        assert!(!cb.can_execute());
        clock.advance(Duration::from_secs(1));
        assert!(cb.can_execute());
        assert_eq!(cb.get_state(), CircuitState::HalfOpen);
    }

    /// Validates that a success arriving while open closes the circuit.
    ///
    /// Assertions:
    /// - State is `Closed` with a zero counter.
    #[test]
    fn test_late_success_while_open_closes() {
        let (cb, _clock) = breaker(1, Duration::from_secs(30));
        cb.record_failure();
        assert_eq!(cb.get_state(), CircuitState::Open);

        cb.record_success();
        assert_eq!(cb.get_state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    /// Validates manual reset.
    ///
    /// Assertions:
    /// - State is `Closed`, counters and last failure cleared.
    #[test]
    fn test_reset() {
        let (cb, _clock) = breaker(1, Duration::from_secs(30));
        cb.record_failure();
        cb.reset();

        let metrics = cb.get_metrics();
        assert_eq!(metrics.state, CircuitState::Closed);
        assert_eq!(metrics.failure_count, 0);
        assert!(metrics.last_failure_time.is_none());
        assert_eq!(metrics.total_failures, 1);
    }

    /// Validates that clones share state and the trait object delegates.
    ///
    /// Assertions:
    /// - A failure recorded through one handle is visible through the other.
    #[test]
    fn test_clone_shares_state_through_trait() {
        let (cb, _clock) = breaker(1, Duration::from_secs(30));
        let shared: Arc<dyn Breaker> = Arc::new(cb.clone());

        shared.on_failure();
        assert_eq!(cb.get_state(), CircuitState::Open);
        assert!(!shared.can_request());
        assert_eq!(shared.state().to_string(), "OPEN");
    }

    /// Validates the display strings used in logs.
    #[test]
    fn test_state_display() {
        assert_eq!(CircuitState::Closed.to_string(), "CLOSED");
        assert_eq!(CircuitState::HalfOpen.to_string(), "HALF_OPEN");
    }
}
