//! Capped exponential backoff between retry attempts

use std::time::Duration;

/// Exponential backoff: `initial * 2^(retry - 1)`, capped at `max`
///
/// Retries are numbered from 1; the first attempt of a request never waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self { initial: Duration::from_millis(500), max: Duration::from_millis(2000) }
    }
}

impl ExponentialBackoff {
    /// Create a backoff; `max` is raised to `initial` if smaller
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { initial, max: max.max(initial) }
    }

    /// Delay before the first retry
    pub fn initial(&self) -> Duration {
        self.initial
    }

    /// Upper bound of any delay
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Delay before retry number `retry` (1-based). Zero for `retry == 0`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(retry - 1).unwrap_or(u32::MAX);
        self.initial.saturating_mul(factor).min(self.max)
    }
}
