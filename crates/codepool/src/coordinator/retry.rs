use core::time::Duration;

use rand::Rng;

/// Bounded exponential backoff with full jitter.
///
/// Attempt `n` (1-based) that lost its conditional write waits a uniformly
/// random duration in `0..=min(max_delay, base_delay * 2^(n-1))` before the
/// next attempt. After `max_attempts` conflicting attempts the pop gives up
/// with [`PopError::RaceLost`](crate::PopError::RaceLost).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(10), Duration::from_millis(250))
    }
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is raised to at least one, and
    /// `max_delay` to at least `base_delay`.
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Upper bound of the wait after the `attempt`-th conflict.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.base_delay
            .checked_mul(1 << shift)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// A jittered wait after the `attempt`-th conflict.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let ceiling = u64::try_from(self.ceiling(attempt).as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(rand::rng().random_range(0..=ceiling))
    }
}
