//! Time utilities and constants for convrelay.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Fixed configuration constants.
pub mod constants {
    use super::Duration;

    /// Currency every conversion is pivoted through.
    pub const PIVOT_CURRENCY: &str = "USD";

    /// Domestic currency quoted by the bank overlay.
    pub const DOMESTIC_CURRENCY: &str = "UAH";

    /// How long a fetched rate table stays fresh (6 hours).
    pub fn rate_cache_ttl() -> Duration {
        Duration::from_secs(6 * 60 * 60)
    }

    /// Client-side timeout for remote rate requests (10 seconds).
    pub fn fetch_timeout() -> Duration {
        Duration::from_secs(10)
    }

    /// How long a bank quote snapshot is reused (5 minutes).
    pub fn bank_quote_ttl() -> Duration {
        Duration::from_secs(5 * 60)
    }
}

/// Source of monotonic time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// Get the default shared clock.
pub fn system_clock() -> SharedClock {
    Arc::new(MonotonicClock)
}

/// Check whether something recorded at `recorded_at` is still within `ttl`.
pub fn is_fresh(recorded_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.saturating_duration_since(recorded_at) < ttl
}

/// Manually advanced clock for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: parking_lot::Mutex<Duration>,
}

#[cfg(any(test, feature = "test-utils"))]
impl ManualClock {
    /// Create a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: parking_lot::Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_fresh() {
        let start = Instant::now();
        let ttl = Duration::from_secs(10);

        assert!(is_fresh(start, start, ttl));
        assert!(is_fresh(start, start + Duration::from_secs(9), ttl));
        // Boundary is stale
        assert!(!is_fresh(start, start + ttl, ttl));
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        let t0 = clock.now();

        clock.advance(Duration::from_secs(60));

        assert_eq!(clock.now() - t0, Duration::from_secs(60));
    }

    #[test]
    fn test_constants() {
        assert_eq!(constants::rate_cache_ttl(), Duration::from_secs(21_600));
        assert_eq!(constants::fetch_timeout(), Duration::from_secs(10));
        assert_eq!(constants::PIVOT_CURRENCY, "USD");
    }
}
