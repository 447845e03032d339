//! Deterministic clock for tests

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;

use crate::time::Clock;

/// Clock that only moves when told to
///
/// Clones share the same elapsed time, so a clone handed to the code under
/// test observes every [`advance`](Self::advance) made by the test.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    base_system_time: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Clock at elapsed zero, anchored to the current system time
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            base_system_time: SystemTime::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Jump to an absolute elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock() = duration;
    }

    /// Time advanced so far
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
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

    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::time.
    use super::*;

    /// Validates `MockClock::new` behavior for the mock clock advance scenario.
    ///
    /// Assertions:
    /// - Confirms `after.duration_since(start)` equals
    ///   `Duration::from_secs(5)`.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let start = clock.now();

        clock.advance(Duration::from_secs(5));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
        assert_eq!(clock.elapsed_since(start), Duration::from_secs(5));
    }

    #[test]
    fn test_clones_share_time() {
        let clock = MockClock::new();
        let shared = clock.clone();

        clock.set_elapsed(Duration::from_secs(20));

        assert_eq!(shared.elapsed(), Duration::from_secs(20));
    }
}
