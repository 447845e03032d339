use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of the current time
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Monotonic instant, for measuring elapsed time
    fn now(&self) -> Instant;

    /// Wall clock time
    fn system_time(&self) -> SystemTime;

    /// Milliseconds since the UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        let since = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default();
        u64::try_from(since.as_millis()).unwrap_or(u64::MAX)
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future
    fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
        assert!(clock.millis_since_epoch() > 0);
    }
}
