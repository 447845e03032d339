//! Sleeper that records instead of waiting

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::time::MockClock;
use crate::time::Sleeper;

/// Records every requested sleep and returns at once
///
/// When built with [`with_clock`](Self::with_clock) each sleep also advances
/// the mock clock, so deadline checks see the time "spent" sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    clock: Option<MockClock>,
}

impl RecordingSleeper {
    /// Sleeper that only records
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeper that also advances `clock` by each sleep
    pub fn with_clock(clock: MockClock) -> Self {
        Self { sleeps: Arc::default(), clock: Some(clock) }
    }

    /// Sleeps requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Number of sleeps requested
    pub fn count(&self) -> usize {
        self.sleeps.lock().len()
    }

    /// Sum of all requested sleeps
    pub fn total(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Clock;

    #[tokio::test]
    async fn test_records_without_waiting() {
        let sleeper = RecordingSleeper::new();
        let started = std::time::Instant::now();

        sleeper.sleep(Duration::from_secs(30)).await;
        sleeper.sleep(Duration::from_secs(5)).await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(sleeper.recorded(), vec![Duration::from_secs(30), Duration::from_secs(5)]);
        assert_eq!(sleeper.count(), 2);
        assert_eq!(sleeper.total(), Duration::from_secs(35));
    }

    #[tokio::test]
    async fn test_advances_shared_clock() {
        let clock = MockClock::new();
        let sleeper = RecordingSleeper::with_clock(clock.clone());
        let start = clock.now();

        sleeper.sleep(Duration::from_secs(7)).await;

        assert_eq!(clock.elapsed_since(start), Duration::from_secs(7));
    }
}
