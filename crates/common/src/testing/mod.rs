//! Testing utilities
//!
//! - **[`time`]**: a [`MockClock`] advanced by hand
//! - **[`sleep`]**: a [`RecordingSleeper`] that records requested sleeps and
//!   returns immediately
//!
//! ```
//! use std::time::Duration;
//!
//! use zscaler_common::testing::MockClock;
//! use zscaler_common::time::Clock;
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(3));
//! assert_eq!(clock.elapsed_since(start), Duration::from_secs(3));
//! ```

pub mod sleep;
pub mod time;

pub use sleep::RecordingSleeper;
pub use time::MockClock;
