//! Time abstractions
//!
//! - **Clock**: monotonic and wall-clock time behind a trait so deadlines can
//!   be driven by [`MockClock`](crate::testing::MockClock) in tests
//! - **Sleeper**: async sleeping behind a trait so back-off can be recorded
//!   instead of waited on

mod clock;
mod sleep;

pub use clock::{Clock, SystemClock};
pub use sleep::{Sleeper, TokioSleeper};

// Re-export test doubles next to the traits they implement
pub use crate::testing::{MockClock, RecordingSleeper};
