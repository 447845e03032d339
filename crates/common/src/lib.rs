//! Modular common utilities shared across the Zscaler SDK crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: field-name case translation
//! - `runtime`: response caches, clocks and sleepers
//! - `test-utils`: deterministic clock and recording sleeper

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod case;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod cache;
#[cfg(feature = "runtime")]
pub mod time;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use cache::{create_key, NoOpCache, ResponseCache, TtlCache};
#[cfg(feature = "foundation")]
pub use case::{camel_to_snake, from_wire_case, snake_to_camel, to_wire_case};
#[cfg(feature = "runtime")]
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
