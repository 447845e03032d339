//! # Zscaler Domain
//!
//! Pure domain types for the Zscaler SDK request engine.
//!
//! This crate contains:
//! - Client configuration structures (`ZscalerConfig`)
//! - The error taxonomy and `Result` alias
//! - Credentials, request descriptors and raw responses
//! - Service identities and their pagination profiles
//!
//! ## Architecture
//! - No dependencies on other SDK crates
//! - No I/O: everything here is a value type
#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
