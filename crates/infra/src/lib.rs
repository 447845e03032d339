//! # Zscaler Infrastructure
//!
//! The request execution and pagination engine behind the Zscaler SDK.
//!
//! This crate contains:
//! - The reqwest transport and the `Transport` seam
//! - Authentication strategies and the single-flight token provider
//! - Request building, retry/back-off, response normalization
//! - The executor and the pagination walker
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Depends on `zscaler-domain` for types and `zscaler-common` for the
//!   cache, case translation and clocks
//! - Contains all "impure" code (network, files, environment)
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> zscaler_domain::Result<()> {
//! use zscaler_infra::{config, Executor};
//!
//! let config = config::load()?;
//! let executor = Executor::new(config.client)?;
//!
//! let users = executor.get("/zia/api/v1/users", None).await?.all_pages_results().await?;
//! println!("{} users", users.len());
//! # Ok(())
//! # }
//! ```
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiResponse, Executor, ExecutorBuilder, PageLimits, PageWalker};
pub use auth::{AuthProvider, AuthStrategy, TokenProvider};
pub use http::{HttpClient, HttpClientBuilder, Transport};
