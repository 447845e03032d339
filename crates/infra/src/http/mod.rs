//! HTTP transport
//!
//! [`Transport`] is the seam between the retry controller and the network:
//! one call is one HTTP exchange, with no retries and no interpretation of
//! the status code.

pub mod client;

use async_trait::async_trait;
use zscaler_domain::{RawResponse, RequestDescriptor, Result};

pub use client::{HttpClient, HttpClientBuilder};

/// Executes a single HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send the request and return whatever the server answered
    ///
    /// # Errors
    /// Returns `ZscalerError::Transport` when no response was received.
    async fn send(&self, request: &RequestDescriptor) -> Result<RawResponse>;
}
