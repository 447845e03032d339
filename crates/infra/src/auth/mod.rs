//! Authentication
//!
//! Every strategy yields a [`Credential`](zscaler_domain::Credential) that
//! knows its own header fragment, so bearer tokens, the legacy ZIA session
//! cookie and the legacy ZCC `auth-token` header all flow through the same
//! [`AuthProvider`] seam.
//!
//! - [`strategy`]: the grant variants and the single `authenticate()` entry
//! - [`oneapi`]: client-secret and private-key JWT exchanges
//! - [`legacy`]: ZPA signin, ZIA session and ZCC login
//! - [`token_provider`]: cached credential with single-flight refresh

pub mod legacy;
pub mod oneapi;
pub mod strategy;
pub mod token_provider;

use async_trait::async_trait;
use zscaler_domain::Result;

pub use strategy::AuthStrategy;
pub use token_provider::TokenProvider;

/// Trait for providing authentication headers
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Headers that authenticate the next request attempt
    ///
    /// Refreshes the underlying credential when it is missing or expiring.
    async fn auth_headers(&self) -> Result<Vec<(String, String)>>;

    /// Drop the current credential so the next call re-authenticates
    async fn invalidate(&self);
}
