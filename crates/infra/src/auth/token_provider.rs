//! Cached credential with single-flight refresh
//!
//! The provider holds at most one credential. Concurrent callers that find
//! it missing or expiring queue on the same async mutex; the first performs
//! the exchange and the rest re-check and reuse its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zscaler_common::time::{Clock, SystemClock};
use zscaler_domain::constants::TOKEN_REFRESH_SKEW_SECS;
use zscaler_domain::{Credential, GrantType, Result};

use super::{AuthProvider, AuthStrategy};
use crate::http::HttpClient;

/// Caches the credential of one [`AuthStrategy`] and refreshes it before
/// expiry; concurrent callers share a single exchange
pub struct TokenProvider {
    strategy: AuthStrategy,
    http: HttpClient,
    clock: Arc<dyn Clock>,
    refresh_skew_secs: i64,
    credential: Mutex<Option<Credential>>,
    exchanges: AtomicU64,
}

impl TokenProvider {
    /// Provider with the system clock and the default refresh skew
    pub fn new(strategy: AuthStrategy, http: HttpClient) -> Self {
        Self {
            strategy,
            http,
            clock: Arc::new(SystemClock),
            refresh_skew_secs: TOKEN_REFRESH_SKEW_SECS,
            credential: Mutex::new(None),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Clock used for assertion timestamps and ZIA obfuscation
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Refresh credentials this many seconds before they expire
    #[must_use]
    pub fn with_refresh_skew(mut self, secs: i64) -> Self {
        self.refresh_skew_secs = secs;
        self
    }

    /// Grant of the underlying strategy
    pub const fn grant_type(&self) -> GrantType {
        self.strategy.grant_type()
    }

    /// Number of credential exchanges performed so far
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::SeqCst)
    }

    /// Return a valid credential, authenticating when needed
    ///
    /// # Errors
    /// Propagates the strategy's error; the cached slot stays empty so the
    /// next caller tries again.
    pub async fn get_token(&self) -> Result<Credential> {
        let mut slot = self.credential.lock().await;

        if let Some(credential) = slot.as_ref() {
            if !credential.is_expired(self.refresh_skew_secs) {
                return Ok(credential.clone());
            }
            debug!(grant_type = %self.grant_type(), "Credential expiring, refreshing");
        }

        let endpoint = self.strategy.endpoint();
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        match self.strategy.authenticate(&self.http, self.clock.as_ref()).await {
            Ok(credential) => {
                info!(
                    grant_type = %credential.grant_type(),
                    endpoint = %endpoint,
                    expires_at = %credential.expires_at(),
                    "Authenticated"
                );
                *slot = Some(credential.clone());
                Ok(credential)
            }
            Err(err) => {
                warn!(grant_type = %self.grant_type(), endpoint = %endpoint, error = %err, "Authentication failed");
                *slot = None;
                Err(err)
            }
        }
    }

    /// Forget the cached credential
    pub async fn clear(&self) {
        let mut slot = self.credential.lock().await;
        if slot.take().is_some() {
            debug!(grant_type = %self.grant_type(), "Cached credential cleared");
        }
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("strategy", &self.strategy)
            .field("refresh_skew_secs", &self.refresh_skew_secs)
            .field("exchanges", &self.exchange_count())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for TokenProvider {
    async fn auth_headers(&self) -> Result<Vec<(String, String)>> {
        Ok(self.get_token().await?.header_fragment())
    }

    async fn invalidate(&self) {
        self.clear().await;
    }
}
