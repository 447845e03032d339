//! moka-backed TTL/TTI cache

use std::fmt;
use std::time::Duration;

use moka::sync::Cache;

use super::ResponseCache;

/// In-memory cache with time-to-live and time-to-idle expiry
///
/// Entries expire `ttl` after insertion or `tti` after their last read,
/// whichever comes first. The cache is unbounded in size.
#[derive(Clone)]
pub struct TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<String, V>,
    ttl: Duration,
    tti: Duration,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Cache whose entries expire `ttl` after insertion or `tti` after the
    /// last read, whichever comes first
    ///
    /// # Panics
    /// Panics when `ttl` or `tti` is longer than 1000 years. Callers bound the
    /// configured values before building one.
    pub fn new(ttl: Duration, tti: Duration) -> Self {
        let inner = Cache::builder().time_to_live(ttl).time_to_idle(tti).build();
        tracing::debug!(
            ttl_seconds = ttl.as_secs(),
            tti_seconds = tti.as_secs(),
            "Response cache configured"
        );
        Self { inner, ttl, tti }
    }

    /// Configured time-to-live
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured time-to-idle
    pub const fn tti(&self) -> Duration {
        self.tti
    }

    /// Approximate number of live entries
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    /// `true` when no live entry remains
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> ResponseCache<V> for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<V> {
        let value = self.inner.get(key);
        tracing::trace!(key, hit = value.is_some(), "Response cache lookup");
        value
    }

    fn add(&self, key: &str, value: V) {
        self.inner.insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.inner.invalidate(key);
    }

    fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl<V> fmt::Debug for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("tti", &self.tti)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}
