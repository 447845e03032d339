//! Response caches
//!
//! A [`ResponseCache`] stores successful GET responses keyed by the request
//! URL plus its sorted query string. Two implementations share the contract:
//!
//! - [`TtlCache`]: moka-backed store evicting on time-to-live since insert
//!   or time-to-idle since last read, whichever comes first
//! - [`NoOpCache`]: stores nothing, used when caching is disabled
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::time::Duration;
//!
//! use zscaler_common::cache::{ResponseCache, TtlCache};
//!
//! let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(300), Duration::from_secs(300));
//! let key = cache.create_key("https://api.zsapi.net/zia/api/v1/users", &BTreeMap::new());
//! cache.add(&key, "payload".to_string());
//! assert_eq!(cache.get(&key), Some("payload".to_string()));
//! ```

mod noop;
mod ttl;

use std::collections::BTreeMap;

pub use noop::NoOpCache;
pub use ttl::TtlCache;

/// Canonical cache key for a URL and its query parameters
///
/// Parameters are appended in key order and form-encoded, so the same
/// logical request always maps to the same key.
pub fn create_key(url: &str, params: &BTreeMap<String, String>) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(params).finish();
    format!("{url}?{query}")
}

/// Key/value store for cached responses
///
/// Implementations must be safe to share between concurrent requests.
pub trait ResponseCache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Build the key for a request; see [`create_key`]
    fn create_key(&self, url: &str, params: &BTreeMap<String, String>) -> String {
        create_key(url, params)
    }

    /// Check for a live entry without refreshing its idle timer
    fn contains(&self, key: &str) -> bool;

    /// Read a live entry
    fn get(&self, key: &str) -> Option<V>;

    /// Insert or replace an entry
    fn add(&self, key: &str, value: V);

    /// Remove an entry if present
    fn delete(&self, key: &str);

    /// Remove every entry
    fn clear(&self);

    /// `false` for caches that never store anything
    fn is_enabled(&self) -> bool {
        true
    }
}
