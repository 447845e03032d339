//! Cache that stores nothing

use super::ResponseCache;

/// Used when response caching is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCache;

impl<V> ResponseCache<V> for NoOpCache
where
    V: Clone + Send + Sync + 'static,
{
    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn add(&self, _key: &str, _value: V) {}

    fn delete(&self, _key: &str) {}

    fn clear(&self) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_never_stores() {
        let cache = NoOpCache;
        ResponseCache::<String>::add(&cache, "k", "v".to_string());

        assert!(!ResponseCache::<String>::contains(&cache, "k"));
        assert_eq!(ResponseCache::<String>::get(&cache, "k"), None);
        assert!(!ResponseCache::<String>::is_enabled(&cache));
    }
}
