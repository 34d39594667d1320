use super::Cache;
use rustc_hash::FxHashMap;

/// Unbounded cache with no eviction
///
/// Used directly as the default cache and as the backing map of
/// [`super::LruCache`].
#[derive(Debug, Default, Clone)]
pub struct PerpetualCache {
    entries: FxHashMap<String, String>,
}

impl PerpetualCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if `key` is cached, without touching any recency state
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl Cache for PerpetualCache {
    fn get(&mut self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn size(&self) -> usize {
        self.entries.len()
    }
}
