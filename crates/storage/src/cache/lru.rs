use super::{Cache, PerpetualCache};
use tracing::trace;

/// Bounded least-recently-used cache
///
/// Values live in a [`PerpetualCache`]; a separate recency list decides which
/// key to evict. Both `get` and `set` mark a key as most recently used, so
/// eviction order follows access, not insertion.
///
/// # Panics
///
/// [`LruCache::new`] panics if `capacity` is zero.
pub struct LruCache {
    backing: PerpetualCache,
    recency: ::lru::LruCache<String, ()>,
    capacity: usize,
    evictions: u64,
}

impl LruCache {
    /// Create a cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LRU capacity must be greater than zero");
        Self {
            backing: PerpetualCache::new(),
            recency: ::lru::LruCache::unbounded(),
            capacity,
            evictions: 0,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries evicted since creation
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Check residency without promoting the key
    pub fn contains(&self, key: &str) -> bool {
        self.backing.contains(key)
    }

    fn evict_one(&mut self) -> bool {
        let Some((victim, ())) = self.recency.pop_lru() else {
            return false;
        };
        trace!("LRU evicting {}", victim);
        self.backing.remove(&victim);
        self.evictions += 1;
        true
    }
}

impl Cache for LruCache {
    fn get(&mut self, key: &str) -> Option<String> {
        let value = self.backing.get(key)?;
        self.recency.promote(key);
        Some(value)
    }

    fn set(&mut self, key: &str, value: String) {
        if !self.backing.contains(key) {
            while self.backing.size() >= self.capacity && self.evict_one() {}
        }
        self.backing.set(key, value);
        self.recency.put(key.to_string(), ());
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.recency.pop(key);
        self.backing.remove(key)
    }

    fn clear(&mut self) {
        self.recency.clear();
        self.backing.clear();
    }

    fn size(&self) -> usize {
        self.backing.size()
    }
}

impl std::fmt::Debug for LruCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
            .field("size", &self.size())
            .field("capacity", &self.capacity)
            .field("evictions", &self.evictions)
            .finish()
    }
}
