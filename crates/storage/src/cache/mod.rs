//! In-memory cache policies
//!
//! A cache sits in front of a `ByteStore` and holds decoded string values.
//! Caches never own data: every write is also persisted by the caller, so
//! dropping an entry (by eviction or `clear`) only costs a store read later.
//!
//! - [`PerpetualCache`]: unbounded, never evicts
//! - [`LruCache`]: bounded, evicts the least recently used key

mod lru;
mod perpetual;

pub use self::lru::LruCache;
pub use self::perpetual::PerpetualCache;

/// Common interface of the cache policies.
///
/// `get` takes `&mut self` because a policy may update recency on read.
pub trait Cache: Send {
    /// Look up a cached value
    fn get(&mut self, key: &str) -> Option<String>;

    /// Insert or replace a value
    fn set(&mut self, key: &str, value: String);

    /// Drop a key, returning its cached value
    fn remove(&mut self, key: &str) -> Option<String>;

    /// Drop every entry
    fn clear(&mut self);

    /// Number of cached entries
    fn size(&self) -> usize;
}
