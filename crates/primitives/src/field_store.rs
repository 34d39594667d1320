//! FieldStore: cached flat key-value facade
//!
//! ## Design
//!
//! Every structure in chatkv is a set of string fields under deterministic
//! keys (see [`chatkv_core::keys`]). `FieldStore` owns the one path to the
//! byte store that all of them share:
//!
//! - `get` checks the cache, falls through to the store on a miss and
//!   repopulates the cache
//! - `put` persists to the store, then updates the cache (write-through)
//!
//! On top of that raw primitive it offers the small helpers the chat layer
//! builds on: map entries, counters, validity flags and integer lists.
//!
//! ## Cache clear threshold
//!
//! Independently of the cache policy, once the cache holds more than
//! `clear_threshold` entries it is emptied wholesale. This is a coarse guard
//! against unbounded growth with the perpetual policy; it never loses data
//! because every value is already in the store.
//!
//! ## Thread Safety
//!
//! `FieldStore` is `Send + Sync`. The cache lock is held across a miss and
//! its repopulation, and across a write and its cache update, so a reader
//! can never put a stale value back into the cache.

use chatkv_core::keys;
use chatkv_core::{ByteStore, Error, FileId, Result};
use chatkv_storage::{Cache, PerpetualCache};
use parking_lot::Mutex;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Default entry count above which the cache is cleared.
pub const DEFAULT_CACHE_CLEAR_THRESHOLD: usize = 100_000;

const VALID: &str = "1";
const INVALID: &str = "0";
const LIST_DELIMITER: char = ',';

/// Cache effectiveness counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the cache
    pub hits: u64,
    /// Reads that went to the byte store
    pub misses: u64,
    /// Times the whole cache was dropped by the clear threshold
    pub threshold_clears: u64,
    /// Entries currently cached
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of reads served from the cache (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState {
    cache: Box<dyn Cache>,
    hits: u64,
    misses: u64,
    threshold_clears: u64,
}

/// Cached facade over a [`ByteStore`]
pub struct FieldStore {
    store: Arc<dyn ByteStore>,
    state: Mutex<CacheState>,
    clear_threshold: usize,
}

impl FieldStore {
    /// Create a facade with a perpetual cache and the default clear threshold
    pub fn new(store: Arc<dyn ByteStore>) -> Self {
        Self::with_cache(
            store,
            Box::new(PerpetualCache::new()),
            DEFAULT_CACHE_CLEAR_THRESHOLD,
        )
    }

    /// Create a facade with an explicit cache policy and clear threshold
    pub fn with_cache(
        store: Arc<dyn ByteStore>,
        cache: Box<dyn Cache>,
        clear_threshold: usize,
    ) -> Self {
        Self {
            store,
            state: Mutex::new(CacheState {
                cache,
                hits: 0,
                misses: 0,
                threshold_clears: 0,
            }),
            clear_threshold,
        }
    }

    // =========================================================================
    // Raw primitive
    // =========================================================================

    /// Read the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let mut state = self.state.lock();
        if let Some(value) = state.cache.get(key) {
            state.hits += 1;
            return Ok(Some(value));
        }
        state.misses += 1;

        let Some(bytes) = self.store.read(key.as_bytes())? else {
            return Ok(None);
        };
        let value = String::from_utf8(bytes).map_err(|e| Error::corrupt_value(key, e))?;
        state.cache.set(key, value.clone());
        self.enforce_threshold(&mut state);
        Ok(Some(value))
    }

    /// Store `value` under `key`, durably and in the cache.
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock();
        self.store.write(key.as_bytes(), value.as_bytes())?;
        state.cache.set(key, value.to_string());
        self.enforce_threshold(&mut state);
        Ok(())
    }

    /// Read and parse a value, reporting unparseable data as corruption.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(key)? {
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|e| Error::corrupt_value(key, format!("{} ({:?})", e, raw))),
            None => Ok(None),
        }
    }

    /// Push buffered writes in the byte store to durable media.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Drop every cached entry. Stored data is unaffected.
    pub fn clear_cache(&self) {
        self.state.lock().cache.clear();
    }

    /// Snapshot of cache counters
    pub fn cache_stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            threshold_clears: state.threshold_clears,
            entries: state.cache.size(),
        }
    }

    /// Entry count above which the cache is cleared
    pub fn clear_threshold(&self) -> usize {
        self.clear_threshold
    }

    fn enforce_threshold(&self, state: &mut CacheState) {
        let size = state.cache.size();
        if size > self.clear_threshold {
            debug!(
                "Cache holds {} entries (threshold {}), clearing",
                size, self.clear_threshold
            );
            state.cache.clear();
            state.threshold_clears += 1;
        }
    }

    // =========================================================================
    // Map entries
    // =========================================================================

    /// Read a free-form map entry.
    pub fn read_map(&self, key: &str) -> Result<Option<String>> {
        self.get(&keys::map_key(key))
    }

    /// Write a free-form map entry.
    pub fn write_map(&self, key: &str, value: &str) -> Result<()> {
        self.put(&keys::map_key(key), value)
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Current counter value; counters that were never written are 0.
    pub fn get_counter(&self, id: FileId, extra: Option<&str>) -> Result<i64> {
        Ok(self
            .get_parsed::<i64>(&keys::counter_key(id, extra))?
            .unwrap_or(0))
    }

    /// Overwrite a counter.
    pub fn set_counter(&self, id: FileId, extra: Option<&str>, value: i64) -> Result<()> {
        self.put(&keys::counter_key(id, extra), &value.to_string())
    }

    /// Add one to a counter, returning the new value.
    ///
    /// Saturates at `i64::MAX`.
    pub fn inc_counter(&self, id: FileId, extra: Option<&str>) -> Result<i64> {
        self.add_to_counter(id, extra, 1)
    }

    /// Subtract one from a counter, returning the new value.
    ///
    /// Saturates at `i64::MIN`.
    pub fn dec_counter(&self, id: FileId, extra: Option<&str>) -> Result<i64> {
        self.add_to_counter(id, extra, -1)
    }

    fn add_to_counter(&self, id: FileId, extra: Option<&str>, delta: i64) -> Result<i64> {
        let value = self.get_counter(id, extra)?.saturating_add(delta);
        self.set_counter(id, extra, value)?;
        Ok(value)
    }

    // =========================================================================
    // Validity flags
    // =========================================================================

    /// Mark `(id, key, extra)` as valid.
    pub fn make_valid(&self, id: FileId, key: &str, extra: Option<&str>) -> Result<()> {
        self.put(&keys::validator_key(id, key, extra), VALID)
    }

    /// Mark `(id, key, extra)` as not valid.
    pub fn invalidate(&self, id: FileId, key: &str, extra: Option<&str>) -> Result<()> {
        self.put(&keys::validator_key(id, key, extra), INVALID)
    }

    /// Check a validity flag; flags that were never set are not valid.
    pub fn is_valid(&self, id: FileId, key: &str, extra: Option<&str>) -> Result<bool> {
        Ok(self.get(&keys::validator_key(id, key, extra))?.as_deref() == Some(VALID))
    }

    // =========================================================================
    // Integer lists
    // =========================================================================

    /// All values of a list, in insertion order.
    pub fn get_list(&self, id: FileId, key: Option<&str>) -> Result<Vec<i32>> {
        let list_key = keys::list_key(id, key);
        match self.get(&list_key)? {
            Some(raw) => parse_list(&list_key, &raw),
            None => Ok(Vec::new()),
        }
    }

    /// Check list membership.
    pub fn list_contains(&self, id: FileId, key: Option<&str>, value: i32) -> Result<bool> {
        Ok(self.get_list(id, key)?.contains(&value))
    }

    /// Append `value` to a list.
    ///
    /// Returns `false` without writing if the value is already present.
    pub fn add_to_list(&self, id: FileId, key: Option<&str>, value: i32) -> Result<bool> {
        let list_key = keys::list_key(id, key);
        let raw = self.get(&list_key)?.unwrap_or_default();
        if parse_list(&list_key, &raw)?.contains(&value) {
            return Ok(false);
        }

        let updated = if raw.is_empty() {
            value.to_string()
        } else {
            format!("{}{}{}", raw, LIST_DELIMITER, value)
        };
        self.put(&list_key, &updated)?;
        Ok(true)
    }

    /// Remove `value` from a list.
    ///
    /// Returns `false` without writing if the value is not present.
    pub fn remove_from_list(&self, id: FileId, key: Option<&str>, value: i32) -> Result<bool> {
        let list_key = keys::list_key(id, key);
        let mut values = match self.get(&list_key)? {
            Some(raw) => parse_list(&list_key, &raw)?,
            None => return Ok(false),
        };
        let Some(pos) = values.iter().position(|v| *v == value) else {
            return Ok(false);
        };
        values.remove(pos);
        self.put(&list_key, &join_list(&values))?;
        Ok(true)
    }
}

impl std::fmt::Debug for FieldStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldStore")
            .field("clear_threshold", &self.clear_threshold)
            .field("cache", &self.cache_stats())
            .finish()
    }
}

fn parse_list(list_key: &str, raw: &str) -> Result<Vec<i32>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split(LIST_DELIMITER)
        .map(|item| {
            item.parse::<i32>()
                .map_err(|e| Error::corrupt_value(list_key, format!("{} ({:?})", e, item)))
        })
        .collect()
}

fn join_list(values: &[i32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(&LIST_DELIMITER.to_string())
}
