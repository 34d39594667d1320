//! Ephemeral in-process byte store.

use chatkv_core::{ByteStore, Result};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory `ByteStore`
///
/// Holds everything in a single `FxHashMap` behind a `RwLock`. Data is lost
/// when the store is dropped. Read and write calls are counted so callers
/// can observe how much traffic a cache in front of the store absorbs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<FxHashMap<Vec<u8>, Vec<u8>>>,
    reads: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct keys stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check if no key has been written
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Total `read` calls served
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Total `write` calls served
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl ByteStore for MemoryStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_returns_none() {
        let store = MemoryStore::new();
        assert_eq!(store.read(b"nope").unwrap(), None);
        assert_eq!(store.reads(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_then_read() {
        let store = MemoryStore::new();
        store.write(b"k", b"v1").unwrap();
        store.write(b"k", b"v2").unwrap();
        assert_eq!(store.read(b"k").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn test_keys_match_by_exact_bytes() {
        let store = MemoryStore::new();
        store.write(b"key", b"a").unwrap();
        assert_eq!(store.read(b"key ").unwrap(), None);
        assert_eq!(store.read(b"Key").unwrap(), None);
    }

    #[test]
    fn test_shared_through_arc() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{}-{}", t, i);
                        store.write(key.as_bytes(), b"x").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len(), 400);
    }
}
