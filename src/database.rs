//! Main database entry point for chatkv.
//!
//! [`ChatKv`] owns one byte store and the cached [`FieldStore`] over it, and
//! hands out trees and allocators bound to namespaces of that store.

use crate::config::{CacheConfig, StoreConfig};
use crate::error::{Error, Result};
use chatkv_core::{keys, ByteStore, FileId};
use chatkv_primitives::{AvlTree, CacheStats, FieldStore, IndexAllocator, KeyComparator, KeyOrder};
use chatkv_storage::{DurabilityMode, LogStore, MemoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

enum Backend {
    Memory(Arc<MemoryStore>),
    Log(Arc<LogStore>),
}

/// A chatkv database.
///
/// # Example
///
/// ```ignore
/// use chatkv::prelude::*;
///
/// let db = ChatKv::open("./chat-data")?;
/// db.fields().inc_counter(FileId(7), None)?;
///
/// let mut board = db.tree_with_orders(FileId(3), &[KeyOrder::Descending, KeyOrder::Lexicographic]);
/// board.insert(&["42", "alice"], "alice")?;
/// let leaders = board.top_n_descending(10)?;
/// ```
pub struct ChatKv {
    backend: Backend,
    fields: Arc<FieldStore>,
    config: StoreConfig,
}

impl ChatKv {
    /// Open a database in `path`, creating the directory if needed.
    ///
    /// Reads `chatkv.toml` from the directory when it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create an in-memory database. Nothing touches disk and all data is
    /// lost on drop.
    pub fn ephemeral() -> Result<Self> {
        Self::builder().ephemeral().open()
    }

    /// Create a builder for database configuration.
    pub fn builder() -> ChatKvBuilder {
        ChatKvBuilder::new()
    }

    /// The cached field store shared by everything opened from this handle
    pub fn fields(&self) -> Arc<FieldStore> {
        self.fields.clone()
    }

    /// Open the ordered dictionary stored under `ns`.
    ///
    /// The same namespace must always be opened with the same comparators.
    pub fn tree(&self, ns: FileId, comparators: Vec<Box<dyn KeyComparator>>) -> AvlTree {
        AvlTree::new(self.fields.clone(), ns, comparators)
    }

    /// Open the ordered dictionary stored under `ns` with named orders.
    pub fn tree_with_orders(&self, ns: FileId, orders: &[KeyOrder]) -> AvlTree {
        AvlTree::with_orders(self.fields.clone(), ns, orders)
    }

    /// Key orders recorded for the tree under `ns` by [`ChatKv::open_tree`].
    pub fn recorded_orders(&self, ns: FileId) -> Result<Option<Vec<KeyOrder>>> {
        let key = keys::tree_orders_key(ns);
        match self.fields.get(&key)? {
            Some(raw) => KeyOrder::parse_list(&raw)
                .map(Some)
                .map_err(|e| Error::Corruption(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Open the tree under `ns`, checking `orders` against the orders it was
    /// created with.
    ///
    /// The first call for a namespace records `orders`; later calls with a
    /// different list fail with [`Error::OrderMismatch`].
    pub fn open_tree(&self, ns: FileId, orders: &[KeyOrder]) -> Result<AvlTree> {
        if orders.is_empty() {
            return Err(Error::OrderMismatch(format!(
                "tree {} needs at least one key order",
                ns
            )));
        }
        match self.recorded_orders(ns)? {
            Some(recorded) if recorded != orders => {
                return Err(Error::OrderMismatch(format!(
                    "tree {} was created with {}, not {}",
                    ns,
                    join_orders(&recorded),
                    join_orders(orders)
                )));
            }
            Some(_) => {}
            None => {
                self.fields
                    .put(&keys::tree_orders_key(ns), &join_orders(orders))?;
                debug!("Recorded key orders {} for tree {}", join_orders(orders), ns);
            }
        }
        Ok(self.tree_with_orders(ns, orders))
    }

    /// Open the id allocator of namespace `ns`.
    pub fn allocator(&self, ns: FileId) -> IndexAllocator {
        IndexAllocator::new(self.fields.clone(), ns)
    }

    /// Settings the database was opened with
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Directory of an on-disk database; `None` when ephemeral
    pub fn path(&self) -> Option<&Path> {
        match &self.backend {
            Backend::Memory(_) => None,
            Backend::Log(log) => log.path().parent(),
        }
    }

    /// Check if this database has no disk backing.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }

    /// Durability mode of the log; `None` when ephemeral
    pub fn durability_mode(&self) -> Option<DurabilityMode> {
        match &self.backend {
            Backend::Memory(_) => None,
            Backend::Log(log) => Some(log.durability_mode()),
        }
    }

    /// Number of distinct keys in the byte store.
    pub fn key_count(&self) -> usize {
        match &self.backend {
            Backend::Memory(store) => store.len(),
            Backend::Log(log) => log.len(),
        }
    }

    /// Cache hit and miss counters
    pub fn cache_stats(&self) -> CacheStats {
        self.fields.cache_stats()
    }

    /// fsync any writes the durability mode has not synced yet.
    pub fn flush(&self) -> Result<()> {
        self.fields.flush().map_err(Into::into)
    }

    /// Rewrite the log keeping only live values. Returns the bytes reclaimed;
    /// always 0 for an ephemeral database.
    pub fn compact(&self) -> Result<u64> {
        match &self.backend {
            Backend::Memory(_) => Ok(0),
            Backend::Log(log) => {
                let reclaimed = log.compact()?;
                info!("Compacted {} ({} bytes reclaimed)", log.path().display(), reclaimed);
                Ok(reclaimed)
            }
        }
    }

    /// Flush and release the database.
    pub fn close(self) -> Result<()> {
        self.flush()
    }
}

impl std::fmt::Debug for ChatKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatKv")
            .field("path", &self.path())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for database configuration.
///
/// # Example
///
/// ```ignore
/// // Disk-backed, bounded cache, fsync on every write
/// let db = ChatKv::builder()
///     .path("./chat-data")
///     .lru(10_000)
///     .durability(DurabilityMode::Strict)
///     .open()?;
///
/// // Tests: nothing on disk
/// let db = ChatKv::builder().ephemeral().open()?;
/// ```
#[derive(Debug, Default)]
pub struct ChatKvBuilder {
    path: Option<PathBuf>,
    ephemeral: bool,
    config: Option<StoreConfig>,
    cache: Option<CacheConfig>,
    cache_clear_threshold: Option<usize>,
    durability: Option<DurabilityMode>,
}

impl ChatKvBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database directory.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep everything in memory. Any path is ignored.
    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    /// Replace the settings read from `chatkv.toml`.
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use an LRU cache holding at most `capacity` entries.
    pub fn lru(mut self, capacity: usize) -> Self {
        self.cache = Some(CacheConfig::Lru { capacity });
        self
    }

    /// Use the unbounded cache.
    pub fn perpetual_cache(mut self) -> Self {
        self.cache = Some(CacheConfig::Perpetual);
        self
    }

    /// Drop the whole cache once it grows past `threshold` entries.
    pub fn cache_clear_threshold(mut self, threshold: usize) -> Self {
        self.cache_clear_threshold = Some(threshold);
        self
    }

    /// Set the log fsync policy.
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = Some(mode);
        self
    }

    /// Open the database.
    pub fn open(self) -> Result<ChatKv> {
        let dir = match (&self.path, self.ephemeral) {
            (_, true) => None,
            (Some(path), false) => Some(path.clone()),
            (None, false) => {
                return Err(Error::Config(
                    "no database path set; call .path() or .ephemeral()".into(),
                ))
            }
        };

        let file_config = match &dir {
            Some(dir) => StoreConfig::load_from_dir(dir)?,
            None => None,
        };
        let mut config = self.config.or(file_config).unwrap_or_default();
        if let Some(cache) = self.cache {
            config.cache = cache;
        }
        if let Some(threshold) = self.cache_clear_threshold {
            config.cache_clear_threshold = threshold;
        }
        if let Some(mode) = self.durability {
            config.durability = mode;
        }
        config.validate()?;

        let (backend, store): (Backend, Arc<dyn ByteStore>) = match dir {
            None => {
                let store = Arc::new(MemoryStore::new());
                (Backend::Memory(store.clone()), store as Arc<dyn ByteStore>)
            }
            Some(dir) => {
                let store = Arc::new(LogStore::open(&dir, config.durability)?);
                (Backend::Log(store.clone()), store as Arc<dyn ByteStore>)
            }
        };

        let fields = Arc::new(FieldStore::with_cache(
            store,
            config.cache.build()?,
            config.cache_clear_threshold,
        ));
        info!(
            "Opened chatkv database ({}, cache {:?}, clear threshold {})",
            if matches!(backend, Backend::Memory(_)) { "ephemeral" } else { "on disk" },
            config.cache,
            config.cache_clear_threshold
        );

        Ok(ChatKv {
            backend,
            fields,
            config,
        })
    }
}

fn join_orders(orders: &[KeyOrder]) -> String {
    orders
        .iter()
        .map(KeyOrder::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;
    use tempfile::TempDir;

    #[test]
    fn test_ephemeral_has_no_path() {
        let db = ChatKv::ephemeral().unwrap();
        assert!(db.is_ephemeral());
        assert!(db.path().is_none());
        assert!(db.durability_mode().is_none());
        assert_eq!(db.compact().unwrap(), 0);
    }

    #[test]
    fn test_open_without_path_fails() {
        let err = ChatKv::builder().open().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_builder_overrides_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "cache_clear_threshold = 10\n[cache]\npolicy = \"lru\"\ncapacity = 3\n",
        )
        .unwrap();

        let db = ChatKv::builder()
            .path(dir.path())
            .cache_clear_threshold(20)
            .durability(DurabilityMode::None)
            .open()
            .unwrap();
        assert_eq!(db.config().cache, CacheConfig::Lru { capacity: 3 });
        assert_eq!(db.config().cache_clear_threshold, 20);
        assert_eq!(db.durability_mode(), Some(DurabilityMode::None));
        assert_eq!(db.path(), Some(dir.path()));
    }

    #[test]
    fn test_invalid_lru_capacity_is_config_error() {
        let err = ChatKv::builder().ephemeral().lru(0).open().unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_namespaces_share_one_store() {
        let db = ChatKv::ephemeral().unwrap();
        let mut tree = db.tree_with_orders(FileId(1), &[KeyOrder::Lexicographic]);
        tree.insert(&["k"], "v").unwrap();
        db.fields().inc_counter(FileId(1), None).unwrap();

        assert_eq!(db.allocator(FileId(1)).high_water_mark().unwrap(), 1);
        assert_eq!(db.allocator(FileId(2)).high_water_mark().unwrap(), 0);
        assert!(db.key_count() > 0);
    }

    #[test]
    fn test_compact_reclaims_overwrites() {
        let dir = TempDir::new().unwrap();
        let db = ChatKv::open(dir.path()).unwrap();
        for i in 0..50 {
            db.fields().set_counter(FileId(1), None, i).unwrap();
        }
        assert!(db.compact().unwrap() > 0);
        assert_eq!(db.fields().get_counter(FileId(1), None).unwrap(), 49);
    }

    #[test]
    fn test_open_tree_records_orders() {
        let db = ChatKv::ephemeral().unwrap();
        let ns = FileId(5);
        assert_eq!(db.recorded_orders(ns).unwrap(), None);

        let mut tree = db.open_tree(ns, &[KeyOrder::Ascending]).unwrap();
        tree.insert(&["10"], "x").unwrap();
        assert_eq!(
            db.recorded_orders(ns).unwrap(),
            Some(vec![KeyOrder::Ascending])
        );

        let mut again = db.open_tree(ns, &[KeyOrder::Ascending]).unwrap();
        again.insert(&["9"], "y").unwrap();
        assert_eq!(again.top_n_descending(2).unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_open_tree_rejects_other_orders() {
        let db = ChatKv::ephemeral().unwrap();
        db.open_tree(FileId(5), &[KeyOrder::Ascending]).unwrap();

        let err = db
            .open_tree(FileId(5), &[KeyOrder::Lexicographic])
            .unwrap_err();
        assert!(err.is_order_mismatch());
        assert!(err.to_string().contains("created with asc, not lex"));

        let err = db
            .open_tree(FileId(5), &[KeyOrder::Ascending, KeyOrder::Lexicographic])
            .unwrap_err();
        assert!(err.is_order_mismatch());
        assert!(db.open_tree(FileId(6), &[]).unwrap_err().is_order_mismatch());
    }
}
