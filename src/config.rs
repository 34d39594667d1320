//! Database configuration.
//!
//! A [`StoreConfig`] can come from three places, later ones winning:
//!
//! 1. `chatkv.toml` in the database directory, if present
//! 2. [`ChatKvBuilder::config`](crate::ChatKvBuilder::config)
//! 3. individual builder setters such as [`lru`](crate::ChatKvBuilder::lru)
//!
//! ```toml
//! cache_clear_threshold = 50000
//!
//! [cache]
//! policy = "lru"
//! capacity = 4096
//!
//! [durability]
//! mode = "batched"
//! batch_size = 128
//! ```

use crate::error::{Error, Result};
use chatkv_primitives::DEFAULT_CACHE_CLEAR_THRESHOLD;
use chatkv_storage::{Cache, DurabilityMode, LruCache, PerpetualCache};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the optional config file inside a database directory.
pub const CONFIG_FILE_NAME: &str = "chatkv.toml";

/// Read-cache policy of the field store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CacheConfig {
    /// Keep every entry until the global clear threshold is crossed
    Perpetual,
    /// Keep at most `capacity` entries, evicting the least recently used
    Lru {
        /// Maximum number of cached entries
        capacity: usize,
    },
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig::Perpetual
    }
}

impl CacheConfig {
    pub(crate) fn build(&self) -> Result<Box<dyn Cache>> {
        match *self {
            CacheConfig::Perpetual => Ok(Box::new(PerpetualCache::new())),
            CacheConfig::Lru { capacity: 0 } => {
                Err(Error::Config("LRU cache capacity must be at least 1".into()))
            }
            CacheConfig::Lru { capacity } => Ok(Box::new(LruCache::new(capacity))),
        }
    }
}

/// Settings for opening a database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Cache policy
    pub cache: CacheConfig,
    /// Entry count at which the whole cache is dropped
    pub cache_clear_threshold: usize,
    /// fsync policy of the on-disk log; ignored for ephemeral databases
    pub durability: DurabilityMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            cache_clear_threshold: DEFAULT_CACHE_CLEAR_THRESHOLD,
            durability: DurabilityMode::default(),
        }
    }
}

impl StoreConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: StoreConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Load `chatkv.toml` from `dir`, or `None` if the file does not exist.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::from_toml_file(&path).map(Some)
    }

    /// Reject settings that cannot be opened.
    pub fn validate(&self) -> Result<()> {
        if let CacheConfig::Lru { capacity: 0 } = self.cache {
            return Err(Error::Config("LRU cache capacity must be at least 1".into()));
        }
        if self.cache_clear_threshold == 0 {
            return Err(Error::Config(
                "cache_clear_threshold must be at least 1".into(),
            ));
        }
        if let DurabilityMode::Batched { batch_size: 0 } = self.durability {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }
}
