//! Storage layer for chatkv
//!
//! This crate implements the concrete pieces underneath the primitives:
//! - MemoryStore: ephemeral `ByteStore` backed by a hash map
//! - LogStore: append-only, checksummed, file-backed `ByteStore`
//! - DurabilityMode: fsync policy for the log store
//! - Cache policies: unbounded `PerpetualCache` and bounded `LruCache`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod format;
pub mod log_store;
pub mod memory;
pub mod wal;

pub use cache::{Cache, LruCache, PerpetualCache};
pub use format::MAX_RECORD_LEN;
pub use log_store::{LogStore, LOG_FILE_NAME};
pub use memory::MemoryStore;
pub use wal::DurabilityMode;
