//! # chatkv
//!
//! Storage foundation for a chat backend: persistent ordered dictionaries,
//! counters, validity flags and integer lists, all kept as string fields in
//! one flat byte store behind a write-through cache.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chatkv::prelude::*;
//!
//! let db = ChatKv::open("./chat-data")?;
//!
//! // Counters and flags
//! let fields = db.fields();
//! fields.inc_counter(FileId(7), None)?;
//! fields.make_valid(FileId(7), "alice", None)?;
//!
//! // Ordered dictionary: score descending, then name
//! let mut board = db.tree_with_orders(
//!     FileId(3),
//!     &[KeyOrder::Descending, KeyOrder::Lexicographic],
//! );
//! board.insert(&["42", "alice"], "alice")?;
//! let top = board.top_n_descending(10)?;
//!
//! db.close()?;
//! ```
//!
//! ## Layers
//!
//! - [`chatkv_storage`]: byte stores ([`MemoryStore`], [`LogStore`]) and
//!   cache policies
//! - [`chatkv_primitives`]: [`FieldStore`], [`IndexAllocator`], [`AvlTree`]
//! - this crate: [`ChatKv`], configuration and the public error type

#![warn(missing_docs)]

mod config;
mod database;
mod error;

pub mod prelude;

pub use config::{CacheConfig, StoreConfig, CONFIG_FILE_NAME};
pub use database::{ChatKv, ChatKvBuilder};
pub use error::{Error, Result};

pub use chatkv_core::{keys, ByteStore, FileId, NodeId};
pub use chatkv_primitives::{
    AvlTree, CacheStats, FieldStore, IndexAllocator, KeyComparator, KeyOrder, Lexicographic,
    NumericAscending, NumericDescending, DEFAULT_CACHE_CLEAR_THRESHOLD,
};
pub use chatkv_storage::{DurabilityMode, LogStore, MemoryStore, LOG_FILE_NAME, MAX_RECORD_LEN};
