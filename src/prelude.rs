//! Convenient imports for chatkv.
//!
//! ```ignore
//! use chatkv::prelude::*;
//!
//! let db = ChatKv::ephemeral()?;
//! db.fields().inc_counter(FileId(1), None)?;
//! ```

// Main entry point
pub use crate::database::{ChatKv, ChatKvBuilder};

// Error handling
pub use crate::error::{Error, Result};

// Configuration
pub use crate::config::{CacheConfig, StoreConfig};
pub use chatkv_storage::DurabilityMode;

// Primitives
pub use chatkv_primitives::{AvlTree, FieldStore, IndexAllocator, KeyComparator, KeyOrder};

// Core types
pub use chatkv_core::{FileId, NodeId};
