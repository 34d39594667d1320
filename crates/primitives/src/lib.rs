//! High-level primitives for chatkv
//!
//! Everything here is built from string keys and values written through a
//! [`FieldStore`]:
//! - [`FieldStore`]: cached raw `get`/`put` plus map entries, counters,
//!   validity flags and integer lists
//! - [`IndexAllocator`]: persistent id allocator with a free stack
//! - [`AvlTree`]: ordered dictionary whose nodes are stored field by field

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocator;
pub mod avl;
pub mod field_store;

pub use allocator::IndexAllocator;
pub use avl::{
    AvlTree, KeyComparator, KeyOrder, Lexicographic, NumericAscending, NumericDescending,
};
pub use field_store::{CacheStats, FieldStore, DEFAULT_CACHE_CLEAR_THRESHOLD};
