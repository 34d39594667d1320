//! Core types for chatkv
//!
//! This crate defines the vocabulary shared by every other layer:
//! - [`ByteStore`]: the durable `read`/`write` boundary everything persists through
//! - [`FileId`] and [`NodeId`]: namespace and tree-node identifiers
//! - [`keys`]: the key-naming scheme that maps structures onto flat byte keys
//! - [`Error`] and [`Result`]: the error type propagated from the store upward

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keys;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::ByteStore;
pub use types::{FileId, NodeId};
