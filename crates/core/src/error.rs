//! Error types for the storage foundation.
//!
//! Absence is never an error here: reads return `Option` and deletes of
//! missing keys are no-ops. What remains are I/O failures from the byte
//! store and values that cannot be decoded or encoded.

use thiserror::Error;

/// Errors raised by the byte store and the layers built on it.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value does not have the shape its reader expects
    /// (missing node field, unparseable counter, non-UTF-8 bytes)
    #[error("corruption: {0}")]
    Corruption(String),

    /// A value could not be encoded for the store (for example, a log
    /// record over the size limit)
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Generic byte-store failure reported by a backend
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for chatkv core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a corruption error for a value stored under `key`.
    pub fn corrupt_value(key: &str, detail: impl std::fmt::Display) -> Self {
        Error::Corruption(format!("{}: {}", key, detail))
    }

    /// Check if this error came from the I/O layer.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Check if this error indicates a damaged stored value.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}
