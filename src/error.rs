//! Error type for the public chatkv API.
//!
//! Wraps the layer errors from `chatkv-core` and adds configuration failures.

use thiserror::Error;

/// All chatkv errors.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the byte store or a config file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be interpreted
    #[error("corruption: {0}")]
    Corruption(String),

    /// A value was too large or malformed to encode
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// A tree was opened with key orders that do not fit how it was created
    #[error("key order mismatch: {0}")]
    OrderMismatch(String),

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for chatkv operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if stored data was found to be inconsistent.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }

    /// Check if this is an I/O failure.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Check if a tree was opened with the wrong key orders.
    pub fn is_order_mismatch(&self) -> bool {
        matches!(self, Error::OrderMismatch(_))
    }

    /// Check if this is a configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<chatkv_core::Error> for Error {
    fn from(e: chatkv_core::Error) -> Self {
        use chatkv_core::Error as CoreError;
        match e {
            CoreError::Io(io_err) => Error::Io(io_err),
            CoreError::Corruption(msg) => Error::Corruption(msg),
            CoreError::Serialization(msg) => Error::Serialization(msg),
            CoreError::Storage(msg) => Error::Storage(msg),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
