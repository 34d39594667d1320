//! The durable byte-store boundary.

use crate::error::Result;

/// A durable, content-addressed byte store.
///
/// This is the only true external interface of the engine. Keys are matched
/// by exact byte equality; there are no range scans, deletes or transactions.
/// Every structure in chatkv is ultimately a set of `write` calls against
/// one of these.
///
/// Implementations take `&self` and synchronize internally so that a single
/// store can be shared behind an `Arc`.
pub trait ByteStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if it was never written.
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Push buffered writes to durable media.
    ///
    /// Stores that persist synchronously keep the default no-op.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<T: ByteStore + ?Sized> ByteStore for std::sync::Arc<T> {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).write(key, value)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}
