//! On-disk byte format for the log store.
//!
//! Serialization is kept apart from the operational logic in
//! [`crate::log_store`] so the record layout can be read and tested on its own.

pub mod record;

pub use record::{
    encode_record, read_record, write_record, LogRecord, RecordError, MAX_RECORD_LEN,
};
