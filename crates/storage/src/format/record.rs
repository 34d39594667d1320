//! Log record format
//!
//! ```text
//! +-------------+---------------+---------+-----------+-------------------------+
//! | key_len u32 | value_len u32 | key     | value     | crc32(key ++ value) u32 |
//! +-------------+---------------+---------+-----------+-------------------------+
//! ```
//!
//! All integers are little-endian. A record is valid only if it is complete
//! and its checksum matches; the first invalid record marks the end of the
//! usable log.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Upper bound on a single key or value, guarding replay against garbage lengths.
pub const MAX_RECORD_LEN: u32 = 64 * 1024 * 1024;

const HEADER_LEN: usize = 8;
const TRAILER_LEN: usize = 4;

/// A decoded key/value record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Record key
    pub key: Vec<u8>,
    /// Record value
    pub value: Vec<u8>,
}

impl LogRecord {
    /// Number of bytes this record occupies on disk.
    pub fn encoded_len(&self) -> u64 {
        (HEADER_LEN + self.key.len() + self.value.len() + TRAILER_LEN) as u64
    }
}

/// Reasons a record could not be decoded
#[derive(Debug, Error)]
pub enum RecordError {
    /// The log ends partway through a record
    #[error("truncated record")]
    Truncated,

    /// The stored checksum does not match the payload
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum found on disk
        stored: u32,
        /// Checksum of the bytes actually read
        computed: u32,
    },

    /// A length prefix exceeds [`MAX_RECORD_LEN`]
    #[error("record length {0} exceeds limit")]
    Oversized(u64),

    /// Underlying read failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn checksum(key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Encode one record into a fresh buffer.
///
/// Fails with [`RecordError::Oversized`] if the key or value is longer than
/// [`MAX_RECORD_LEN`], since replay would refuse to read it back.
pub fn encode_record(key: &[u8], value: &[u8]) -> Result<Vec<u8>, RecordError> {
    for len in [key.len(), value.len()] {
        if len > MAX_RECORD_LEN as usize {
            return Err(RecordError::Oversized(len as u64));
        }
    }

    let mut buf = Vec::with_capacity(HEADER_LEN + key.len() + value.len() + TRAILER_LEN);
    buf.write_u32::<LittleEndian>(key.len() as u32)?;
    buf.write_u32::<LittleEndian>(value.len() as u32)?;
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);
    buf.write_u32::<LittleEndian>(checksum(key, value))?;
    Ok(buf)
}

/// Append one record to `out` with a single `write_all`. Returns the number
/// of bytes written.
pub fn write_record<W: Write>(
    out: &mut W,
    key: &[u8],
    value: &[u8],
) -> Result<u64, RecordError> {
    let buf = encode_record(key, value)?;
    out.write_all(&buf)?;
    Ok(buf.len() as u64)
}

/// Read the next record from `input`.
///
/// Returns `Ok(None)` on a clean end of log (no bytes left).
pub fn read_record<R: Read>(input: &mut R) -> Result<Option<LogRecord>, RecordError> {
    let mut header = [0u8; HEADER_LEN];
    match read_full(input, &mut header)? {
        0 => return Ok(None),
        n if n < HEADER_LEN => return Err(RecordError::Truncated),
        _ => {}
    }

    let mut cursor = &header[..];
    let key_len = cursor.read_u32::<LittleEndian>()?;
    let value_len = cursor.read_u32::<LittleEndian>()?;
    for len in [key_len, value_len] {
        if len > MAX_RECORD_LEN {
            return Err(RecordError::Oversized(u64::from(len)));
        }
    }

    let mut key = vec![0u8; key_len as usize];
    let mut value = vec![0u8; value_len as usize];
    read_exact_or_truncated(input, &mut key)?;
    read_exact_or_truncated(input, &mut value)?;

    let mut trailer = [0u8; TRAILER_LEN];
    read_exact_or_truncated(input, &mut trailer)?;
    let stored = u32::from_le_bytes(trailer);
    let computed = checksum(&key, &value);
    if stored != computed {
        return Err(RecordError::ChecksumMismatch { stored, computed });
    }

    Ok(Some(LogRecord { key, value }))
}

fn read_exact_or_truncated<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<(), RecordError> {
    input.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => RecordError::Truncated,
        _ => RecordError::Io(e),
    })
}

/// Fill `buf` as far as the input allows, returning how many bytes were read.
fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
