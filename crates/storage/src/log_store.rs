//! File-backed append-only byte store
//!
//! ## Layout
//!
//! A store is a directory holding one log file, [`LOG_FILE_NAME`]. Every
//! `write` appends a checksummed record (see [`crate::format::record`]); the
//! newest record for a key wins. An in-memory index maps each key to its
//! latest value so reads never touch the disk.
//!
//! ## Recovery
//!
//! `open` replays the log from the start. Replay stops at the first record
//! that is truncated or fails its checksum, and the file is cut back to the
//! end of the last good record so later appends start from a clean tail.
//!
//! A failed append is rolled back: the file is cut back to the end of the
//! last acknowledged record and the write buffer is dropped, so a later
//! append never lands behind a partial record.
//!
//! ## Compaction
//!
//! The log only grows. [`LogStore::compact`] rewrites one record per live key
//! into a side file, fsyncs it, renames it over the log and fsyncs the
//! directory so the rename itself is durable.

use crate::format::{encode_record, read_record, write_record, RecordError};
use crate::wal::DurabilityMode;
use chatkv_core::{ByteStore, Error, Result};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the log file inside the store directory.
pub const LOG_FILE_NAME: &str = "data.log";

const COMPACT_SUFFIX: &str = "compact";

/// Outcome of replaying a log file
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records applied to the index
    pub records: u64,
    /// Bytes of valid log
    pub valid_bytes: u64,
    /// Bytes discarded from a damaged tail
    pub discarded_bytes: u64,
}

struct LogInner {
    writer: BufWriter<File>,
    index: FxHashMap<Vec<u8>, Vec<u8>>,
    log_bytes: u64,
    unsynced: usize,
}

impl LogInner {
    /// Write and flush one encoded record. Returns whether it was fsynced.
    fn append(&mut self, record: &[u8], mode: DurabilityMode) -> std::io::Result<bool> {
        self.writer.write_all(record)?;
        self.writer.flush()?;
        let sync = mode.should_sync(self.unsynced + 1);
        if sync {
            self.writer.get_ref().sync_data()?;
        }
        Ok(sync)
    }

    /// Drop buffered bytes and cut the file back to `log_bytes`.
    fn discard_partial(&mut self, path: &Path) -> Result<()> {
        let file = OpenOptions::new().append(true).open(path)?;
        let stale = std::mem::replace(&mut self.writer, BufWriter::new(file));
        let (_, _unwritten) = stale.into_parts();
        self.writer.get_ref().set_len(self.log_bytes)?;
        Ok(())
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Io(e) => Error::Io(e),
            other => Error::Serialization(other.to_string()),
        }
    }
}

/// Durable `ByteStore` backed by an append-only log file
///
/// # Thread Safety
///
/// All operations take `&self`; the file handle and index live behind a
/// single `Mutex`, so a store can be shared through an `Arc`.
pub struct LogStore {
    path: PathBuf,
    mode: DurabilityMode,
    replay: ReplayStats,
    inner: Mutex<LogInner>,
}

impl LogStore {
    /// Open (or create) a store in `dir`, replaying any existing log.
    pub fn open(dir: impl AsRef<Path>, mode: DurabilityMode) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);

        let (index, replay) = Self::replay(&path)?;
        if replay.discarded_bytes > 0 {
            warn!(
                "Discarding {} damaged bytes at the tail of {}",
                replay.discarded_bytes,
                path.display()
            );
            let file = OpenOptions::new().write(true).open(&path)?;
            file.set_len(replay.valid_bytes)?;
            file.sync_all()?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(
            "Opened log store at {} ({} records, {} live keys, {})",
            path.display(),
            replay.records,
            index.len(),
            mode.description()
        );

        Ok(Self {
            path,
            mode,
            inner: Mutex::new(LogInner {
                writer: BufWriter::new(file),
                index,
                log_bytes: replay.valid_bytes,
                unsynced: 0,
            }),
            replay,
        })
    }

    fn replay(path: &Path) -> Result<(FxHashMap<Vec<u8>, Vec<u8>>, ReplayStats)> {
        let mut index = FxHashMap::default();
        let mut stats = ReplayStats::default();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No log file at {}, starting empty", path.display());
                return Ok((index, stats));
            }
            Err(e) => return Err(e.into()),
        };
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        loop {
            match read_record(&mut reader) {
                Ok(Some(record)) => {
                    stats.records += 1;
                    stats.valid_bytes += record.encoded_len();
                    index.insert(record.key, record.value);
                }
                Ok(None) => break,
                Err(RecordError::Io(e)) => return Err(Error::Io(e)),
                Err(e) => {
                    warn!(
                        "Log replay stopped at offset {}: {}",
                        stats.valid_bytes, e
                    );
                    break;
                }
            }
        }

        stats.discarded_bytes = file_len.saturating_sub(stats.valid_bytes);
        Ok((index, stats))
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured durability mode
    pub fn durability_mode(&self) -> DurabilityMode {
        self.mode
    }

    /// What the last `open` found on disk
    pub fn replay_stats(&self) -> &ReplayStats {
        &self.replay
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    /// Check if no key has been written
    pub fn is_empty(&self) -> bool {
        self.inner.lock().index.is_empty()
    }

    /// Current size of the log in bytes, including superseded records
    pub fn log_bytes(&self) -> u64 {
        self.inner.lock().log_bytes
    }

    /// Rewrite the log so it holds exactly one record per live key.
    ///
    /// Returns the number of bytes reclaimed.
    pub fn compact(&self) -> Result<u64> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        let mut side = self.path.clone().into_os_string();
        side.push(".");
        side.push(COMPACT_SUFFIX);
        let side = PathBuf::from(side);

        let mut out = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&side)?,
        );
        let mut written = 0u64;
        for (key, value) in inner.index.iter() {
            written += write_record(&mut out, key, value)?;
        }
        out.flush()?;
        out.get_ref().sync_all()?;
        drop(out);

        fs::rename(&side, &self.path)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            File::open(dir)?.sync_all()?;
        }
        let file = OpenOptions::new().append(true).open(&self.path)?;
        inner.writer = BufWriter::new(file);
        inner.unsynced = 0;

        let reclaimed = inner.log_bytes.saturating_sub(written);
        inner.log_bytes = written;
        info!(
            "Compacted {}: {} live keys, reclaimed {} bytes",
            self.path.display(),
            inner.index.len(),
            reclaimed
        );
        Ok(reclaimed)
    }
}

impl ByteStore for LogStore {
    fn read(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.inner.lock().index.get(key).cloned())
    }

    fn write(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let record = encode_record(key, value)?;
        let mut inner = self.inner.lock();
        let synced = match inner.append(&record, self.mode) {
            Ok(synced) => synced,
            Err(e) => {
                warn!(
                    "Append to {} failed, rolling back to {} bytes: {}",
                    self.path.display(),
                    inner.log_bytes,
                    e
                );
                inner.discard_partial(&self.path)?;
                return Err(e.into());
            }
        };

        inner.log_bytes += record.len() as u64;
        inner.unsynced = if synced { 0 } else { inner.unsynced + 1 };
        inner.index.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        inner.writer.get_ref().sync_data()?;
        inner.unsynced = 0;
        Ok(())
    }
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("len", &self.len())
            .finish()
    }
}
