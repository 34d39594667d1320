//! Store Integration Test Suite
//!
//! End-to-end tests through the public `chatkv` API: fields and trees over
//! both the in-memory store and the on-disk log.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test store
//! cargo test --test store recovery::
//! ```

use chatkv::{ChatKv, DurabilityMode, FileId, KeyOrder};
use tempfile::TempDir;

mod cache;
mod fields;
mod leaderboard;
mod persistence;
mod recovery;

// =============================================================================
// SHARED TEST UTILITIES
// =============================================================================

/// Open an on-disk database in a fresh temp directory
pub fn open_temp() -> (TempDir, ChatKv) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = open_at(&dir);
    (dir, db)
}

/// Reopen the database stored in `dir`
pub fn open_at(dir: &TempDir) -> ChatKv {
    ChatKv::builder()
        .path(dir.path())
        .durability(DurabilityMode::Strict)
        .open()
        .expect("failed to open database")
}

/// Leaderboard ordering: score descending, then name
pub fn leaderboard_orders() -> [KeyOrder; 2] {
    [KeyOrder::Descending, KeyOrder::Lexicographic]
}

/// Namespace used for the leaderboard tree in these tests
pub const BOARD: FileId = FileId(100);
