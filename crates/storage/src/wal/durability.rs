//! Durability mode for log store writes.
//!
//! Every write reaches the operating system before `write` returns; the mode
//! only decides how often the file is fsynced.

use serde::{Deserialize, Serialize};

/// Durability mode for log store writes.
///
/// Controls when data is fsynced to disk and the trade-off between
/// throughput and crash safety.
///
/// # Mode Comparison
///
/// | Mode | fsync | Survives |
/// |------|-------|----------|
/// | None | never (OS decides) | process crash |
/// | Batched | every `batch_size` writes | process crash, most power loss |
/// | Strict | every write | process crash, power loss |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DurabilityMode {
    /// Hand writes to the OS page cache, never fsync.
    None,

    /// fsync after every write (slow, maximum durability).
    Strict,

    /// fsync once every `batch_size` writes.
    ///
    /// May lose up to `batch_size - 1` writes on power loss.
    Batched {
        /// Maximum writes between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Check whether a write that leaves `unsynced` writes pending must fsync.
    pub fn should_sync(&self, unsynced: usize) -> bool {
        match self {
            DurabilityMode::None => false,
            DurabilityMode::Strict => true,
            DurabilityMode::Batched { batch_size } => unsynced >= (*batch_size).max(1),
        }
    }

    /// Human-readable description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::None => "No fsync (fastest, OS-buffered)",
            DurabilityMode::Strict => "fsync per write (safest, slowest)",
            DurabilityMode::Batched { .. } => "Batched fsync (balanced speed/safety)",
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        DurabilityMode::Batched { batch_size: 64 }
    }
}
