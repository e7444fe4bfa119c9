//! Record Stores
//!
//! Scoped access to sled stores and the two record stores built on top of it:
//! [`TimelineStore`] for encoded timelines and [`PhotoStore`] for raw photo
//! blobs. Each store is bound to its own directory.

pub mod handle;
pub mod photo;
pub mod timeline;

use serde::{Deserialize, Serialize};

pub use handle::{HandleMode, StoreHandle};
pub use photo::PhotoStore;
pub use timeline::TimelineStore;

/// Outcome of a compaction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactReport {
    /// Live entries copied into the compacted store
    pub entries: usize,
    /// On-disk size before compaction, in bytes
    pub bytes_before: u64,
    /// On-disk size after compaction, in bytes
    pub bytes_after: u64,
}

impl CompactReport {
    pub fn reclaimed_bytes(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}
