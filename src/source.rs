//! Byte source abstraction.
//!
//! The tail engine never touches the file system directly. It talks to a [`ByteSource`], which
//! reports the current size of a file-like resource and reads byte ranges out of it. Two
//! file-backed variants exist:
//!
//! - [`HandleSource`] re-opens its path on every call, so growth, truncation and rotation are
//!   all visible (live tail).
//! - [`SnapshotSource`] is frozen at open time (one-shot load); compressed archives are always
//!   opened this way.
//!
//! [`MemorySource`] is a shared in-memory buffer for embedding and tests.

pub mod compression;
pub mod factory;
pub mod handle;
pub mod memory;
pub mod snapshot;
pub mod validation;

use crate::error::Result;
use async_trait::async_trait;

pub use compression::CompressionType;
pub use factory::SourceFactory;
pub use handle::HandleSource;
pub use memory::MemorySource;
pub use snapshot::SnapshotSource;

/// Whether a source can grow after it has been opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Re-reads metadata on every call; polling picks up growth
    Live,
    /// Fixed at open time; no live growth
    Snapshot,
}

impl SourceKind {
    /// Human-readable label for the header line
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Live => "live tail",
            SourceKind::Snapshot => "one-time snapshot (no live tail)",
        }
    }
}

/// How the caller wants a path opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Live,
    Snapshot,
}

/// A file-like object the tail engine can poll.
///
/// Both operations may fail with [`WtailError::SourceUnavailable`](crate::WtailError) when the
/// underlying resource disappears or becomes unreadable. Callers treat that as transient.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Current total size in bytes
    async fn size(&self) -> Result<u64>;

    /// Read the bytes in `[start, end)`.
    ///
    /// Returns fewer bytes than requested if the resource ended before `end` (for example
    /// because it was truncated between [`size`](Self::size) and this call). Returns an empty
    /// vector when `start >= end`.
    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>>;

    /// Display name (usually the file name)
    fn name(&self) -> &str;

    /// Live or snapshot
    fn kind(&self) -> SourceKind;
}

/// Clamp a requested `[start, end)` range to a known length.
pub(crate) fn clamp_range(start: u64, end: u64, len: u64) -> Option<(usize, usize)> {
    let end = end.min(len);
    if start >= end {
        None
    } else {
        Some((start as usize, end as usize))
    }
}
