//! One-shot snapshot source.
//!
//! A snapshot reports the size it had when it was opened for its whole lifetime, so the tail
//! engine loads the initial window and then never sees growth. Plain files keep their open
//! handle and read lazily; decompressed archives live in memory.

use crate::error::{Result, WtailError};
use crate::source::handle::display_name;
use crate::source::{clamp_range, ByteSource, CompressionType, SourceKind};
use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

#[derive(Debug)]
enum SnapshotData {
    /// Open handle plus the length observed at open time
    File { file: Mutex<File>, len: u64 },
    /// Fully materialised content (decompressed archives)
    InMemory(Vec<u8>),
}

/// Source fixed at open time
#[derive(Debug)]
pub struct SnapshotSource {
    data: SnapshotData,
    name: String,
    compression: CompressionType,
}

impl SnapshotSource {
    /// Open a plain file as a snapshot, capturing its current length
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|e| {
            WtailError::file_error(format!("Failed to open file: {}", path.display()), e)
        })?;
        let len = file
            .metadata()
            .await
            .map_err(|e| WtailError::file_error("Failed to get file metadata", e))?
            .len();

        Ok(Self {
            data: SnapshotData::File {
                file: Mutex::new(file),
                len,
            },
            name: display_name(path),
            compression: CompressionType::None,
        })
    }

    /// Wrap already-materialised bytes (for example a decompressed archive)
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        compression: CompressionType,
    ) -> Self {
        Self {
            data: SnapshotData::InMemory(bytes),
            name: name.into(),
            compression,
        }
    }

    /// Compression format of the original file
    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    fn len(&self) -> u64 {
        match &self.data {
            SnapshotData::File { len, .. } => *len,
            SnapshotData::InMemory(bytes) => bytes.len() as u64,
        }
    }
}

#[async_trait]
impl ByteSource for SnapshotSource {
    async fn size(&self) -> Result<u64> {
        Ok(self.len())
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let Some((start, end)) = clamp_range(start, end, self.len()) else {
            return Ok(Vec::new());
        };

        match &self.data {
            SnapshotData::InMemory(bytes) => Ok(bytes[start..end].to_vec()),
            SnapshotData::File { file, .. } => {
                let mut file = file.lock().await;
                file.seek(SeekFrom::Start(start as u64))
                    .await
                    .map_err(|e| WtailError::unavailable("cannot seek in snapshot", e))?;

                let mut buf = vec![0u8; end - start];
                let mut filled = 0;
                while filled < buf.len() {
                    let n = file
                        .read(&mut buf[filled..])
                        .await
                        .map_err(|e| WtailError::unavailable("cannot read snapshot", e))?;
                    if n == 0 {
                        // File shrank underneath the snapshot
                        break;
                    }
                    filled += n;
                }
                buf.truncate(filled);
                Ok(buf)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_snapshot_ignores_growth() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"line1\nline2\n").unwrap();
        file.flush().unwrap();

        let source = SnapshotSource::open(file.path()).await.unwrap();
        assert_eq!(source.size().await.unwrap(), 12);

        file.write_all(b"line3\n").unwrap();
        file.flush().unwrap();

        assert_eq!(source.size().await.unwrap(), 12);
        assert_eq!(source.read_range(6, 100).await.unwrap(), b"line2\n");
        assert_eq!(source.kind(), SourceKind::Snapshot);
    }

    #[tokio::test]
    async fn test_in_memory_snapshot() {
        let source =
            SnapshotSource::from_bytes("app.log.gz", b"a\nb\nc\n".to_vec(), CompressionType::Gzip);

        assert_eq!(source.size().await.unwrap(), 6);
        assert_eq!(source.read_range(2, 4).await.unwrap(), b"b\n");
        assert!(source.read_range(6, 10).await.unwrap().is_empty());
        assert_eq!(source.name(), "app.log.gz");
        assert_eq!(source.compression(), CompressionType::Gzip);
    }
}
