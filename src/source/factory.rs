//! Factory for creating byte sources from paths.

use crate::error::Result;
use crate::source::compression::{decompress_to_memory, detect_compression};
use crate::source::handle::display_name;
use crate::source::validation::validate_file_path;
use crate::source::{ByteSource, HandleSource, OpenMode, SnapshotSource};
use std::path::Path;

/// Builds the right [`ByteSource`] for a path and requested [`OpenMode`]
///
/// # Strategy Selection
/// - Compressed files: decompressed into an in-memory snapshot, whatever the mode
/// - `OpenMode::Live`: [`HandleSource`] re-reading the path on every poll
/// - `OpenMode::Snapshot`: [`SnapshotSource`] frozen at the current length
pub struct SourceFactory;

impl SourceFactory {
    /// Validate `path` and open it
    ///
    /// # Errors
    /// * `FileNotFound` / `NotAFile` / `FileError` from validation
    /// * `CompressionError` if an archive cannot be decompressed
    pub async fn open(path: &Path, mode: OpenMode) -> Result<Box<dyn ByteSource>> {
        validate_file_path(path)?;

        let compression = detect_compression(path).await?;
        if compression.is_compressed() {
            if mode == OpenMode::Live {
                log::info!(
                    "{} is {}-compressed; opening as a one-time snapshot",
                    path.display(),
                    compression.name()
                );
            }
            let data = decompress_to_memory(path, compression).await?;
            log::debug!(
                "decompressed {} into {} bytes",
                path.display(),
                data.len()
            );
            return Ok(Box::new(SnapshotSource::from_bytes(
                display_name(path),
                data,
                compression,
            )));
        }

        match mode {
            OpenMode::Live => Ok(Box::new(HandleSource::new(path))),
            OpenMode::Snapshot => Ok(Box::new(SnapshotSource::open(path).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WtailError;
    use crate::source::SourceKind;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    fn log_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_open_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file(&dir, "app.log", b"line1\nline2\n");

        let live = SourceFactory::open(&path, OpenMode::Live).await.unwrap();
        assert_eq!(live.kind(), SourceKind::Live);
        assert_eq!(live.size().await.unwrap(), 12);

        let snapshot = SourceFactory::open(&path, OpenMode::Snapshot).await.unwrap();
        assert_eq!(snapshot.kind(), SourceKind::Snapshot);
        assert_eq!(snapshot.read_range(6, 11).await.unwrap(), b"line2");
    }

    #[tokio::test]
    async fn test_empty_file_opens_live() {
        let dir = tempfile::tempdir().unwrap();
        let path = log_file(&dir, "empty.log", b"");
        let source = SourceFactory::open(&path, OpenMode::Live).await.unwrap();
        assert_eq!(source.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_archive_forces_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(b"line 1\nline 2\n").unwrap();
        let path = log_file(&dir, "app.log.2.gz", &encoder.finish().unwrap());

        let source = SourceFactory::open(&path, OpenMode::Live).await.unwrap();
        assert_eq!(source.kind(), SourceKind::Snapshot);
        assert_eq!(source.size().await.unwrap(), 14);
        assert_eq!(source.read_range(7, 14).await.unwrap(), b"line 2\n");
    }

    #[tokio::test]
    async fn test_missing_path_is_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let result = SourceFactory::open(&dir.path().join("gone.log"), OpenMode::Live).await;
        assert!(matches!(result, Err(WtailError::FileNotFound { .. })));
    }
}
