//! Path-backed live source.
//!
//! Every call re-opens the file, so the size reported always reflects the file currently at
//! the path: appends show up as growth, `truncate` and rename-and-recreate rotation show up as
//! shrinkage. Holding a handle open instead would keep following a rotated-away inode.

use crate::error::{Result, WtailError};
use crate::source::{ByteSource, SourceKind};
use async_trait::async_trait;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Live tail source that re-reads metadata from its path on every poll
#[derive(Debug, Clone)]
pub struct HandleSource {
    path: PathBuf,
    name: String,
}

impl HandleSource {
    /// Create a source for `path`. The path is not touched until the first call.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = display_name(&path);
        Self { path, name }
    }

    /// Path being followed
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open_file(&self) -> Result<File> {
        File::open(&self.path).await.map_err(|e| {
            WtailError::unavailable(format!("cannot open {}", self.path.display()), e)
        })
    }
}

#[async_trait]
impl ByteSource for HandleSource {
    async fn size(&self) -> Result<u64> {
        let metadata = tokio::fs::metadata(&self.path).await.map_err(|e| {
            WtailError::unavailable(format!("cannot stat {}", self.path.display()), e)
        })?;
        Ok(metadata.len())
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        if start >= end {
            return Ok(Vec::new());
        }

        let mut file = self.open_file().await?;
        file.seek(SeekFrom::Start(start)).await.map_err(|e| {
            WtailError::unavailable(format!("cannot seek in {}", self.path.display()), e)
        })?;

        let wanted = end - start;
        let mut buf = Vec::with_capacity(wanted.min(16 * 1024 * 1024) as usize);
        file.take(wanted).read_to_end(&mut buf).await.map_err(|e| {
            WtailError::unavailable(format!("cannot read {}", self.path.display()), e)
        })?;
        Ok(buf)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Live
    }
}

/// File name for display, falling back to the full path
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write test data");
        file.flush().expect("Failed to flush test data");
        file
    }

    #[tokio::test]
    async fn test_size_tracks_growth() {
        let mut file = create_test_file(b"first\n");
        let source = HandleSource::new(file.path());
        assert_eq!(source.size().await.unwrap(), 6);

        file.write_all(b"second\n").unwrap();
        file.flush().unwrap();
        assert_eq!(source.size().await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_read_range() {
        let file = create_test_file(b"line1\nline2\nline3\n");
        let source = HandleSource::new(file.path());

        assert_eq!(source.read_range(6, 12).await.unwrap(), b"line2\n");
        assert_eq!(source.read_range(12, 100).await.unwrap(), b"line3\n");
        assert!(source.read_range(5, 5).await.unwrap().is_empty());
        assert!(source.read_range(100, 200).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = HandleSource::new(dir.path().join("gone.log"));

        let err = source.size().await.unwrap_err();
        assert!(err.is_source_unavailable());
        let err = source.read_range(0, 10).await.unwrap_err();
        assert!(err.is_source_unavailable());
    }

    #[tokio::test]
    async fn test_sees_truncation() {
        let file = create_test_file(b"a long line of text\n");
        let source = HandleSource::new(file.path());
        assert_eq!(source.size().await.unwrap(), 20);

        std::fs::write(file.path(), b"new\n").unwrap();
        assert_eq!(source.size().await.unwrap(), 4);
        assert_eq!(source.name(), file.path().file_name().unwrap().to_str().unwrap());
        assert_eq!(source.kind(), SourceKind::Live);
    }
}
