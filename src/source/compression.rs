//! Compression format detection and decompression for rotated log archives.
//!
//! Rotated logs are commonly kept as `app.log.1.gz` and friends. Such files cannot grow, so
//! they are always opened as in-memory snapshots. Detection is by magic number only; a plain
//! text file that merely carries a `.gz` extension is treated as text.

use crate::error::{Result, WtailError};
use async_compression::tokio::bufread::{BzDecoder, GzipDecoder, XzDecoder, ZstdDecoder};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

/// Archive format of a file, or `None` for plain text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

/// Longest magic number in [`SIGNATURES`]
const HEADER_LEN: usize = 6;

/// Leading bytes of each archive format: gzip (RFC 1952), bzip2 `BZh`, xz stream header,
/// zstd frame
const SIGNATURES: [(CompressionType, &[u8]); 4] = [
    (CompressionType::Gzip, &[0x1f, 0x8b]),
    (CompressionType::Bzip2, b"BZh"),
    (CompressionType::Xz, &[0xfd, b'7', b'z', b'X', b'Z', 0x00]),
    (CompressionType::Zstd, &[0x28, 0xb5, 0x2f, 0xfd]),
];

impl CompressionType {
    /// Short lowercase name used in log messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Xz => "xz",
            Self::Zstd => "zstd",
        }
    }

    pub fn is_compressed(&self) -> bool {
        *self != Self::None
    }

    /// Match a file header against the known signatures
    fn sniff(header: &[u8]) -> Self {
        SIGNATURES
            .iter()
            .find(|(_, magic)| header.starts_with(magic))
            .map_or(Self::None, |(kind, _)| *kind)
    }
}

/// Read the first bytes of `path` and identify its archive format
pub async fn detect_compression(path: &Path) -> Result<CompressionType> {
    let file = File::open(path).await.map_err(|e| {
        WtailError::file_error(format!("Failed to open file: {}", path.display()), e)
    })?;

    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .await
        .map_err(|e| WtailError::file_error("Failed to read file header", e))?;

    Ok(CompressionType::sniff(&header))
}

/// Inflate the whole archive at `path`
pub async fn decompress_to_memory(path: &Path, compression: CompressionType) -> Result<Vec<u8>> {
    let reader = File::open(path)
        .await
        .map(BufReader::new)
        .map_err(|e| WtailError::file_error("Failed to open compressed file", e))?;

    let mut decoder: Box<dyn AsyncRead + Unpin + Send> = match compression {
        CompressionType::Gzip => Box::new(GzipDecoder::new(reader)),
        CompressionType::Bzip2 => Box::new(BzDecoder::new(reader)),
        CompressionType::Xz => Box::new(XzDecoder::new(reader)),
        CompressionType::Zstd => Box::new(ZstdDecoder::new(reader)),
        CompressionType::None => {
            return Err(WtailError::compression(format!(
                "{} is not compressed",
                path.display()
            )))
        }
    };

    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated).await.map_err(|e| {
        WtailError::compression(format!(
            "Failed to decompress {} as {}: {}",
            path.display(),
            compression.name(),
            e
        ))
    })?;

    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_sniff_headers() {
        let cases: [(&[u8], CompressionType); 7] = [
            (&[0x1f, 0x8b, 0x08, 0x00], CompressionType::Gzip),
            (b"BZh91AY", CompressionType::Bzip2),
            (&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00], CompressionType::Xz),
            (&[0x28, 0xb5, 0x2f, 0xfd, 0x00], CompressionType::Zstd),
            (b"2024-01-01 INFO", CompressionType::None),
            (&[0x1f], CompressionType::None),
            (&[], CompressionType::None),
        ];
        for (header, expected) in cases {
            assert_eq!(CompressionType::sniff(header), expected, "{header:?}");
        }
    }

    #[test]
    fn test_names() {
        assert!(!CompressionType::None.is_compressed());
        assert!(CompressionType::Xz.is_compressed());
        assert_eq!(CompressionType::Gzip.name(), "gzip");
        assert_eq!(CompressionType::Zstd.name(), "zstd");
    }

    #[tokio::test]
    async fn test_extension_alone_is_not_compression() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.gz");
        tokio::fs::write(&path, b"not compressed\n").await.unwrap();

        assert_eq!(detect_compression(&path).await.unwrap(), CompressionType::None);
        assert!(decompress_to_memory(&path, CompressionType::None)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_gzip_round_trip_into_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log.1.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(b"rotated 1\nrotated 2\n").unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let kind = detect_compression(&path).await.unwrap();
        assert_eq!(kind, CompressionType::Gzip);
        let data = decompress_to_memory(&path, kind).await.unwrap();
        assert_eq!(data, b"rotated 1\nrotated 2\n");
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_compression_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gz");
        tokio::fs::write(&path, [0x1f, 0x8b, 0xff, 0xff, 0xff]).await.unwrap();

        let err = decompress_to_memory(&path, CompressionType::Gzip)
            .await
            .unwrap_err();
        assert!(matches!(err, WtailError::CompressionError { .. }));
    }
}
