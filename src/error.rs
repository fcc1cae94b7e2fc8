//! Error types and handling infrastructure for wtail.
//!
//! Library code returns [`WtailError`] through the crate-wide [`Result`] alias; the binary
//! wraps it in `anyhow` for reporting. Most failures inside the running tail engine are not
//! propagated at all: they are turned into a visible status and the next poll tick retries.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for wtail operations.
#[derive(Error, Debug)]
pub enum WtailError {
    /// Opening or inspecting a file failed
    #[error("{message}")]
    FileError {
        message: String,
        #[source]
        source: io::Error,
    },

    #[error("no such file: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// Directories, sockets and the like cannot be tailed
    #[error("not a regular file: {}", .path.display())]
    NotAFile { path: PathBuf },

    /// The byte source could not report its size or deliver a range
    /// (permission revoked, file deleted or moved). Never fatal to the engine.
    #[error("source unavailable: {message}")]
    SourceUnavailable {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Archive could not be inflated
    #[error("decompression failed: {message}")]
    CompressionError { message: String },

    /// Terminal setup, drawing or input failed
    #[error("terminal error: {message}")]
    UIError { message: String },

    #[error("invalid configuration: {message}")]
    ConfigError { message: String },

    /// Rejected command line or config value
    #[error("invalid value: {message}")]
    InvalidArgument { message: String },
}

/// Standard Result type for wtail operations.
pub type Result<T> = std::result::Result<T, WtailError>;

impl WtailError {
    pub fn file_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// Transient failure caused by an io::Error
    pub fn unavailable(message: impl Into<String>, source: io::Error) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Transient failure with no io::Error behind it
    pub fn unavailable_msg(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn compression(message: impl Into<String>) -> Self {
        Self::CompressionError {
            message: message.into(),
        }
    }

    pub fn ui(message: impl Into<String>) -> Self {
        Self::UIError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Whether this error means "try again on the next tick"
    pub fn is_source_unavailable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

impl From<io::Error> for WtailError {
    fn from(err: io::Error) -> Self {
        let message = match err.kind() {
            io::ErrorKind::NotFound => "file vanished",
            io::ErrorKind::PermissionDenied => "permission denied",
            io::ErrorKind::BrokenPipe => "output closed",
            _ => "I/O error",
        };
        Self::file_error(message, err)
    }
}
