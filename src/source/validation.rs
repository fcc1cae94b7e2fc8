//! File validation before a source is opened.
//!
//! Unlike a pager, a tail viewer must accept empty files: a log that was just created (or just
//! rotated) is exactly the thing a user wants to watch grow.

use crate::error::{Result, WtailError};
use std::fs::File;
use std::path::Path;

/// Validate that a path names a readable regular file
///
/// # Error Cases
/// - Path does not exist (`FileNotFound`)
/// - Path points to a directory or other non-file (`NotAFile`)
/// - File cannot be opened for reading (`FileError`)
pub fn validate_file_path(path: &Path) -> Result<()> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WtailError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(WtailError::file_error("Failed to read file metadata", e)),
    };

    if !metadata.is_file() {
        return Err(WtailError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    File::open(path).map_err(|e| {
        WtailError::file_error(
            format!("Cannot open file for reading: {}", path.display()),
            e,
        )
    })?;

    Ok(())
}
