//! # Input Files
//!
//! Bounded, validated reads of user-supplied paths.

use crate::error::AppError;
use std::path::{Path, PathBuf};

/// Maximum script size (100 MB).
pub const MAX_SCRIPT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum config size (1 MB).
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

fn io_error(path: &Path, source: std::io::Error) -> AppError {
    AppError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Resolve `path` to a canonical regular file.
///
/// Canonicalizing resolves `..` and symlinks, so the logged path is the
/// file actually read.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| io_error(path, e))?;

    if !canonical.is_file() {
        return Err(io_error(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    Ok(canonical)
}

/// Read a UTF-8 file no larger than `max_size` bytes.
pub fn read_to_string(path: &Path, max_size: u64) -> Result<String, AppError> {
    let canonical = validate_file_path(path)?;

    let size = std::fs::metadata(&canonical)
        .map_err(|e| io_error(path, e))?
        .len();
    if size > max_size {
        return Err(AppError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_size,
        });
    }

    tracing::debug!(path = %canonical.display(), size, "reading file");
    std::fs::read_to_string(&canonical).map_err(|e| io_error(path, e))
}
