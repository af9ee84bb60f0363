//! File removal with pre-delete checks.
//!
//! # Overview
//!
//! Removal is the only destructive step in the program, so every removal is
//! preceded by a fresh look at the filesystem:
//! - The keeper of the set must still exist with the set's size, otherwise
//!   removing the other members could destroy the last copy
//! - Each target must still have the size it was verified with
//!
//! Files are removed permanently by default, or moved to the platform
//! recycle bin with [`DeleteMethod::Trash`].
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::delete::{delete_checked, DeleteMethod};
//! use std::path::Path;
//!
//! match delete_checked(Path::new("/data/copy.bin"), 4096, DeleteMethod::Trash) {
//!     Ok(result) => println!("Removed: {}", result.path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size changed since verification.
    #[error("file modified since scan: {path} ({expected} -> {actual} bytes)")]
    Modified {
        /// The changed file
        path: PathBuf,
        /// Size at verification time
        expected: u64,
        /// Size now
        actual: u64,
    },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// The file that could not be trashed
        path: PathBuf,
        /// Platform error message
        message: String,
    },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {source}")]
    PermanentDeleteFailed {
        /// The file that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The keeper is gone or changed, so removing the rest could leave no copy.
    #[error("keeper {0} is missing or changed; refusing to delete the other copies")]
    AllCopiesWouldBeDeleted(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::AllCopiesWouldBeDeleted(p)
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// How a confirmed duplicate is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteMethod {
    /// `std::fs::remove_file`; cannot be undone.
    #[default]
    Permanent,
    /// Move to the platform recycle bin.
    Trash,
}

impl fmt::Display for DeleteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Permanent => "permanent",
            Self::Trash => "trash",
        })
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was removed.
    pub path: PathBuf,
    /// Size of the removed file in bytes.
    pub size: u64,
    /// Method used.
    pub method: DeleteMethod,
}

/// Check that `path` is a file of exactly `expected` bytes.
///
/// # Errors
///
/// - `NotFound` / `PermissionDenied` / `Io` if the file cannot be inspected
/// - `Modified` if the size differs
pub fn check_size(path: &Path, expected: u64) -> Result<(), DeleteError> {
    let actual = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();
    if actual != expected {
        log::warn!(
            "File modified since scan: {} (size changed from {} to {})",
            path.display(),
            expected,
            actual
        );
        return Err(DeleteError::Modified {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Confirm the keeper of a set is still intact.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` if the keeper vanished, became
/// unreadable or changed size.
pub fn verify_keeper(keeper: &Path, size: u64) -> Result<(), DeleteError> {
    check_size(keeper, size).map_err(|e| {
        log::warn!("Keeper check failed: {}", e);
        DeleteError::AllCopiesWouldBeDeleted(keeper.to_path_buf())
    })
}

/// Remove a file without any pre-check.
///
/// # Errors
///
/// - `TrashFailed` if the recycle bin rejects the file
/// - `PermanentDeleteFailed` if removal fails
pub fn delete_file(path: &Path, size: u64, method: DeleteMethod) -> Result<DeleteResult, DeleteError> {
    match method {
        DeleteMethod::Trash => {
            trash::delete(path).map_err(|e| DeleteError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
        }
        DeleteMethod::Permanent => {
            fs::remove_file(path).map_err(|source| DeleteError::PermanentDeleteFailed {
                path: path.to_path_buf(),
                source,
            })?;
            log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);
        }
    }

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        method,
    })
}

/// Remove a file after confirming it still has the verified size.
///
/// # Errors
///
/// - `Modified` if the file changed since verification
/// - Any error from [`check_size`] or [`delete_file`]
pub fn delete_checked(
    path: &Path,
    expected_size: u64,
    method: DeleteMethod,
) -> Result<DeleteResult, DeleteError> {
    check_size(path, expected_size)?;
    delete_file(path, expected_size, method)
}
