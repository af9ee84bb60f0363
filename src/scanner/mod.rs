//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Locality-ordered breadth-first and concurrent fan-out directory walking
//! - Locality hints (inode order) for seek-sensitive media
//! - Bounded-cost sample digests (XxHash64)
//! - Full-content verification digests (BLAKE3, streamed)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate discovery
//! - [`locality`]: Physical-position ordering keys
//! - [`hasher`]: Sampling hasher (head/tail and strided policies)
//! - [`verifier`]: Full-content digest with stale-size detection
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::pool::worker_pool;
//! use dupsweep::scanner::{ScanConfig, Walker};
//! use std::path::Path;
//!
//! let pool = worker_pool(4).unwrap();
//! let walker = Walker::new(Path::new("/srv/data"), ScanConfig::default());
//! let outcome = walker.walk(&pool);
//! for candidate in &outcome.candidates {
//!     println!("{}: {} bytes", candidate.path.display(), candidate.size);
//! }
//! ```

pub mod hasher;
pub mod locality;
pub mod verifier;
pub mod walker;

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use crate::storage::StorageProfile;

// Re-export main types
pub use hasher::{SampleDigest, SamplingHasher, SamplingPolicy};
pub use locality::{default_locality, LocalitySource};
pub use verifier::{hash_to_hex, ContentHash, FullVerifier, VerifyError};
pub use walker::{ScanOutcome, Walker};

/// Default number of directories processed per breadth-first batch.
pub const DEFAULT_BFS_BATCH_SIZE: usize = 100;

/// A file discovered by the scanner.
///
/// Ephemeral: produced by the walker and consumed by size grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes at scan time
    pub size: u64,
}

impl Candidate {
    /// Create a new candidate.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }
}

/// Paths that must never be scanned or deleted.
///
/// Paths are canonicalized on insertion when they exist so that comparisons
/// against scanner output (which is rooted at a canonical directory) match.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    paths: HashSet<PathBuf>,
}

impl ExclusionSet {
    /// Create an empty exclusion set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path to the set.
    pub fn insert(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let normalized = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.paths.insert(normalized);
    }

    /// Check whether a path is excluded.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of excluded paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<P: AsRef<Path>> FromIterator<P> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut set = Self::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Storage profile; selects the traversal policy.
    pub profile: StorageProfile,
    /// Directories per breadth-first batch (rotating profile only).
    pub bfs_batch_size: usize,
    /// Paths never yielded as candidates.
    pub exclusions: ExclusionSet,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            profile: StorageProfile::Rotating,
            bfs_batch_size: DEFAULT_BFS_BATCH_SIZE,
            exclusions: ExclusionSet::new(),
        }
    }
}

impl ScanConfig {
    /// Set recursive traversal.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the storage profile.
    #[must_use]
    pub fn with_profile(mut self, profile: StorageProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set the breadth-first batch size (minimum 1).
    #[must_use]
    pub fn with_bfs_batch_size(mut self, size: usize) -> Self {
        self.bfs_batch_size = size.max(1);
        self
    }

    /// Set the exclusion set.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }
}

/// Errors that can occur during directory scanning.
///
/// Never fatal: the directory is skipped and the walk continues.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when opening a directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The directory vanished during the walk.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while reading a directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur while reading a candidate's bytes.
///
/// The candidate is dropped; the run continues.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file vanished.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path of the file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// A candidate's size changed between grouping and verification.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Size changed for {path}: {expected} -> {actual} bytes")]
pub struct SizeRaceError {
    /// The mutated file
    pub path: PathBuf,
    /// Size recorded at grouping time
    pub expected: u64,
    /// Size observed at verification time
    pub actual: u64,
}
