//! Locality hints for seek-sensitive traversal.
//!
//! # Overview
//!
//! On rotating media, reading directory entries in on-disk order cuts seek
//! distance. The exact physical position is not portable, so this module
//! abstracts it behind [`LocalitySource`], which maps metadata to an
//! ordering key.
//!
//! # Platform Support
//!
//! - **Unix**: inode number (allocation order is a good proxy for position)
//! - **Other**: no key; ordering falls back to the path
//!
//! Absence of a key is never an error. Entries without a key sort after
//! keyed entries, and ties are broken by path, so the order is always
//! total and deterministic.

use std::fmt::Debug;
use std::fs::Metadata;
use std::path::PathBuf;

/// Provides a physical-locality ordering key for a file or directory.
pub trait LocalitySource: Debug + Send + Sync {
    /// Ordering key for the entry, or `None` if unavailable.
    fn locality_key(&self, metadata: &Metadata) -> Option<u64>;
}

/// Uses the inode number as the locality key.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct InodeLocality;

#[cfg(unix)]
impl LocalitySource for InodeLocality {
    fn locality_key(&self, metadata: &Metadata) -> Option<u64> {
        use std::os::unix::fs::MetadataExt;
        Some(metadata.ino())
    }
}

/// Provides no key; traversal is ordered lexicographically.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalOrder;

impl LocalitySource for LexicalOrder {
    fn locality_key(&self, _metadata: &Metadata) -> Option<u64> {
        None
    }
}

/// Best locality source available on this platform.
#[must_use]
pub fn default_locality() -> Box<dyn LocalitySource> {
    #[cfg(unix)]
    {
        Box::new(InodeLocality)
    }
    #[cfg(not(unix))]
    {
        Box::new(LexicalOrder)
    }
}

/// A path tagged with its locality key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    /// Locality key, if the platform provided one
    pub key: Option<u64>,
    /// Path used as the tiebreaker
    pub path: PathBuf,
    /// Payload carried along with the path
    pub item: T,
}

/// Sort entries by locality key, then by path.
pub fn sort_by_locality<T>(entries: &mut [Located<T>]) {
    entries.sort_by(|a, b| match (a.key, b.key) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.path.cmp(&b.path)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.path.cmp(&b.path),
    });
}
