//! Size grouping and duplicate set types.
//!
//! # Overview
//!
//! Size grouping is the first narrowing step. Files of different sizes cannot
//! be equal, so grouping by exact byte size and discarding singletons removes
//! most candidates without reading a single byte of content.
//!
//! A [`DuplicateSet`] is the final, immutable output of verification: two or
//! more paths with the same size and the same full-content digest.
//!
//! # Example
//!
//! ```
//! use dupsweep::scanner::Candidate;
//! use dupsweep::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     Candidate::new(PathBuf::from("/file1.bin"), 1024),
//!     Candidate::new(PathBuf::from("/file2.bin"), 1024),
//!     Candidate::new(PathBuf::from("/file3.bin"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::scanner::{hash_to_hex, Candidate, ContentHash, SampleDigest};

/// Candidates grouped by exact size, singletons removed.
pub type SizeGroups = BTreeMap<u64, Vec<Candidate>>;

/// Statistics from size grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Candidates received from the scanner
    pub total_files: usize,
    /// Zero-byte files dropped
    pub empty_files: usize,
    /// Repeated paths dropped
    pub repeated_paths: usize,
    /// Files with a unique size (cannot have a duplicate)
    pub eliminated_unique: usize,
    /// Files left in groups of two or more
    pub potential_duplicates: usize,
    /// Number of size groups with two or more files
    pub groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            let eliminated = self.total_files - self.potential_duplicates;
            (eliminated as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group candidates by exact size.
///
/// Discovery order is preserved inside each group. Zero-byte files and
/// repeated paths are dropped, so a path can only reach one group.
#[must_use]
pub fn group_by_size(files: Vec<Candidate>) -> (SizeGroups, GroupingStats) {
    let mut stats = GroupingStats {
        total_files: files.len(),
        ..Default::default()
    };
    let mut seen: HashSet<PathBuf> = HashSet::with_capacity(files.len());
    let mut all: BTreeMap<u64, Vec<Candidate>> = BTreeMap::new();

    for file in files {
        if file.size == 0 {
            stats.empty_files += 1;
            continue;
        }
        if !seen.insert(file.path.clone()) {
            stats.repeated_paths += 1;
            continue;
        }
        all.entry(file.size).or_default().push(file);
    }

    let groups: SizeGroups = all
        .into_iter()
        .filter(|(_, files)| {
            if files.len() < 2 {
                stats.eliminated_unique += files.len();
                false
            } else {
                stats.potential_duplicates += files.len();
                stats.groups += 1;
                true
            }
        })
        .collect();

    (groups, stats)
}

/// Key of a fingerprint group: size plus sample digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FingerprintKey {
    /// File size in bytes
    pub size: u64,
    /// Sample digest
    pub sample: SampleDigest,
}

/// Files proven byte-identical by size and full-content digest.
///
/// Paths are kept sorted, which makes the keeper (the first path) a
/// deterministic function of the member set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSet {
    size: u64,
    digest: ContentHash,
    paths: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Form a duplicate set.
    ///
    /// Returns `None` when fewer than two distinct paths are given.
    #[must_use]
    pub fn new(size: u64, digest: ContentHash, mut paths: Vec<PathBuf>) -> Option<Self> {
        paths.sort();
        paths.dedup();
        if paths.len() < 2 {
            return None;
        }
        Some(Self {
            size,
            digest,
            paths,
        })
    }

    /// Size of each member in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Full-content digest shared by all members.
    #[must_use]
    pub fn digest(&self) -> &ContentHash {
        &self.digest
    }

    /// Digest as hexadecimal.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hash_to_hex(&self.digest)
    }

    /// All members, sorted.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of members (always at least 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The member that is never deleted.
    #[must_use]
    pub fn keeper(&self) -> &Path {
        &self.paths[0]
    }

    /// Members other than the keeper.
    #[must_use]
    pub fn removals(&self) -> &[PathBuf] {
        &self.paths[1..]
    }

    /// Bytes freed if every removal succeeds.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.removals().len() as u64
    }
}
