//! Directory walker with storage-aware traversal policies.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating duplicate
//! candidates under a root directory. Two policies exist, selected by the
//! [`StorageProfile`] in [`ScanConfig`]:
//!
//! - **Locality-ordered breadth-first** (rotating media): directories are
//!   processed in fixed-size batches. Each batch, and the entries of each
//!   directory, are ordered by a [`LocalitySource`] key before being read.
//! - **Concurrent fan-out** (solid-state media): one task per subdirectory is
//!   spawned on a bounded rayon pool. No ordering is guaranteed.
//!
//! Both policies yield the same set of paths for a static tree.
//!
//! # Filtering
//!
//! - Zero-byte files are skipped (they cannot carry a meaningful duplicate)
//! - Symbolic links are never followed or reported
//! - Paths in the [`ExclusionSet`](super::ExclusionSet) are skipped
//! - Unreadable directories are skipped with a warning, never fatal

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rayon::{Scope, ThreadPool};

use super::locality::{default_locality, sort_by_locality, Located, LocalitySource};
use super::{Candidate, ScanConfig, ScanError};
use crate::pool::lock;
use crate::storage::StorageProfile;

/// Result of a walk: candidates plus the non-fatal errors met on the way.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Discovered files, in traversal order
    pub candidates: Vec<Candidate>,
    /// Directories that could not be read
    pub errors: Vec<ScanError>,
    /// Number of directories successfully listed
    pub directories: usize,
}

/// Contents of a single directory, split by entry kind.
#[derive(Debug, Default)]
struct DirListing {
    /// Regular files with their sizes
    files: Vec<Located<u64>>,
    /// Subdirectories
    subdirs: Vec<Located<()>>,
}

/// Shared output of the fan-out walk.
#[derive(Default)]
struct FanOutSink {
    candidates: Mutex<Vec<Candidate>>,
    errors: Mutex<Vec<ScanError>>,
    directories: AtomicUsize,
}

/// Directory walker for candidate discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: ScanConfig,
    /// Physical-order key provider
    locality: Box<dyn LocalitySource>,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// The root should be absolute; candidates are reported as `root.join(..)`.
    #[must_use]
    pub fn new(path: &Path, config: ScanConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            locality: default_locality(),
            shutdown_flag: None,
        }
    }

    /// Replace the locality source used by the breadth-first policy.
    #[must_use]
    pub fn with_locality(mut self, locality: Box<dyn LocalitySource>) -> Self {
        self.locality = locality;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree using the policy of the configured profile.
    ///
    /// The pool is only used by the fan-out policy.
    pub fn walk(&self, pool: &ThreadPool) -> ScanOutcome {
        log::debug!(
            "Walking {} ({} policy, recursive: {})",
            self.root.display(),
            self.config.profile,
            self.config.recursive
        );
        let outcome = match self.config.profile {
            StorageProfile::Rotating => self.walk_locality_bfs(),
            StorageProfile::SolidState => self.walk_fan_out(pool),
        };
        log::debug!(
            "Walk finished: {} candidates in {} directories, {} unreadable",
            outcome.candidates.len(),
            outcome.directories,
            outcome.errors.len()
        );
        outcome
    }

    /// Batched breadth-first walk in locality order.
    pub fn walk_locality_bfs(&self) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let mut queue = VecDeque::from([self.root.clone()]);

        while !queue.is_empty() {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping traversal");
                break;
            }

            let take = self.config.bfs_batch_size.min(queue.len());
            let mut batch: Vec<Located<()>> = queue
                .drain(..take)
                .map(|dir| Located {
                    key: fs::symlink_metadata(&dir)
                        .ok()
                        .and_then(|m| self.locality.locality_key(&m)),
                    path: dir,
                    item: (),
                })
                .collect();
            sort_by_locality(&mut batch);

            for dir in batch {
                match self.list_dir(&dir.path) {
                    Ok(mut listing) => {
                        outcome.directories += 1;
                        sort_by_locality(&mut listing.files);
                        outcome.candidates.extend(
                            listing
                                .files
                                .into_iter()
                                .map(|f| Candidate::new(f.path, f.item)),
                        );
                        if self.config.recursive {
                            sort_by_locality(&mut listing.subdirs);
                            queue.extend(listing.subdirs.into_iter().map(|d| d.path));
                        }
                    }
                    Err(e) => {
                        log::warn!("Skipping directory: {}", e);
                        outcome.errors.push(e);
                    }
                }
            }
        }

        outcome
    }

    /// Concurrent walk: one pool task per directory.
    pub fn walk_fan_out(&self, pool: &ThreadPool) -> ScanOutcome {
        let sink = FanOutSink::default();
        pool.scope(|scope| self.visit(self.root.clone(), scope, &sink));

        ScanOutcome {
            candidates: sink
                .candidates
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
            errors: sink
                .errors
                .into_inner()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
            directories: sink.directories.load(Ordering::SeqCst),
        }
    }

    /// Lists one directory and spawns a task for each subdirectory.
    fn visit<'s>(&'s self, dir: PathBuf, scope: &Scope<'s>, sink: &'s FanOutSink) {
        if self.is_shutdown_requested() {
            return;
        }

        match self.list_dir(&dir) {
            Ok(listing) => {
                sink.directories.fetch_add(1, Ordering::SeqCst);
                lock(&sink.candidates).extend(
                    listing
                        .files
                        .into_iter()
                        .map(|f| Candidate::new(f.path, f.item)),
                );
                if self.config.recursive {
                    for sub in listing.subdirs {
                        scope.spawn(move |s| self.visit(sub.path, s, sink));
                    }
                }
            }
            Err(e) => {
                log::warn!("Skipping directory: {}", e);
                lock(&sink.errors).push(e);
            }
        }
    }

    /// Read one directory, classifying and filtering its entries.
    fn list_dir(&self, dir: &Path) -> Result<DirListing, ScanError> {
        let read_dir = fs::read_dir(dir).map_err(|e| ScanError::from_io(dir, e))?;
        let mut listing = DirListing::default();

        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();

            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    log::warn!("Failed to stat {}: {}", path.display(), e);
                    continue;
                }
            };
            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", path.display());
                continue;
            }

            // DirEntry::metadata does not traverse symlinks
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Failed to stat {}: {}", path.display(), e);
                    continue;
                }
            };
            let key = self.locality.locality_key(&metadata);

            if file_type.is_dir() {
                listing.subdirs.push(Located {
                    key,
                    path,
                    item: (),
                });
            } else if file_type.is_file() {
                let size = metadata.len();
                if size == 0 {
                    log::debug!("Skipping empty file: {}", path.display());
                    continue;
                }
                if self.config.exclusions.contains(&path) {
                    log::debug!("Skipping excluded path: {}", path.display());
                    continue;
                }
                listing.files.push(Located {
                    key,
                    path,
                    item: size,
                });
            }
        }

        Ok(listing)
    }
}
