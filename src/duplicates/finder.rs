//! Duplicate finder implementation with multi-phase detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk**: enumerate candidates with the profile's traversal policy
//! 2. **Phase 1 - Size grouping**: see [`crate::duplicates::groups`]
//! 3. **Phase 2 - Sample**: fingerprint same-size files with the sampling hasher
//! 4. **Phase 3 - Verify**: full-content digest of every fingerprint group
//!
//! Every hashing phase runs on the bounded pool handed to it. Non-fatal
//! errors are logged and collected; the affected file simply drops out.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{group_by_size, phase2_sample, phase3_verify};
//! use dupsweep::pool::worker_pool;
//! use dupsweep::scanner::{FullVerifier, SamplingHasher, ScanConfig, Walker};
//! use dupsweep::storage::StorageProfile;
//! use std::path::Path;
//!
//! let pool = worker_pool(4).unwrap();
//! let outcome = Walker::new(Path::new("/srv/data"), ScanConfig::default()).walk(&pool);
//! let (size_groups, _) = group_by_size(outcome.candidates);
//!
//! let hasher = SamplingHasher::for_profile(StorageProfile::Rotating);
//! let (fingerprints, _) = phase2_sample(size_groups, &hasher, &pool, None, None);
//! let (sets, stats) = phase3_verify(fingerprints, &FullVerifier::new(), &pool, None, None);
//!
//! println!("{} duplicate sets, {} redundant files", sets.len(), stats.duplicate_files);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;
use rayon::ThreadPool;

use super::groups::{group_by_size, DuplicateSet, FingerprintKey, SizeGroups};
use crate::pool::{lock, worker_pool};
use crate::progress::{Phase, ProgressCallback};
use crate::scanner::{
    Candidate, ContentHash, ExclusionSet, FullVerifier, HashError, SamplingHasher, ScanConfig,
    ScanError, SizeRaceError, VerifyError, Walker, DEFAULT_BFS_BATCH_SIZE,
};
use crate::storage::StorageProfile;

/// Candidates grouped by size and sample digest, singletons removed.
pub type FingerprintGroups = BTreeMap<FingerprintKey, Vec<Candidate>>;

/// Statistics from the sampling phase.
#[derive(Debug, Default)]
pub struct SampleStats {
    /// Files entering the phase
    pub input_files: usize,
    /// Files successfully sampled
    pub hashed: usize,
    /// Files whose fingerprint matched no other file
    pub eliminated_unique: usize,
    /// Files left in fingerprint groups
    pub potential_duplicates: usize,
    /// Number of fingerprint groups
    pub groups: usize,
    /// Files that could not be read
    pub errors: Vec<HashError>,
}

impl SampleStats {
    /// Percentage of input files eliminated by sampling.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.potential_duplicates;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }
}

/// Statistics from the verification phase.
#[derive(Debug, Default)]
pub struct VerifyStats {
    /// Files entering the phase
    pub input_files: usize,
    /// Files fully digested
    pub verified: usize,
    /// Files whose sample matched but full content did not
    pub false_fingerprints: usize,
    /// Number of confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Redundant files (set members other than the keeper)
    pub duplicate_files: usize,
    /// Bytes freed if every redundant file is removed
    pub reclaimable_space: u64,
    /// Files that could not be read
    pub errors: Vec<HashError>,
    /// Files whose size moved after grouping
    pub size_races: Vec<SizeRaceError>,
}

fn is_set(flag: Option<&AtomicBool>) -> bool {
    flag.is_some_and(|f| f.load(Ordering::SeqCst))
}

/// Phase 2: fingerprint every file in the size groups.
///
/// Files are hashed in parallel on `pool`. Unreadable files are logged,
/// recorded in [`SampleStats::errors`] and dropped. Groups are keyed by
/// size and digest, so files of different sizes never share a group.
///
/// When the shutdown flag is raised, remaining files are skipped and the
/// partial result is returned.
pub fn phase2_sample(
    size_groups: SizeGroups,
    hasher: &SamplingHasher,
    pool: &ThreadPool,
    progress: Option<&dyn ProgressCallback>,
    shutdown: Option<&AtomicBool>,
) -> (FingerprintGroups, SampleStats) {
    let all_files: Vec<Candidate> = size_groups.into_values().flatten().collect();
    let mut stats = SampleStats {
        input_files: all_files.len(),
        ..Default::default()
    };

    if all_files.is_empty() {
        log::debug!("Phase 2: No files to sample");
        return (FingerprintGroups::new(), stats);
    }

    log::info!("Phase 2: Sampling {} files", all_files.len());
    if let Some(callback) = progress {
        callback.on_phase_start(Phase::Sampling, all_files.len());
    }

    let groups: Mutex<HashMap<FingerprintKey, Vec<Candidate>>> = Mutex::new(HashMap::new());
    let errors: Mutex<Vec<HashError>> = Mutex::new(Vec::new());

    pool.install(|| {
        all_files.into_par_iter().for_each(|file| {
            if is_set(shutdown) {
                return;
            }
            match hasher.digest(&file.path) {
                Ok(sample) => {
                    log::trace!("Sampled {}: {:016x}", file.path.display(), sample);
                    let key = FingerprintKey {
                        size: file.size,
                        sample,
                    };
                    if let Some(callback) = progress {
                        callback.on_item(&file.path.to_string_lossy());
                    }
                    lock(&groups).entry(key).or_default().push(file);
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", file.path.display(), e);
                    lock(&errors).push(e);
                }
            }
        });
    });

    if let Some(callback) = progress {
        callback.on_phase_end(Phase::Sampling);
    }

    let groups = groups.into_inner().unwrap_or_else(|e| e.into_inner());
    stats.errors = errors.into_inner().unwrap_or_else(|e| e.into_inner());
    stats.hashed = groups.values().map(Vec::len).sum();

    let result: FingerprintGroups = groups
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

    log::info!(
        "Phase 2 complete: {} files in {} fingerprint groups ({:.1}% eliminated)",
        stats.potential_duplicates,
        stats.groups,
        stats.elimination_rate()
    );

    (result, stats)
}

/// Phase 3: confirm fingerprint groups with a full-content digest.
///
/// Members are grouped by exact size and full digest; every resulting group
/// of two or more becomes a [`DuplicateSet`]. Files that vanished, became
/// unreadable or changed size are logged and excluded.
///
/// Sets are returned largest size first, then by keeper path, so the order
/// does not depend on scheduling.
pub fn phase3_verify(
    fingerprint_groups: FingerprintGroups,
    verifier: &FullVerifier,
    pool: &ThreadPool,
    progress: Option<&dyn ProgressCallback>,
    shutdown: Option<&AtomicBool>,
) -> (Vec<DuplicateSet>, VerifyStats) {
    let all_files: Vec<Candidate> = fingerprint_groups.into_values().flatten().collect();
    let mut stats = VerifyStats {
        input_files: all_files.len(),
        ..Default::default()
    };

    if all_files.is_empty() {
        log::debug!("Phase 3: No files to verify");
        return (Vec::new(), stats);
    }

    log::info!("Phase 3: Verifying {} files", all_files.len());
    if let Some(callback) = progress {
        callback.on_phase_start(Phase::Verifying, all_files.len());
    }

    let by_content: Mutex<HashMap<(u64, ContentHash), Vec<PathBuf>>> = Mutex::new(HashMap::new());
    let errors: Mutex<Vec<HashError>> = Mutex::new(Vec::new());
    let races: Mutex<Vec<SizeRaceError>> = Mutex::new(Vec::new());

    pool.install(|| {
        all_files.into_par_iter().for_each(|file| {
            if is_set(shutdown) {
                return;
            }
            match verifier.digest(&file.path, file.size) {
                Ok(digest) => {
                    if let Some(callback) = progress {
                        callback.on_item(&file.path.to_string_lossy());
                    }
                    lock(&by_content)
                        .entry((file.size, digest))
                        .or_default()
                        .push(file.path);
                }
                Err(VerifyError::SizeRace(race)) => {
                    log::warn!("Excluding {}", race);
                    lock(&races).push(race);
                }
                Err(VerifyError::Hash(e)) => {
                    log::warn!("Skipping {}: {}", file.path.display(), e);
                    lock(&errors).push(e);
                }
            }
        });
    });

    if let Some(callback) = progress {
        callback.on_phase_end(Phase::Verifying);
    }

    let by_content = by_content.into_inner().unwrap_or_else(|e| e.into_inner());
    stats.errors = errors.into_inner().unwrap_or_else(|e| e.into_inner());
    stats.size_races = races.into_inner().unwrap_or_else(|e| e.into_inner());
    stats.verified = by_content.values().map(Vec::len).sum();

    let mut sets: Vec<DuplicateSet> = Vec::new();
    for ((size, digest), paths) in by_content {
        let count = paths.len();
        match DuplicateSet::new(size, digest, paths) {
            Some(set) => sets.push(set),
            None => stats.false_fingerprints += count,
        }
    }

    sets.sort_by(|a, b| {
        b.size()
            .cmp(&a.size())
            .then_with(|| a.paths().cmp(b.paths()))
    });

    stats.duplicate_sets = sets.len();
    stats.duplicate_files = sets.iter().map(|s| s.removals().len()).sum();
    stats.reclaimable_space = sets.iter().map(DuplicateSet::wasted_space).sum();

    log::info!(
        "Phase 3 complete: {} duplicate sets, {} redundant files, {} reclaimable",
        stats.duplicate_sets,
        stats.duplicate_files,
        ByteSize::b(stats.reclaimable_space)
    );

    (sets, stats)
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Storage profile of the scanned tree.
    pub profile: StorageProfile,
    /// Worker pool size; `None` uses the profile default.
    pub workers: Option<usize>,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Directories per breadth-first batch.
    pub bfs_batch_size: usize,
    /// Paths never treated as candidates.
    pub exclusions: ExclusionSet,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("profile", &self.profile)
            .field("workers", &self.workers)
            .field("recursive", &self.recursive)
            .field("bfs_batch_size", &self.bfs_batch_size)
            .field("exclusions", &self.exclusions)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            profile: StorageProfile::Rotating,
            workers: None,
            recursive: true,
            bfs_batch_size: DEFAULT_BFS_BATCH_SIZE,
            exclusions: ExclusionSet::new(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the storage profile.
    #[must_use]
    pub fn with_profile(mut self, profile: StorageProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set an explicit worker pool size.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers.max(1));
        self
    }

    /// Set recursive traversal.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set the breadth-first batch size.
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

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Worker pool size actually used.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| self.profile.default_workers())
            .max(1)
    }

    fn is_shutdown_requested(&self) -> bool {
        is_set(self.shutdown_flag.as_deref())
    }

    fn scan_config(&self) -> ScanConfig {
        ScanConfig::default()
            .with_recursive(self.recursive)
            .with_profile(self.profile)
            .with_bfs_batch_size(self.bfs_batch_size)
            .with_exclusions(self.exclusions.clone())
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Canonical root that was scanned
    pub root: PathBuf,
    /// Storage profile in effect
    pub profile: Option<StorageProfile>,
    /// Worker pool size in effect
    pub workers: usize,
    /// Directories listed
    pub directories: usize,
    /// Candidates found by the walk
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Candidates eliminated by size grouping
    pub eliminated_by_size: usize,
    /// Candidates eliminated by sampling
    pub eliminated_by_sample: usize,
    /// Confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Redundant files across all sets
    pub duplicate_files: usize,
    /// Space that can be reclaimed by removing redundant files
    pub reclaimable_space: u64,
    /// Duration of the scan
    pub scan_duration: Duration,
    /// Directories that could not be read
    pub scan_errors: Vec<ScanError>,
    /// Files that could not be hashed
    pub hash_errors: Vec<HashError>,
    /// Files whose size moved during the scan
    pub size_races: Vec<SizeRaceError>,
}

impl ScanSummary {
    /// Number of non-fatal problems met during the scan.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.scan_errors.len() + self.hash_errors.len() + self.size_races.len()
    }

    /// Format reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Format total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root could not be resolved.
    #[error("I/O error for {path}: {source}")]
    IoWithPath {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The worker pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder that orchestrates the multi-phase detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dupsweep::duplicates::{DuplicateFinder, FinderConfig};
/// use dupsweep::storage::StorageProfile;
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_profile(StorageProfile::SolidState);
/// let finder = DuplicateFinder::new(config);
///
/// let (sets, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate sets", sets.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: SamplingHasher,
    verifier: FullVerifier,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = SamplingHasher::for_profile(config.profile);
        Self {
            config,
            hasher,
            verifier: FullVerifier::new(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate sets under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory (checked before
    ///   any traversal)
    /// - The worker pool cannot be started
    /// - The shutdown flag is raised before the pipeline completes
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateSet>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let root = validate_root(path)?;

        let workers = self.config.effective_workers();
        let mut summary = ScanSummary {
            root: root.clone(),
            profile: Some(self.config.profile),
            workers,
            ..Default::default()
        };

        log::info!(
            "Scanning {} ({} profile, {} workers)",
            root.display(),
            self.config.profile,
            workers
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let pool = worker_pool(workers)?;
        let progress = self.config.progress_callback.as_deref();
        let shutdown = self.config.shutdown_flag.as_deref();

        // Walk
        if let Some(callback) = progress {
            callback.on_phase_start(Phase::Walking, 0);
        }
        let mut walker = Walker::new(&root, self.config.scan_config());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        let outcome = walker.walk(&pool);
        if let Some(callback) = progress {
            callback.on_phase_end(Phase::Walking);
        }

        summary.directories = outcome.directories;
        summary.total_files = outcome.candidates.len();
        summary.total_size = outcome.candidates.iter().map(|c| c.size).sum();
        summary.scan_errors = outcome.errors;
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 1
        let (size_groups, size_stats) = group_by_size(outcome.candidates);
        summary.eliminated_by_size = size_stats.total_files - size_stats.potential_duplicates;
        log::info!(
            "Phase 1 complete: {} files in {} size groups ({:.1}% eliminated)",
            size_stats.potential_duplicates,
            size_stats.groups,
            size_stats.elimination_rate()
        );

        // Phase 2
        let (fingerprints, sample_stats) =
            phase2_sample(size_groups, &self.hasher, &pool, progress, shutdown);
        summary.eliminated_by_sample = sample_stats.eliminated_unique;
        summary.hash_errors = sample_stats.errors;
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        // Phase 3
        let (sets, verify_stats) =
            phase3_verify(fingerprints, &self.verifier, &pool, progress, shutdown);
        summary.hash_errors.extend(verify_stats.errors);
        summary.size_races = verify_stats.size_races;
        summary.duplicate_sets = verify_stats.duplicate_sets;
        summary.duplicate_files = verify_stats.duplicate_files;
        summary.reclaimable_space = verify_stats.reclaimable_space;
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        summary.scan_duration = start_time.elapsed();
        log::info!(
            "Scan complete in {:.2?}: {} duplicate sets, {} warnings",
            summary.scan_duration,
            summary.duplicate_sets,
            summary.warning_count()
        );

        Ok((sets, summary))
    }
}

/// Check that `path` is an existing directory and return its canonical form.
fn validate_root(path: &Path) -> Result<PathBuf, FinderError> {
    if !path.exists() {
        return Err(FinderError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(FinderError::NotADirectory(path.to_path_buf()));
    }
    path.canonicalize().map_err(|source| FinderError::IoWithPath {
        path: path.to_path_buf(),
        source,
    })
}
