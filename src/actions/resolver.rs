//! Concurrent resolution of duplicate sets.
//!
//! # Overview
//!
//! The [`Resolver`] takes the verified [`DuplicateSet`]s and removes every
//! member except the keeper. Sets are resolved concurrently on a bounded
//! pool; inside one set the removals run sequentially, and only after the
//! set has been confirmed.
//!
//! The prompt lock is never held while removing files, so one slow
//! removal does not block other sets from prompting.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::{ConfirmMode, Resolver, ResolverConfig, StdinPrompter};
//! use dupsweep::output::Reporter;
//! use std::path::Path;
//!
//! # let sets: Vec<dupsweep::duplicates::DuplicateSet> = Vec::new();
//! let reporter = Reporter::stdout(Path::new("/data"), false);
//! let prompter = StdinPrompter;
//! let resolver = Resolver::new(ResolverConfig::default(), &prompter, &reporter);
//! let summary = resolver.resolve(&sets, ConfirmMode::Manual).unwrap();
//! println!("{summary}");
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytesize::ByteSize;
use rayon::prelude::*;

use super::confirm::{ConfirmMode, Confirmer, Decision, Prompter, RunState};
use super::delete::{delete_checked, verify_keeper, DeleteMethod};
use crate::duplicates::DuplicateSet;
use crate::output::Reporter;
use crate::pool::worker_pool;
use crate::scanner::ExclusionSet;

/// Default number of sets resolved at once.
pub const DEFAULT_RESOLVE_WORKERS: usize = 4;

/// Configuration for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Sets resolved concurrently.
    pub workers: usize,
    /// Removal method.
    pub method: DeleteMethod,
    /// Report what would be removed without touching anything.
    pub dry_run: bool,
    /// Paths that are never removed, even if listed in a set.
    pub exclusions: ExclusionSet,
    /// Optional shutdown flag; no new set starts once it is raised.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_RESOLVE_WORKERS,
            method: DeleteMethod::Permanent,
            dry_run: false,
            exclusions: ExclusionSet::new(),
            shutdown_flag: None,
        }
    }
}

impl ResolverConfig {
    /// Set the number of concurrent sets.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the removal method.
    #[must_use]
    pub fn with_method(mut self, method: DeleteMethod) -> Self {
        self.method = method;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the paths that must never be removed.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Set the shutdown flag.
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
}

/// Outcome of resolving all sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    /// Files successfully removed.
    pub removed: usize,
    /// Total members across all duplicate sets.
    pub candidates: usize,
    /// Removals that failed.
    pub failed: usize,
    /// Sets left untouched (declined, unanswered, keeper missing or interrupted).
    pub skipped_sets: usize,
    /// Sets skipped because the keeper vanished or changed.
    pub keeper_missing: usize,
    /// Sets not started because of shutdown.
    pub unvisited_sets: usize,
    /// Removals suppressed by dry-run.
    pub would_remove: usize,
    /// Bytes freed by successful removals.
    pub bytes_freed: u64,
    /// Whether the run was interrupted.
    pub interrupted: bool,
}

impl ResolveSummary {
    /// Whether anything went wrong that the user should hear about.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.failed > 0 || self.keeper_missing > 0
    }

    /// Freed space as a human-readable string.
    #[must_use]
    pub fn bytes_freed_display(&self) -> String {
        ByteSize::b(self.bytes_freed).to_string()
    }
}

impl fmt::Display for ResolveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} removed / {} candidates", self.removed, self.candidates)
    }
}

/// Per-set counters merged into the summary.
#[derive(Debug, Default)]
struct SetTally {
    failed: usize,
    skipped: bool,
    keeper_missing: bool,
    would_remove: usize,
    bytes_freed: u64,
}

/// Resolves duplicate sets against a prompter and a reporter.
pub struct Resolver<'a> {
    config: ResolverConfig,
    confirmer: Confirmer<'a>,
    reporter: &'a Reporter,
}

impl<'a> Resolver<'a> {
    /// Create a resolver.
    #[must_use]
    pub fn new(config: ResolverConfig, prompter: &'a dyn Prompter, reporter: &'a Reporter) -> Self {
        Self {
            config,
            confirmer: Confirmer::new(prompter),
            reporter,
        }
    }

    /// Resolve every set, starting in `mode`.
    ///
    /// Returns once all started sets have finished. The summary's
    /// `removed` equals the number of files actually removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started.
    pub fn resolve(
        &self,
        sets: &[DuplicateSet],
        mode: ConfirmMode,
    ) -> Result<ResolveSummary, rayon::ThreadPoolBuildError> {
        let state = RunState::new(mode);
        let candidates: usize = sets.iter().map(DuplicateSet::len).sum();
        let visited = AtomicUsize::new(0);

        log::info!(
            "Resolving {} duplicate sets ({} candidates, {} workers, method: {}{})",
            sets.len(),
            candidates,
            self.config.workers,
            self.config.method,
            if self.config.dry_run { ", dry run" } else { "" }
        );

        let pool = worker_pool(self.config.workers)?;
        let tallies: Vec<SetTally> = pool.install(|| {
            sets.par_iter()
                .filter_map(|set| {
                    if self.config.is_shutdown_requested() {
                        return None;
                    }
                    visited.fetch_add(1, Ordering::SeqCst);
                    Some(self.resolve_set(set, &state))
                })
                .collect()
        });

        let mut summary = ResolveSummary {
            removed: state.deleted(),
            candidates,
            ..Default::default()
        };
        for tally in tallies {
            summary.failed += tally.failed;
            summary.would_remove += tally.would_remove;
            summary.bytes_freed += tally.bytes_freed;
            if tally.skipped {
                summary.skipped_sets += 1;
            }
            if tally.keeper_missing {
                summary.keeper_missing += 1;
            }
        }
        summary.unvisited_sets = sets.len() - visited.load(Ordering::SeqCst);
        summary.interrupted = self.config.is_shutdown_requested();

        log::info!(
            "Resolution complete: {} ({} freed, {} failed, {} sets skipped)",
            summary,
            summary.bytes_freed_display(),
            summary.failed,
            summary.skipped_sets
        );

        Ok(summary)
    }

    fn resolve_set(&self, set: &DuplicateSet, state: &RunState) -> SetTally {
        let mut tally = SetTally::default();
        let mut block = self.reporter.open_block(set, &self.config.exclusions);

        let keeper = set.keeper();
        let targets: Vec<&PathBuf> = set
            .removals()
            .iter()
            .filter(|p| p.as_path() != keeper && !self.config.exclusions.contains(p))
            .collect();

        let question = format!("Delete {} file(s)? [Y/n/a] ", targets.len());
        let decision = self.confirmer.confirm(state, &question, || {
            self.reporter.flush(&mut block);
        });

        match decision {
            Decision::Confirmed => {}
            Decision::Declined => {
                log::debug!("Set {} declined", set.digest_hex());
                self.reporter.skipped(&mut block, "declined");
                self.reporter.flush(&mut block);
                tally.skipped = true;
                return tally;
            }
            Decision::Unanswered(reason) => {
                self.reporter.skipped(&mut block, &reason);
                self.reporter.flush(&mut block);
                tally.skipped = true;
                return tally;
            }
        }

        // Ctrl+C does not unblock a pending prompt; the answer may arrive after it
        if self.config.is_shutdown_requested() {
            log::info!("Set {} not resolved: interrupted", set.digest_hex());
            self.reporter.skipped(&mut block, "interrupted");
            self.reporter.flush(&mut block);
            tally.skipped = true;
            return tally;
        }

        if let Err(e) = verify_keeper(keeper, set.size()) {
            log::warn!("Skipping set: {}", e);
            self.reporter.skipped(&mut block, &e.to_string());
            self.reporter.flush(&mut block);
            tally.skipped = true;
            tally.keeper_missing = true;
            return tally;
        }

        let mut seen = HashSet::new();
        for target in targets {
            if !seen.insert(target) {
                continue;
            }
            if self.config.dry_run {
                self.reporter.would_delete(&mut block, target);
                tally.would_remove += 1;
                continue;
            }
            match delete_checked(target, set.size(), self.config.method) {
                Ok(result) => {
                    state.record_deletion();
                    tally.bytes_freed += result.size;
                    self.reporter.deleted(&mut block, target);
                }
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", target.display(), e);
                    tally.failed += 1;
                    self.reporter.failed(&mut block, target, &e.to_string());
                }
            }
        }

        self.reporter.flush(&mut block);
        tally
    }
}
