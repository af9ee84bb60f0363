//! dupsweep - storage-aware duplicate file remover
//!
//! Finds byte-identical files beneath a root directory and removes all but
//! one copy of each. Candidates are narrowed by size, then by a bounded-cost
//! sample digest (XxHash64), and confirmed by a full BLAKE3 digest before
//! anything is removed. Traversal and sampling adapt to the seek cost of the
//! underlying storage.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pool;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod storage;

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{ConfirmMode, DeleteMethod, Resolver, ResolverConfig, StdinPrompter};
use crate::cli::{Cli, Commands, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateSet, FinderConfig, ScanSummary};
use crate::error::ExitCode;
use crate::output::Reporter;
use crate::progress::Progress;
use crate::scanner::ExclusionSet;
use crate::signal::ShutdownHandler;

/// Options of a dedup run that do not come from the configuration.
#[derive(Debug, Clone, Copy, Default)]
struct DedupOptions {
    yes: bool,
    dry_run: bool,
}

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions: invalid configuration, an invalid
/// root directory, or an interrupted scan.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let color = !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Commands::Config(args) => {
            let config = Config::load(args.config.as_deref())?;
            print!("{}", config.to_toml()?);
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => {
            let mut config = Config::load(args.config.as_deref())?;
            args.apply(&mut config);
            run_pipeline(&args, &config, None, cli.quiet, color)
        }
        Commands::Dedup(args) => {
            let mut config = Config::load(args.scan.config.as_deref())?;
            args.apply(&mut config);
            let options = DedupOptions {
                yes: args.yes,
                dry_run: args.dry_run,
            };
            run_pipeline(&args.scan, &config, Some(options), cli.quiet, color)
        }
    }
}

fn exclusions_for(config: &Config) -> ExclusionSet {
    let mut exclusions: ExclusionSet = config.exclude.iter().collect();
    match std::env::current_exe() {
        Ok(exe) => exclusions.insert(exe),
        Err(e) => log::warn!("Cannot resolve own executable path: {}", e),
    }
    exclusions
}

fn run_pipeline(
    args: &ScanArgs,
    config: &Config,
    dedup: Option<DedupOptions>,
    quiet: bool,
    color: bool,
) -> Result<ExitCode> {
    let handler = signal::install_handler();
    let profile = config.profile.resolve(&args.path);
    let exclusions = exclusions_for(config);

    let mut finder_config = FinderConfig::default()
        .with_profile(profile)
        .with_recursive(config.recursive)
        .with_bfs_batch_size(config.bfs_batch_size)
        .with_exclusions(exclusions.clone())
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(Arc::new(Progress::new(quiet)));
    if let Some(workers) = config.workers {
        finder_config = finder_config.with_workers(workers);
    }
    let workers = finder_config.effective_workers();

    let finder = DuplicateFinder::new(finder_config);
    let (sets, summary) = finder
        .find_duplicates(&args.path)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;

    let reporter = Reporter::stdout(&summary.root, color);

    let Some(options) = dedup else {
        report_sets(&reporter, &sets, &summary, &exclusions);
        return Ok(if summary.warning_count() > 0 {
            ExitCode::PartialSuccess
        } else {
            ExitCode::Success
        });
    };

    let method = if config.trash {
        DeleteMethod::Trash
    } else {
        DeleteMethod::Permanent
    };
    let resolver_config = ResolverConfig::default()
        .with_workers(workers)
        .with_method(method)
        .with_dry_run(options.dry_run)
        .with_exclusions(exclusions)
        .with_shutdown_flag(handler.get_flag());
    let mode = if options.yes {
        ConfirmMode::AutoAll
    } else {
        ConfirmMode::Manual
    };

    let prompter = StdinPrompter;
    let resolver = Resolver::new(resolver_config, &prompter, &reporter);
    let resolved = resolver
        .resolve(&sets, mode)
        .context("Failed to start resolver")?;

    reporter.line(&resolved.to_string());
    Ok(exit_code(&handler, &summary, resolved.has_warnings()))
}

fn report_sets(
    reporter: &Reporter,
    sets: &[DuplicateSet],
    summary: &ScanSummary,
    exclusions: &ExclusionSet,
) {
    for set in sets {
        let mut block = reporter.open_block(set, exclusions);
        reporter.flush(&mut block);
    }
    reporter.line(&format!(
        "{} duplicate sets, {} redundant files, {} reclaimable",
        summary.duplicate_sets,
        summary.duplicate_files,
        summary.reclaimable_display()
    ));
}

fn exit_code(handler: &ShutdownHandler, summary: &ScanSummary, resolve_warnings: bool) -> ExitCode {
    if handler.is_shutdown_requested() {
        ExitCode::Interrupted
    } else if resolve_warnings || summary.warning_count() > 0 {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

