//! Command-line interface definitions for dupsweep.
//!
//! The CLI uses the clap derive API: global options (verbosity, color, error
//! format) plus one subcommand per operation.
//!
//! # Example
//!
//! ```bash
//! # Remove duplicates below the current directory, asking per set
//! dupsweep dedup -r
//!
//! # Remove without asking, forcing the solid-state profile
//! dupsweep dedup ~/photos -r -y --profile solid-state
//!
//! # Only report duplicate sets
//! dupsweep scan ~/Downloads -r
//!
//! # Show the effective configuration
//! dupsweep config
//! ```

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::storage::{detect_profile, StorageProfile};

/// Find byte-identical files and keep exactly one copy of each.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicates and remove all but one copy of each
    Dedup(DedupArgs),
    /// Find duplicates and report them without removing anything
    Scan(ScanArgs),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

/// Storage profile selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileArg {
    /// Detect from the disk holding the root
    #[default]
    Auto,
    /// Rotating media: locality-ordered walk, head/tail sampling
    Rotating,
    /// Solid-state media: fan-out walk, strided sampling
    SolidState,
}

impl ProfileArg {
    /// Resolve to a concrete profile for `root`.
    #[must_use]
    pub fn resolve(self, root: &Path) -> StorageProfile {
        match self {
            Self::Auto => detect_profile(root),
            Self::Rotating => StorageProfile::Rotating,
            Self::SolidState => StorageProfile::SolidState,
        }
    }
}

/// Arguments shared by `scan` and `dedup`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Root directory to search
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Storage profile of the root
    #[arg(long, value_enum, value_name = "PROFILE")]
    pub profile: Option<ProfileArg>,

    /// Worker pool size (default: 4 rotating, 10 solid-state)
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Path that must never be scanned or removed (repeatable)
    #[arg(long, value_name = "PATH")]
    pub exclude: Vec<PathBuf>,

    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ScanArgs {
    /// Apply these flags on top of a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if self.recursive {
            config.recursive = true;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(usize::from(workers));
        }
        config.exclude.extend(self.exclude.iter().cloned());
    }
}

/// Arguments for the dedup subcommand.
#[derive(Debug, Args)]
pub struct DedupArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Confirm every set without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Move removed files to the recycle bin instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Report what would be removed without touching anything
    #[arg(long)]
    pub dry_run: bool,
}

impl DedupArgs {
    /// Apply these flags on top of a loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        self.scan.apply(config);
        if self.trash {
            config.trash = true;
        }
    }
}

/// Arguments for the config subcommand.
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
