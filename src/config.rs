//! Layered configuration.
//!
//! Sources are merged with figment, later ones winning:
//!
//! 1. Built-in defaults
//! 2. TOML file: `--config FILE`, else `config.toml` in the platform config dir
//! 3. Environment variables prefixed `DUPSWEEP_` (e.g. `DUPSWEEP_WORKERS=8`)
//! 4. Command-line flags (applied by [`crate::cli`])
//!
//! ```toml
//! profile = "solid-state"
//! workers = 12
//! recursive = true
//! exclude = ["/data/backups/manifest.bin"]
//! bfs_batch_size = 100
//! trash = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ProfileArg;
use crate::scanner::DEFAULT_BFS_BATCH_SIZE;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Errors from loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly named configuration file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be parsed or has a wrongly typed key.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The effective configuration could not be rendered.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage profile selector.
    pub profile: ProfileArg,
    /// Worker pool size; unset means the profile default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Paths never scanned or removed.
    pub exclude: Vec<PathBuf>,
    /// Directories per breadth-first batch.
    pub bfs_batch_size: usize,
    /// Move removed files to the recycle bin.
    pub trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: ProfileArg::Auto,
            workers: None,
            recursive: false,
            exclude: Vec::new(),
            bfs_batch_size: DEFAULT_BFS_BATCH_SIZE,
            trash: false,
        }
    }
}

impl Config {
    /// Defaults merged with a TOML file, without the environment layer.
    ///
    /// With `file == None` the platform config file is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if an explicit `file` does not exist.
    pub fn figment(file: Option<&Path>) -> Result<Figment, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        match file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Ok(figment.merge(Toml::file(path)))
            }
            None => match Self::default_path() {
                Some(path) => {
                    log::debug!("Using config file {}", path.display());
                    Ok(figment.merge(Toml::file(path)))
                }
                None => Ok(figment),
            },
        }
    }

    /// Load defaults, the TOML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source is missing, malformed or mistyped.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(file)?
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;
        log::debug!("Effective configuration: {:?}", config);
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns `Render` if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Platform-specific configuration file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "dupsweep", "dupsweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
