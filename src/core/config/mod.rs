//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! The first file found wins:
//! 1. Explicit path (`--config`); must exist
//! 2. `$WHAWTY_GROUPS_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/whawty-groups/config.toml`
//! 4. `~/.whawty-groups/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use whawty_groups::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! if let Some(store) = config.store() {
//!     println!("store: {}", store.display());
//! }
//! println!("debug: {}", config.debug());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::ops::atomic::DEFAULT_GC_MAX_AGE;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "WHAWTY_GROUPS_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Effective configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: FileConfig,
    /// Path the file was loaded from, if any
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` cannot be read, or if a config file
    /// exists but cannot be parsed. Missing default files are not an error.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::search_paths().into_iter().find(|p| p.exists()),
        };

        match path {
            Some(path) => Self::load_file(&path),
            None => Ok(Config::default()),
        }
    }

    /// Read, parse and validate one config file.
    pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Config {
            file,
            path: Some(path.to_path_buf()),
        })
    }

    /// Default locations, most specific first.
    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            paths.push(PathBuf::from(path));
        }
        if let Some(xdg_home) = std::env::var_os("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_home).join("whawty-groups/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".whawty-groups/config.toml"));
        }
        paths
    }

    /// Configured store root.
    pub fn store(&self) -> Option<&Path> {
        self.file.store.as_deref()
    }

    /// Whether debug logging is enabled. Defaults to `false`.
    pub fn debug(&self) -> bool {
        self.file.debug.unwrap_or(false)
    }

    /// Staging garbage age threshold. Defaults to one hour.
    pub fn gc_max_age(&self) -> Duration {
        self.file
            .gc_max_age_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GC_MAX_AGE)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
