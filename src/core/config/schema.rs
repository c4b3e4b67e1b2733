//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing; unknown keys are rejected while
//! parsing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Settings file contents.
///
/// # Example
///
/// ```toml
/// store = "/var/lib/whawty/groups"
/// debug = false
/// gc_max_age_secs = 3600
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Store root directory
    pub store: Option<PathBuf>,

    /// Enable debug logging
    pub debug: Option<bool>,

    /// Age in seconds after which staging leftovers are collected
    pub gc_max_age_secs: Option<u64>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gc_max_age_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "gc_max_age_secs must be greater than zero".to_string(),
            ));
        }
        if let Some(store) = &self.store {
            if store.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue("store must not be empty".to_string()));
            }
        }
        Ok(())
    }
}
