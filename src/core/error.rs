//! core::error
//!
//! The error type returned by every store operation.
//!
//! # Propagation
//!
//! - Validation errors (`InvalidName`, `UnknownUser`, `UnknownGroup`,
//!   `CycleDetected`) are returned as-is and never retried
//! - I/O failures from the staging area surface unchanged as `Io`
//! - Removals are idempotent and do not fail on absent targets

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::ops::lock::LockError;
use super::types::{EntityKind, TypeError};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The name violates the naming rule.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A user or group with this name already exists.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: EntityKind, name: String },

    /// The referenced user does not exist.
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// The referenced group does not exist.
    #[error("unknown group '{0}'")]
    UnknownGroup(String),

    /// Adding `member` to `group` would make a group contain itself.
    #[error("adding group '{member}' to group '{group}' would create a cycle")]
    CycleDetected { group: String, member: String },

    /// `Init` found entries in the base directory.
    #[error("'{}' is not empty", .0.display())]
    NotEmpty(PathBuf),

    /// The base path exists but is not a directory.
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The store root does not have the expected layout.
    #[error("corrupt store layout: {0}")]
    CorruptLayout(String),

    /// A record exists but cannot be parsed.
    #[error("corrupt record '{}': {message}", .path.display())]
    CorruptRecord { path: PathBuf, message: String },

    /// Acquiring or releasing an advisory lock failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Underlying I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    pub(crate) fn unknown(kind: EntityKind, name: impl Into<String>) -> Self {
        match kind {
            EntityKind::User => StoreError::UnknownUser(name.into()),
            EntityKind::Group => StoreError::UnknownGroup(name.into()),
        }
    }
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidName { name, reason } => StoreError::InvalidName { name, reason },
        }
    }
}

/// Result alias for store operations.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
