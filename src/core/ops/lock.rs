//! core::ops::lock
//!
//! Advisory file locks guarding read-modify-write cycles on the store.
//!
//! # Architecture
//!
//! Locks are OS-level advisory locks taken through `fs2`. They work across
//! processes and across separately opened handles in one process, so two
//! threads of the same program contend exactly like two programs do.
//!
//! Three locks exist, always acquired in this order:
//!
//! 1. `<root>/.tmp/store.lock` - shared by edge mutations, exclusive for
//!    entity removal (cascade)
//! 2. `<root>/.tmp/graph.lock` - exclusive for group-to-group insertions
//! 3. `<root>/groups/<group>/.lock` - exclusive for a membership list update
//!
//! # Invariants
//!
//! - Lock is automatically released on drop (RAII pattern)
//! - [`RecordLock::acquire`] blocks until granted
//! - Lock files are created on demand, their directories never are
//! - Lock files are never deleted while the store is live
//!
//! # Example
//!
//! ```ignore
//! use whawty_groups::core::ops::lock::{self, LockMode};
//!
//! let _store = lock::store_lock(&paths, LockMode::Shared)?;
//! let _group = lock::group_lock(&paths, &admins)?;
//! // read-modify-write the membership list
//! ```

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::StorePaths;
use crate::core::types::EntityName;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// The directory the lock file lives in does not exist.
    #[error("lock directory does not exist: {}", .0.display())]
    Missing(PathBuf),

    /// Failed to create lock file or directory.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// Shared or exclusive locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// A held advisory lock on one lock file.
///
/// The lock is automatically released when this guard is dropped.
#[derive(Debug)]
pub struct RecordLock {
    path: PathBuf,
    file: File,
}

impl RecordLock {
    /// Acquire a lock on `path`, waiting until it is granted.
    ///
    /// The lock file is created if needed; its parent directory is not.
    ///
    /// # Errors
    ///
    /// - [`LockError::Missing`] if the parent directory does not exist
    /// - [`LockError::CreateFailed`] if the lock file cannot be opened
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(path: &Path, mode: LockMode) -> Result<Self, LockError> {
        let file = open_lock_file(path)?;
        let locked = match mode {
            LockMode::Shared => FileExt::lock_shared(&file),
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
        };
        locked.map_err(|e| LockError::AcquireFailed(format!("{}: {}", path.display(), e)))?;
        tracing::trace!(lock = %path.display(), ?mode, "lock acquired");

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                LockError::Missing(path.parent().unwrap_or(path).to_path_buf())
            }
            _ => LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e)),
        })
}

/// Acquire the store-wide lock.
///
/// Fails with [`LockError::Missing`] when the staging directory is absent.
pub fn store_lock(paths: &StorePaths, mode: LockMode) -> Result<RecordLock, LockError> {
    RecordLock::acquire(&paths.store_lock_path(), mode)
}

/// Acquire the exclusive lock serializing group-to-group edge insertions.
pub fn graph_lock(paths: &StorePaths) -> Result<RecordLock, LockError> {
    RecordLock::acquire(&paths.graph_lock_path(), LockMode::Exclusive)
}

/// Acquire the exclusive lock on one group's membership list.
///
/// Fails with [`LockError::Missing`] when the group directory is absent.
pub fn group_lock(paths: &StorePaths, group: &EntityName) -> Result<RecordLock, LockError> {
    RecordLock::acquire(&paths.group_lock_path(group), LockMode::Exclusive)
}
