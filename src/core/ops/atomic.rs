//! core::ops::atomic
//!
//! Crash-safe create and replace for on-disk records.
//!
//! # Architecture
//!
//! Every write goes through the staging directory (`<root>/.tmp`):
//!
//! 1. The payload is written to a fresh, uniquely named staging file
//! 2. The file is flushed with `sync_all`
//! 3. A single rename (or hard link) moves it into place
//!
//! Readers therefore see either the old record or the new one, never a
//! truncated file. A process dying between steps leaves at most an orphan
//! in the staging directory, which [`Staging::collect_garbage`] removes.
//!
//! # Publishing modes
//!
//! - [`StagedFile::replace`] - rename over the target (membership updates)
//! - [`StagedFile::publish_new`] - install only if the target is absent
//!   (entity creation; exactly one of several racing writers wins)
//! - [`StagedDir::publish_new`] - rename a whole staged directory into place
//! - [`Staging::retire`] - move a target out of the way in one rename, then
//!   delete it
//!
//! # Fault Injection
//!
//! With `cfg(test)` or the `fault_injection` feature, [`fault_injection`]
//! can make a publish step fail after staging, leaving an orphan exactly
//! like a crash would, or make the cleanup after a successful publish fail.
//!
//! Once the rename or link has happened the record is in place; failures
//! of the follow-up steps (syncing the parent, removing the staged link)
//! are logged and never reported as a failed write.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::core::paths::LOCK_FILE;

/// Suffix of staged files awaiting publication.
const STAGED_FILE_SUFFIX: &str = ".staged";
/// Suffix of staged directories awaiting publication.
const STAGED_DIR_SUFFIX: &str = ".staged-dir";
/// Suffix of retired records awaiting deletion.
const RETIRED_SUFFIX: &str = ".retired";

/// Default age after which staging entries count as orphans.
pub const DEFAULT_GC_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// The staging area of one store.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Use `dir` as the staging directory.
    ///
    /// The directory must already exist and live on the same filesystem as
    /// every publish target, otherwise renames fail with a cross-device
    /// error. Nothing here creates it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The staging directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn fresh_path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{}", uuid::Uuid::new_v4(), suffix))
    }

    /// Write `payload` to a new staging file and sync it to disk.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error unchanged.
    pub fn stage(&self, payload: &[u8]) -> io::Result<StagedFile> {
        let path = self.fresh_path(STAGED_FILE_SUFFIX);
        let staged = StagedFile {
            path,
            published: false,
        };
        write_synced(&staged.path, payload)?;
        Ok(staged)
    }

    /// Create an empty staging directory to assemble a multi-file record in.
    pub fn stage_dir(&self) -> io::Result<StagedDir> {
        let path = self.fresh_path(STAGED_DIR_SUFFIX);
        fs::create_dir(&path)?;
        Ok(StagedDir {
            path,
            published: false,
        })
    }

    /// Remove `target` (file or directory) atomically.
    ///
    /// The target is first renamed into the staging area, so observers see
    /// it vanish in one step, then deleted. Returns `false` if the target
    /// did not exist.
    pub fn retire(&self, target: &Path) -> io::Result<bool> {
        let graveyard = self.fresh_path(RETIRED_SUFFIX);
        match fs::rename(target, &graveyard) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        }
        after_publish(target, "sync parent", || sync_parent(target));
        after_publish(target, "delete retired record", || remove_any(&graveyard));
        Ok(true)
    }

    /// Delete staging entries older than `max_age`.
    ///
    /// Lock files are never touched. Entries younger than `max_age` may
    /// belong to writers still in flight and are left alone. Returns the
    /// number of entries removed.
    pub fn collect_garbage(&self, max_age: Duration) -> io::Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(LOCK_FILE) {
                continue;
            }

            let modified = match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age < max_age {
                continue;
            }

            match remove_any(&entry.path()) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }
}

/// A synced payload in the staging area, not yet published.
///
/// Dropping an unpublished `StagedFile` deletes it.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    published: bool,
}

impl StagedFile {
    /// Location of the staged payload.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically rename the payload over `target`, replacing any record.
    pub fn replace(mut self, target: &Path) -> io::Result<()> {
        self.check_crash()?;
        fs::rename(&self.path, target)?;
        self.published = true;
        after_publish(target, "sync parent", || sync_parent(target));
        Ok(())
    }

    /// Install the payload at `target` only if nothing exists there.
    ///
    /// Uses a hard link, which fails with `AlreadyExists` instead of
    /// overwriting. Of several writers racing on one target exactly one
    /// succeeds.
    pub fn publish_new(mut self, target: &Path) -> io::Result<()> {
        self.check_crash()?;
        fs::hard_link(&self.path, target)?;
        self.published = true;
        after_publish(target, "remove staged link", || fs::remove_file(&self.path));
        after_publish(target, "sync parent", || sync_parent(target));
        Ok(())
    }

    fn check_crash(&mut self) -> io::Result<()> {
        #[cfg(any(test, feature = "fault_injection"))]
        if fault_injection::should_crash() {
            // A real crash would not clean up after itself.
            self.published = true;
            return Err(fault_injection::simulated_crash());
        }
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.published {
            let _ = fs::remove_file(&self.path);
        }
    }
}

/// A directory being assembled in the staging area.
///
/// Dropping an unpublished `StagedDir` deletes it with its contents.
#[derive(Debug)]
pub struct StagedDir {
    path: PathBuf,
    published: bool,
}

impl StagedDir {
    /// Location of the staged directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write and sync one file inside the staged directory.
    pub fn write_file(&self, name: &str, payload: &[u8]) -> io::Result<()> {
        write_synced(&self.path.join(name), payload)
    }

    /// Rename the staged directory to `target` if `target` is absent.
    ///
    /// An existing non-empty directory at `target` makes the rename fail;
    /// that failure is reported as `AlreadyExists`.
    pub fn publish_new(mut self, target: &Path) -> io::Result<()> {
        #[cfg(any(test, feature = "fault_injection"))]
        if fault_injection::should_crash() {
            self.published = true;
            return Err(fault_injection::simulated_crash());
        }

        sync_dir(&self.path)?;
        match fs::rename(&self.path, target) {
            Ok(()) => {
                self.published = true;
                after_publish(target, "sync parent", || sync_parent(target));
                Ok(())
            }
            Err(e) if target_exists(target) => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: {}", target.display(), e),
            )),
            Err(e) => Err(e),
        }
    }
}

impl Drop for StagedDir {
    fn drop(&mut self) {
        if !self.published {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

/// Run a step that follows a successful publish. The record is already in
/// place, so a failure only leaves garbage behind and is logged.
fn after_publish(target: &Path, step: &str, op: impl FnOnce() -> io::Result<()>) {
    #[cfg(any(test, feature = "fault_injection"))]
    if fault_injection::fail_after_publish() {
        tracing::warn!(path = %target.display(), step, "simulated failure after publish");
        return;
    }
    if let Err(e) = op() {
        tracing::warn!(path = %target.display(), step, error = %e, "step after publish failed");
    }
}

fn target_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn write_synced(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(payload)?;
    file.sync_all()
}

fn remove_any(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Flush a directory entry change to disk (Unix only).
#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => sync_dir(parent),
        _ => Ok(()),
    }
}

/// Crash simulation for testing recovery paths.
///
/// Uses thread-local storage, so each test thread has isolated state.
#[cfg(any(test, feature = "fault_injection"))]
pub mod fault_injection {
    use std::cell::Cell;
    use std::io;

    thread_local! {
        static CRASH_AFTER_PUBLISHES: Cell<usize> = const { Cell::new(0) };
        static PUBLISH_COUNT: Cell<usize> = const { Cell::new(0) };
        static FAIL_AFTER_PUBLISH: Cell<bool> = const { Cell::new(false) };
    }

    /// Fail the `n`-th publish attempt from now on. 0 disables.
    pub fn set_crash_after(n: usize) {
        CRASH_AFTER_PUBLISHES.with(|c| c.set(n));
        PUBLISH_COUNT.with(|c| c.set(0));
    }

    /// Check if the current publish should fail.
    pub fn should_crash() -> bool {
        CRASH_AFTER_PUBLISHES.with(|threshold| {
            let threshold = threshold.get();
            if threshold == 0 {
                return false;
            }
            PUBLISH_COUNT.with(|count| {
                let next = count.get() + 1;
                count.set(next);
                next >= threshold
            })
        })
    }

    /// Make every step following a successful publish fail (and be skipped).
    pub fn set_fail_after_publish(fail: bool) {
        FAIL_AFTER_PUBLISH.with(|f| f.set(fail));
    }

    pub(super) fn fail_after_publish() -> bool {
        FAIL_AFTER_PUBLISH.with(Cell::get)
    }

    /// Reset fault injection state.
    pub fn reset() {
        set_crash_after(0);
        set_fail_after_publish(false);
    }

    pub(super) fn simulated_crash() -> io::Error {
        io::Error::new(
            io::ErrorKind::Other,
            "simulated crash for fault injection testing",
        )
    }
}
