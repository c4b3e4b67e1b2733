//! core::ops
//!
//! Low-level write and locking primitives.
//!
//! # Modules
//!
//! - [`atomic`] - Staging area with crash-safe publish/replace/retire
//! - [`lock`] - Cross-process advisory locks
//!
//! # Architecture
//!
//! Every mutation of a membership list:
//! 1. Acquires the locks it needs (store, graph, group, in that order)
//! 2. Reads the current record
//! 3. Stages the new record and syncs it
//! 4. Renames the staged record into place
//! 5. Drops the locks
//!
//! Nothing is ever modified in place, so an interrupted process leaves the
//! previous record intact.

pub mod atomic;
pub mod lock;

pub use atomic::{StagedDir, StagedFile, Staging};
pub use lock::{LockError, LockMode, RecordLock};
