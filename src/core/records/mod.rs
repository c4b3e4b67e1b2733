//! core::records
//!
//! On-disk user and group records.
//!
//! # Modules
//!
//! - [`schema`] - YAML formats for metadata and membership lists
//! - [`user`] - One file per user
//! - [`group`] - One directory per group (metadata + membership list)
//!
//! # Architecture
//!
//! [`Records`] is the only handle higher layers use to reach the disk. It
//! pairs the path router with the staging area, hands out per-entity
//! record views, and takes the store-level locks. The membership graph
//! code never builds a path itself.
//!
//! The staging directory is created lazily, and only below a root that
//! already has the store layout. A write aimed at a directory that is not
//! a store fails with `CorruptLayout` and leaves that directory as it was.

pub mod group;
pub mod schema;
pub mod user;

pub use group::GroupRecord;
pub use schema::{MemberList, RecordMeta};
pub use user::UserRecord;

use std::fs;
use std::io;
use std::path::Path;

use crate::core::error::{Result, StoreError};
use crate::core::ops::atomic::Staging;
use crate::core::ops::lock::{self, LockMode, RecordLock};
use crate::core::paths::StorePaths;
use crate::core::types::{EntityKind, EntityName};

/// Access to all records of one store.
#[derive(Debug, Clone)]
pub struct Records {
    paths: StorePaths,
    staging: Staging,
}

impl Records {
    /// Records of the store described by `paths`.
    pub fn new(paths: StorePaths) -> Self {
        let staging = Staging::new(paths.staging_dir());
        Self { paths, staging }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// The staging area, created on first use.
    ///
    /// # Errors
    ///
    /// `CorruptLayout` if the root lacks `users/` or `groups/`; nothing is
    /// created then.
    pub fn staging(&self) -> Result<&Staging> {
        self.ensure_staging()?;
        Ok(&self.staging)
    }

    fn ensure_staging(&self) -> Result<()> {
        fs::metadata(self.paths.root())?;
        for dir in [self.paths.users_dir(), self.paths.groups_dir()] {
            if !stat(&dir)?.is_some_and(|meta| meta.is_dir()) {
                return Err(StoreError::CorruptLayout(format!(
                    "'{}' is missing or not a directory",
                    dir.display()
                )));
            }
        }
        match fs::create_dir(self.paths.staging_dir()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// View of one user record.
    pub fn user<'a>(&'a self, name: &'a EntityName) -> UserRecord<'a> {
        UserRecord::new(self, name)
    }

    /// View of one group record.
    pub fn group<'a>(&'a self, name: &'a EntityName) -> GroupRecord<'a> {
        GroupRecord::new(self, name)
    }

    /// Whether an entity of the given kind exists.
    pub fn exists(&self, kind: EntityKind, name: &EntityName) -> Result<bool> {
        match kind {
            EntityKind::User => self.user(name).exists(),
            EntityKind::Group => self.group(name).exists(),
        }
    }

    /// All user names, sorted.
    pub fn users(&self) -> Result<Vec<EntityName>> {
        list_names(&self.paths.users_dir())
    }

    /// All group names, sorted.
    pub fn groups(&self) -> Result<Vec<EntityName>> {
        list_names(&self.paths.groups_dir())
    }

    /// Take the store-wide lock.
    pub fn lock_store(&self, mode: LockMode) -> Result<RecordLock> {
        self.ensure_staging()?;
        Ok(lock::store_lock(&self.paths, mode)?)
    }

    /// Take the lock serializing group-to-group edge insertions.
    pub fn lock_graph(&self) -> Result<RecordLock> {
        self.ensure_staging()?;
        Ok(lock::graph_lock(&self.paths)?)
    }
}

/// Entry names of `dir` that are valid entity names, sorted.
///
/// Anything else (lock files, editor droppings) is skipped here and
/// reported by verification instead.
fn list_names(dir: &Path) -> Result<Vec<EntityName>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if let Ok(name) = EntityName::new(name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// `fs::metadata`, mapping not-found to `None`.
pub(crate) fn stat(path: &Path) -> io::Result<Option<fs::Metadata>> {
    match fs::metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
