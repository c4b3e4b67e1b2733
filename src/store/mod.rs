//! store
//!
//! The public entry point: one [`Store`] per store root.
//!
//! # Architecture
//!
//! `Store` validates caller input into [`EntityName`]s, then delegates to
//! [`Records`] for entity files and to [`Membership`] for edges. Every
//! operation runs under the store's logging dispatcher, if one was
//! injected with [`Store::with_logger`].
//!
//! # Example
//!
//! ```no_run
//! use whawty_groups::Store;
//!
//! let store = Store::open("/var/lib/whawty/groups")?;
//! store.add_user("alice")?;
//! store.add_group("staff")?;
//! store.add_user_member("staff", "alice")?;
//! assert_eq!(store.effective_users("staff")?.len(), 1);
//! # Ok::<(), whawty_groups::StoreError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, Dispatch};

use crate::core::error::{Result, StoreError};
use crate::core::membership::Membership;
use crate::core::ops::lock::LockMode;
use crate::core::paths::StorePaths;
use crate::core::records::{MemberList, Records};
use crate::core::types::{EntityKind, EntityName, Member, UtcTimestamp};
use crate::core::verify::{self, VerifyReport};

/// Metadata of one user.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub name: EntityName,
    pub changed: UtcTimestamp,
}

/// Metadata and direct members of one group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupInfo {
    pub name: EntityName,
    pub changed: UtcTimestamp,
    pub members: Vec<Member>,
}

/// A user/group store rooted at one directory.
#[derive(Debug, Clone)]
pub struct Store {
    records: Records,
    dispatch: Option<Dispatch>,
}

impl Store {
    /// Handle on the store at `root`. Nothing is checked or created.
    ///
    /// Logs go to whatever dispatcher is current when an operation runs.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            records: Records::new(StorePaths::new(root)),
            dispatch: None,
        }
    }

    /// Like [`Store::new`], but every operation logs to `dispatch`.
    pub fn with_logger(root: impl Into<PathBuf>, dispatch: Dispatch) -> Self {
        Self {
            records: Records::new(StorePaths::new(root)),
            dispatch: Some(dispatch),
        }
    }

    /// Open an existing store, checking its layout.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        store.check()?;
        Ok(store)
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        self.records.paths().root()
    }

    fn run<T>(&self, op: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, op),
            None => op(),
        }
    }

    fn membership(&self) -> Membership<'_> {
        Membership::new(&self.records)
    }

    // =========================================================================
    // Store root
    // =========================================================================

    /// Create the store layout in an existing, empty directory.
    ///
    /// # Errors
    ///
    /// - `Io` if the root does not exist
    /// - `NotADirectory` if the root is not a directory
    /// - `NotEmpty` if the root has any entry
    pub fn init(&self) -> Result<()> {
        self.run(|| {
            let paths = self.records.paths();
            let root = paths.root();
            if !fs::metadata(root)?.is_dir() {
                return Err(StoreError::NotADirectory(root.to_path_buf()));
            }
            if fs::read_dir(root)?.next().is_some() {
                return Err(StoreError::NotEmpty(root.to_path_buf()));
            }

            for dir in [paths.users_dir(), paths.groups_dir(), paths.staging_dir()] {
                create_private_dir(&dir)?;
            }
            info!(root = %root.display(), "initialized store");
            Ok(())
        })
    }

    /// Check the store layout.
    pub fn check(&self) -> Result<()> {
        self.run(|| verify::check_layout(self.records.paths()))
    }

    /// Check the layout, then scan every record for inconsistencies.
    pub fn verify(&self) -> Result<VerifyReport> {
        self.run(|| {
            verify::check_layout(self.records.paths())?;
            let report = verify::verify(&self.records)?;
            debug!(issues = report.issues.len(), "verified store");
            Ok(report)
        })
    }

    /// Delete staging leftovers older than `max_age`.
    pub fn collect_garbage(&self, max_age: Duration) -> Result<usize> {
        self.run(|| {
            let removed = self.records.staging()?.collect_garbage(max_age)?;
            if removed > 0 {
                info!(removed, "collected staging garbage");
            }
            Ok(removed)
        })
    }

    // =========================================================================
    // Entities
    // =========================================================================

    pub fn user_exists(&self, name: &str) -> Result<bool> {
        let name = EntityName::new(name)?;
        self.run(|| self.records.user(&name).exists())
    }

    pub fn group_exists(&self, name: &str) -> Result<bool> {
        let name = EntityName::new(name)?;
        self.run(|| self.records.group(&name).exists())
    }

    /// Create a user.
    ///
    /// # Errors
    ///
    /// `InvalidName` or `AlreadyExists`.
    pub fn add_user(&self, name: &str) -> Result<()> {
        let name = EntityName::new(name)?;
        self.run(|| {
            self.records.user(&name).add()?;
            info!(user = %name, "added user");
            Ok(())
        })
    }

    /// Create a group with no members.
    ///
    /// # Errors
    ///
    /// `InvalidName` or `AlreadyExists`.
    pub fn add_group(&self, name: &str) -> Result<()> {
        let name = EntityName::new(name)?;
        self.run(|| {
            self.records.group(&name).add()?;
            info!(group = %name, "added group");
            Ok(())
        })
    }

    /// Remove a user and every membership edge naming it.
    ///
    /// Returns `false` if the user did not exist.
    pub fn remove_user(&self, name: &str) -> Result<bool> {
        let name = EntityName::new(name)?;
        self.run(|| self.remove_entity(EntityKind::User, &name))
    }

    /// Remove a group and every membership edge naming it.
    ///
    /// Returns `false` if the group did not exist.
    pub fn remove_group(&self, name: &str) -> Result<bool> {
        let name = EntityName::new(name)?;
        self.run(|| self.remove_entity(EntityKind::Group, &name))
    }

    fn remove_entity(&self, kind: EntityKind, name: &EntityName) -> Result<bool> {
        let _store = self.records.lock_store(LockMode::Exclusive)?;
        self.membership().purge_member(&Member::new(kind, name.clone()))?;
        let removed = match kind {
            EntityKind::User => self.records.user(name).remove()?,
            EntityKind::Group => self.records.group(name).remove()?,
        };
        if removed {
            info!(%kind, %name, "removed entity");
        } else {
            debug!(%kind, %name, "remove: entity was absent");
        }
        Ok(removed)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Add `user` to `group`. Returns `false` if it already was a member.
    pub fn add_user_member(&self, group: &str, user: &str) -> Result<bool> {
        let (group, user) = (EntityName::new(group)?, EntityName::new(user)?);
        self.run(|| self.membership().add_user_member(&group, &user))
    }

    /// Remove `user` from `group`. Returns `false` if there was no such edge.
    pub fn remove_user_member(&self, group: &str, user: &str) -> Result<bool> {
        let (group, user) = (EntityName::new(group)?, EntityName::new(user)?);
        self.run(|| self.membership().remove_user_member(&group, &user))
    }

    /// Nest `subgroup` inside `group`.
    ///
    /// # Errors
    ///
    /// `CycleDetected` if `group` is already nested inside `subgroup`.
    pub fn add_group_member(&self, group: &str, subgroup: &str) -> Result<bool> {
        let (group, subgroup) = (EntityName::new(group)?, EntityName::new(subgroup)?);
        self.run(|| self.membership().add_group_member(&group, &subgroup))
    }

    /// Remove `subgroup` from `group`. Returns `false` if there was no such edge.
    pub fn remove_group_member(&self, group: &str, subgroup: &str) -> Result<bool> {
        let (group, subgroup) = (EntityName::new(group)?, EntityName::new(subgroup)?);
        self.run(|| self.membership().remove_group_member(&group, &subgroup))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All users, sorted.
    pub fn users(&self) -> Result<Vec<EntityName>> {
        self.run(|| self.records.users())
    }

    /// All groups, sorted.
    pub fn groups(&self) -> Result<Vec<EntityName>> {
        self.run(|| self.records.groups())
    }

    /// Direct members of `group`.
    pub fn members(&self, group: &str) -> Result<MemberList> {
        let group = EntityName::new(group)?;
        self.run(|| self.records.group(&group).members())
    }

    /// Groups that directly contain the entity `(name, kind)`.
    pub fn memberships(&self, name: &str, kind: EntityKind) -> Result<Vec<EntityName>> {
        let name = EntityName::new(name)?;
        self.run(|| {
            if !self.records.exists(kind, &name)? {
                return Err(StoreError::unknown(kind, name.as_str()));
            }
            self.membership().memberships(&Member::new(kind, name.clone()))
        })
    }

    /// Groups containing the entity `(name, kind)` directly or through
    /// nested groups, sorted.
    pub fn effective_memberships(&self, name: &str, kind: EntityKind) -> Result<Vec<EntityName>> {
        let name = EntityName::new(name)?;
        self.run(|| {
            if !self.records.exists(kind, &name)? {
                return Err(StoreError::unknown(kind, name.as_str()));
            }
            let member = Member::new(kind, name.clone());
            Ok(self.membership().effective_memberships(&member)?.into_iter().collect())
        })
    }

    /// Users in `group` directly or through nested groups, sorted.
    pub fn effective_users(&self, group: &str) -> Result<Vec<EntityName>> {
        let group = EntityName::new(group)?;
        self.run(|| Ok(self.membership().effective_users(&group)?.into_iter().collect()))
    }

    pub fn user_info(&self, name: &str) -> Result<UserInfo> {
        let name = EntityName::new(name)?;
        self.run(|| {
            let meta = self.records.user(&name).meta()?;
            Ok(UserInfo {
                name: name.clone(),
                changed: meta.changed,
            })
        })
    }

    pub fn group_info(&self, name: &str) -> Result<GroupInfo> {
        let name = EntityName::new(name)?;
        self.run(|| {
            let record = self.records.group(&name);
            let meta = record.meta()?;
            let members = record.members()?.iter().cloned().collect();
            Ok(GroupInfo {
                name: name.clone(),
                changed: meta.changed,
                members,
            })
        })
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().mode(0o700).create(path)
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir(path)
}
