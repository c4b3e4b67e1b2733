//! core::paths
//!
//! Centralized path routing for the on-disk store layout.
//!
//! # Storage Layout
//!
//! ```text
//! <root>/
//!   users/<user>              user record
//!   groups/<group>/_meta      group metadata
//!   groups/<group>/members    membership list
//!   groups/<group>/.lock      per-group advisory lock
//!   .tmp/                     staging area, store.lock, graph.lock
//! ```
//!
//! **Hard rule:** no code outside this module joins layout names onto the
//! root. Everything goes through `StorePaths`.
//!
//! # Example
//!
//! ```
//! use whawty_groups::core::paths::StorePaths;
//! use whawty_groups::core::types::EntityName;
//! use std::path::PathBuf;
//!
//! let paths = StorePaths::new("/srv/groups");
//! let alice = EntityName::new("alice").unwrap();
//!
//! assert_eq!(paths.user_path(&alice), PathBuf::from("/srv/groups/users/alice"));
//! ```

use std::path::{Path, PathBuf};

use super::types::EntityName;

/// Directory holding one file per user.
pub const USERS_DIR: &str = "users";
/// Directory holding one directory per group.
pub const GROUPS_DIR: &str = "groups";
/// Staging directory for atomic writes.
pub const STAGING_DIR: &str = ".tmp";
/// Group metadata record inside a group directory.
pub const GROUP_META_FILE: &str = "_meta";
/// Membership list inside a group directory.
pub const GROUP_MEMBERS_FILE: &str = "members";
/// Lock file name, used inside group directories and the staging area.
pub const LOCK_FILE: &str = ".lock";

/// Path routing for one store root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    /// Create path routing for the store at `root`.
    ///
    /// The path is not touched on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // Top-level layout
    // =========================================================================

    /// `<root>/users`
    pub fn users_dir(&self) -> PathBuf {
        self.root.join(USERS_DIR)
    }

    /// `<root>/groups`
    pub fn groups_dir(&self) -> PathBuf {
        self.root.join(GROUPS_DIR)
    }

    /// `<root>/.tmp`
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Store-wide lock: shared by edge mutations, exclusive for removals.
    ///
    /// This is `<root>/.tmp/store.lock`.
    pub fn store_lock_path(&self) -> PathBuf {
        self.staging_dir().join("store.lock")
    }

    /// Lock serializing group-to-group edge insertions.
    ///
    /// This is `<root>/.tmp/graph.lock`.
    pub fn graph_lock_path(&self) -> PathBuf {
        self.staging_dir().join("graph.lock")
    }

    // =========================================================================
    // Entity records
    // =========================================================================

    /// `<root>/users/<user>`
    pub fn user_path(&self, user: &EntityName) -> PathBuf {
        self.users_dir().join(user.as_str())
    }

    /// `<root>/groups/<group>`
    pub fn group_dir(&self, group: &EntityName) -> PathBuf {
        self.groups_dir().join(group.as_str())
    }

    /// `<root>/groups/<group>/_meta`
    pub fn group_meta_path(&self, group: &EntityName) -> PathBuf {
        self.group_dir(group).join(GROUP_META_FILE)
    }

    /// `<root>/groups/<group>/members`
    pub fn group_members_path(&self, group: &EntityName) -> PathBuf {
        self.group_dir(group).join(GROUP_MEMBERS_FILE)
    }

    /// `<root>/groups/<group>/.lock`
    pub fn group_lock_path(&self, group: &EntityName) -> PathBuf {
        self.group_dir(group).join(LOCK_FILE)
    }
}
