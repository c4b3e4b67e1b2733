//! core::records::group
//!
//! One directory per group:
//!
//! - `groups/<group>/_meta` - YAML metadata record
//! - `groups/<group>/members` - YAML membership list
//! - `groups/<group>/.lock` - advisory lock, created on first update
//!
//! # Invariants
//!
//! - A group appears and disappears as a whole directory (one rename), so
//!   no observer sees metadata without a membership list or vice versa
//! - The membership list is only rewritten under the group's lock, and
//!   always by staging plus rename
//! - A group directory without `members` reads as an empty list

use std::fs;
use std::io;

use super::schema::{parse_record, render_record, MemberList, RecordMeta};
use super::{stat, Records};
use crate::core::error::{Result, StoreError};
use crate::core::ops::lock::{self, LockError, RecordLock};
use crate::core::paths::{GROUP_MEMBERS_FILE, GROUP_META_FILE};
use crate::core::types::{EntityKind, EntityName};

/// View of a single group record. Use [`Records::group`] to create it.
#[derive(Debug, Clone, Copy)]
pub struct GroupRecord<'a> {
    records: &'a Records,
    name: &'a EntityName,
}

impl<'a> GroupRecord<'a> {
    pub(super) fn new(records: &'a Records, name: &'a EntityName) -> Self {
        Self { records, name }
    }

    /// Whether the group directory exists, whatever its type.
    pub fn exists(&self) -> Result<bool> {
        Ok(stat(&self.records.paths().group_dir(self.name))?.is_some())
    }

    /// Create the group with an empty membership list.
    ///
    /// The directory is assembled in the staging area and renamed into
    /// place, so a concurrent `add` of the same name fails with
    /// `AlreadyExists` instead of merging into it.
    pub fn add(&self) -> Result<()> {
        if self.exists()? {
            return Err(self.already_exists());
        }

        let paths = self.records.paths();
        let meta = render_record(&paths.group_meta_path(self.name), &RecordMeta::now())?;
        let members = render_record(&paths.group_members_path(self.name), &MemberList::new())?;

        let staged = self.records.staging()?.stage_dir()?;
        staged.write_file(GROUP_META_FILE, meta.as_bytes())?;
        staged.write_file(GROUP_MEMBERS_FILE, members.as_bytes())?;
        match staged.publish_new(&paths.group_dir(self.name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(self.already_exists()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the group directory in one step. Returns `false` if absent.
    ///
    /// Edges pointing at this group are not touched here.
    pub fn remove(&self) -> Result<bool> {
        let dir = self.records.paths().group_dir(self.name);
        Ok(self.records.staging()?.retire(&dir)?)
    }

    /// Read the group's metadata.
    pub fn meta(&self) -> Result<RecordMeta> {
        let path = self.records.paths().group_meta_path(self.name);
        match fs::read_to_string(&path) {
            Ok(content) => parse_record(&path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(self.unknown()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the current membership list without locking.
    ///
    /// Safe against concurrent writers: the list is only ever replaced by
    /// rename, so the read sees either the old or the new version.
    pub fn members(&self) -> Result<MemberList> {
        let path = self.records.paths().group_members_path(self.name);
        match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => Ok(MemberList::new()),
            Ok(content) => parse_record(&path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.exists()? {
                    Ok(MemberList::new())
                } else {
                    Err(self.unknown())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Take the exclusive lock on this group's membership list.
    ///
    /// # Errors
    ///
    /// `UnknownGroup` if the group does not exist.
    pub fn lock(&self) -> Result<RecordLock> {
        match lock::group_lock(self.records.paths(), self.name) {
            Ok(lock) => Ok(lock),
            Err(LockError::Missing(_)) => Err(self.unknown()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read-modify-write the membership list under the group lock.
    ///
    /// `update` returns whether it changed the list; unchanged lists are
    /// not rewritten. Returns what `update` returned.
    pub fn update_members<F>(&self, update: F) -> Result<bool>
    where
        F: FnOnce(&mut MemberList) -> Result<bool>,
    {
        let _lock = self.lock()?;
        let mut list = self.members()?;
        if !update(&mut list)? {
            return Ok(false);
        }
        self.write_members(&list)?;
        Ok(true)
    }

    fn write_members(&self, list: &MemberList) -> Result<()> {
        let path = self.records.paths().group_members_path(self.name);
        let payload = render_record(&path, list)?;
        let staged = self.records.staging()?.stage(payload.as_bytes())?;
        match staged.replace(&path) {
            Ok(()) => Ok(()),
            // The directory was retired underneath us.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(self.unknown()),
            Err(e) => Err(e.into()),
        }
    }

    fn unknown(&self) -> StoreError {
        StoreError::UnknownGroup(self.name.to_string())
    }

    fn already_exists(&self) -> StoreError {
        StoreError::AlreadyExists {
            kind: EntityKind::Group,
            name: self.name.to_string(),
        }
    }
}
