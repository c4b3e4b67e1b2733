//! core::records::user
//!
//! One file per user: `users/<user>`, holding a YAML metadata record.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::schema::{parse_record, render_record, RecordMeta};
use super::{stat, Records};
use crate::core::error::{Result, StoreError};
use crate::core::types::{EntityKind, EntityName};

/// View of a single user record. Use [`Records::user`] to create it.
#[derive(Debug, Clone, Copy)]
pub struct UserRecord<'a> {
    records: &'a Records,
    name: &'a EntityName,
}

impl<'a> UserRecord<'a> {
    pub(super) fn new(records: &'a Records, name: &'a EntityName) -> Self {
        Self { records, name }
    }

    fn path(&self) -> PathBuf {
        self.records.paths().user_path(self.name)
    }

    /// Whether the user file exists, whatever its type.
    pub fn exists(&self) -> Result<bool> {
        Ok(stat(&self.path())?.is_some())
    }

    /// Create the user record.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if the user is present, including when another
    /// writer creates it concurrently.
    pub fn add(&self) -> Result<()> {
        if self.exists()? {
            return Err(self.already_exists());
        }

        let path = self.path();
        let payload = render_record(&path, &RecordMeta::now())?;
        let staged = self.records.staging()?.stage(payload.as_bytes())?;
        match staged.publish_new(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(self.already_exists()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the user record. Returns `false` if it did not exist.
    pub fn remove(&self) -> Result<bool> {
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the user's metadata.
    pub fn meta(&self) -> Result<RecordMeta> {
        let path = self.path();
        match fs::read_to_string(&path) {
            Ok(content) => parse_record(&path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::UnknownUser(self.name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn already_exists(&self) -> StoreError {
        StoreError::AlreadyExists {
            kind: EntityKind::User,
            name: self.name.to_string(),
        }
    }
}
