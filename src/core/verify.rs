//! core::verify
//!
//! Store layout checks and read-only consistency scans.
//!
//! # Modes
//!
//! - **Layout check** ([`check_layout`]): cheap, run whenever a store is
//!   opened. Fails with an error on the first problem.
//! - **Full verify** ([`verify`]): reads every record, rebuilds the group
//!   graph and reports every problem found as a [`VerifyIssue`].
//!
//! # Invariants
//!
//! - Never mutates the store
//! - Must be deterministic (issues are reported in a stable order)

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::{Result, StoreError};
use super::graph::GroupGraph;
use super::paths::{
    StorePaths, GROUPS_DIR, GROUP_MEMBERS_FILE, GROUP_META_FILE, LOCK_FILE, STAGING_DIR, USERS_DIR,
};
use super::records::{stat, Records};
use super::types::{EntityKind, EntityName, Member};

/// Check that `paths.root()` has exactly the store layout.
///
/// # Errors
///
/// - `Io` (not found) if the root does not exist
/// - `NotADirectory` if the root is not a directory
/// - `CorruptLayout` on any unexpected, missing or mistyped entry
pub fn check_layout(paths: &StorePaths) -> Result<()> {
    let root = paths.root();
    if !fs::metadata(root)?.is_dir() {
        return Err(StoreError::NotADirectory(root.to_path_buf()));
    }

    let mut users = false;
    let mut groups = false;
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        let is_dir = entry.file_type()?.is_dir();
        match name.to_str() {
            Some(USERS_DIR) if is_dir => users = true,
            Some(GROUPS_DIR) if is_dir => groups = true,
            Some(STAGING_DIR) if is_dir => {}
            Some(n @ (USERS_DIR | GROUPS_DIR | STAGING_DIR)) => {
                return Err(StoreError::CorruptLayout(format!("'{}' is not a directory", n)));
            }
            _ => {
                return Err(StoreError::CorruptLayout(format!(
                    "unexpected entry '{}'",
                    name.to_string_lossy()
                )));
            }
        }
    }

    if !users {
        return Err(StoreError::CorruptLayout(format!("missing '{}' directory", USERS_DIR)));
    }
    if !groups {
        return Err(StoreError::CorruptLayout(format!("missing '{}' directory", GROUPS_DIR)));
    }
    Ok(())
}

/// A problem found by [`verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum VerifyIssue {
    /// An entry that is not a valid record.
    StrayEntry { path: PathBuf },
    /// A membership edge whose member does not exist.
    DanglingMember { group: EntityName, member: Member },
    /// A record that exists but cannot be read.
    CorruptRecord { path: PathBuf, message: String },
    /// Groups forming a cycle, first and last entry equal.
    Cycle { groups: Vec<EntityName> },
}

impl fmt::Display for VerifyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyIssue::StrayEntry { path } => write!(f, "stray entry '{}'", path.display()),
            VerifyIssue::DanglingMember { group, member } => {
                write!(f, "group '{}' lists missing member {}", group, member)
            }
            VerifyIssue::CorruptRecord { path, message } => {
                write!(f, "corrupt record '{}': {}", path.display(), message)
            }
            VerifyIssue::Cycle { groups } => {
                let names: Vec<&str> = groups.iter().map(EntityName::as_str).collect();
                write!(f, "group cycle: {}", names.join(" -> "))
            }
        }
    }
}

/// Result of a full verification.
#[derive(Debug, Default, Serialize)]
pub struct VerifyReport {
    pub users: usize,
    pub groups: usize,
    pub edges: usize,
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    /// Whether verification found nothing.
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Scan the whole store and report everything that is off.
///
/// The layout must already pass [`check_layout`].
pub fn verify(records: &Records) -> Result<VerifyReport> {
    let paths = records.paths();
    let mut report = VerifyReport::default();

    let users = scan_users(records, &mut report)?;
    let groups = scan_group_dirs(records, &mut report)?;
    report.users = users.len();
    report.groups = groups.len();

    let mut graph = GroupGraph::new();
    for group in &groups {
        graph.add_group(group.clone());
        let record = records.group(group);
        if let Err(err) = record.meta() {
            report_record_error(&mut report, err, paths.group_meta_path(group))?;
        }
        let members = match record.members() {
            Ok(members) => members,
            Err(err) => {
                report_record_error(&mut report, err, paths.group_members_path(group))?;
                continue;
            }
        };

        for member in &members {
            report.edges += 1;
            let present = match member.kind {
                EntityKind::User => users.binary_search(&member.name).is_ok(),
                EntityKind::Group => groups.binary_search(&member.name).is_ok(),
            };
            if !present {
                report.issues.push(VerifyIssue::DanglingMember {
                    group: group.clone(),
                    member: member.clone(),
                });
            } else if member.kind == EntityKind::Group {
                graph.add_edge(group.clone(), member.name.clone());
            }
        }
    }

    if let Some(groups) = graph.find_cycle() {
        report.issues.push(VerifyIssue::Cycle { groups });
    }
    Ok(report)
}

fn scan_users(records: &Records, report: &mut VerifyReport) -> Result<Vec<EntityName>> {
    let dir = records.paths().users_dir();
    let mut users = Vec::new();
    for entry in sorted_entries(&dir)? {
        let path = dir.join(&entry);
        match EntityName::new(entry) {
            Ok(name) if is_file(&path)? => {
                if let Err(err) = records.user(&name).meta() {
                    report_record_error(report, err, path)?;
                }
                users.push(name);
            }
            _ => report.issues.push(VerifyIssue::StrayEntry { path }),
        }
    }
    Ok(users)
}

fn scan_group_dirs(records: &Records, report: &mut VerifyReport) -> Result<Vec<EntityName>> {
    let dir = records.paths().groups_dir();
    let mut groups = Vec::new();
    for entry in sorted_entries(&dir)? {
        let path = dir.join(&entry);
        match EntityName::new(entry) {
            Ok(name) if is_dir(&path)? => {
                for inner in sorted_entries(&path)? {
                    if ![GROUP_META_FILE, GROUP_MEMBERS_FILE, LOCK_FILE].contains(&inner.as_str()) {
                        report.issues.push(VerifyIssue::StrayEntry { path: path.join(inner) });
                    }
                }
                groups.push(name);
            }
            _ => report.issues.push(VerifyIssue::StrayEntry { path }),
        }
    }
    Ok(groups)
}

fn report_record_error(report: &mut VerifyReport, err: StoreError, path: PathBuf) -> Result<()> {
    match err {
        StoreError::CorruptRecord { path, message } => {
            report.issues.push(VerifyIssue::CorruptRecord { path, message });
            Ok(())
        }
        StoreError::UnknownUser(_) | StoreError::UnknownGroup(_) => {
            report.issues.push(VerifyIssue::CorruptRecord {
                path,
                message: "record is missing".to_string(),
            });
            Ok(())
        }
        other => Err(other),
    }
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

fn is_file(path: &Path) -> io::Result<bool> {
    Ok(stat(path)?.is_some_and(|m| m.is_file()))
}

fn is_dir(path: &Path) -> io::Result<bool> {
    Ok(stat(path)?.is_some_and(|m| m.is_dir()))
}
