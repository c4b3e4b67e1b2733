//! core::records::schema
//!
//! YAML record formats.
//!
//! # Metadata record
//!
//! Used for `users/<user>` and `groups/<group>/_meta`:
//!
//! ```yaml
//! changed: 2026-10-19T08:15:00Z
//! ```
//!
//! # Membership list
//!
//! Stored in `groups/<group>/members`, kept sorted and unique:
//!
//! ```yaml
//! members:
//! - kind: group
//!   name: admins
//! - kind: user
//!   name: alice
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, StoreError};
use crate::core::types::{EntityKind, EntityName, Member, UtcTimestamp};

/// Metadata carried by every user and group record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// When the record was written.
    pub changed: UtcTimestamp,
}

impl RecordMeta {
    /// Metadata stamped with the current time.
    pub fn now() -> Self {
        Self {
            changed: UtcTimestamp::now(),
        }
    }
}

/// The set of members of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberList {
    #[serde(default)]
    members: BTreeSet<Member>,
}

impl MemberList {
    /// An empty membership list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. Returns `false` if it was already present.
    pub fn insert(&mut self, member: Member) -> bool {
        self.members.insert(member)
    }

    /// Remove a member. Returns `false` if it was not present.
    pub fn remove(&mut self, member: &Member) -> bool {
        self.members.remove(member)
    }

    pub fn contains(&self, member: &Member) -> bool {
        self.members.contains(member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All members, groups first, each kind sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Names of members of the given kind.
    pub fn names_of(&self, kind: EntityKind) -> impl Iterator<Item = &EntityName> {
        self.members
            .iter()
            .filter(move |m| m.kind == kind)
            .map(|m| &m.name)
    }

    /// Member users.
    pub fn users(&self) -> impl Iterator<Item = &EntityName> {
        self.names_of(EntityKind::User)
    }

    /// Member groups.
    pub fn groups(&self) -> impl Iterator<Item = &EntityName> {
        self.names_of(EntityKind::Group)
    }
}

impl<'a> IntoIterator for &'a MemberList {
    type Item = &'a Member;
    type IntoIter = std::collections::btree_set::Iter<'a, Member>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

impl FromIterator<Member> for MemberList {
    fn from_iter<I: IntoIterator<Item = Member>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

/// Parse a YAML record read from `path`.
///
/// # Errors
///
/// Returns `StoreError::CorruptRecord` naming `path` on malformed input.
pub fn parse_record<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_yaml::from_str(content).map_err(|e| StoreError::CorruptRecord {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Serialize a record destined for `path` to YAML.
pub fn render_record<T: Serialize>(path: &Path, record: &T) -> Result<String> {
    serde_yaml::to_string(record).map_err(|e| StoreError::CorruptRecord {
        path: path.to_path_buf(),
        message: format!("cannot serialize: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    #[test]
    fn meta_round_trips_through_yaml() {
        let meta = RecordMeta::now();
        let yaml = render_record(Path::new("x"), &meta).unwrap();
        assert!(yaml.starts_with("changed:"));
        let parsed: RecordMeta = parse_record(Path::new("x"), &yaml).unwrap();
        assert_eq!(parsed, meta);
    }

    #[test]
    fn meta_accepts_offset_timestamps() {
        let yaml = "changed: 2016-10-12T15:04:05.123456789+02:00\n";
        let meta: RecordMeta = parse_record(Path::new("x"), yaml).unwrap();
        assert_eq!(meta.changed.to_string(), "2016-10-12T13:04:05.123456789+00:00");
    }

    #[test]
    fn member_list_is_a_set() {
        let mut list = MemberList::new();
        assert!(list.insert(Member::user(name("alice"))));
        assert!(!list.insert(Member::user(name("alice"))));
        assert!(list.insert(Member::group(name("alice"))));
        assert_eq!(list.len(), 2);

        assert!(list.remove(&Member::user(name("alice"))));
        assert!(!list.remove(&Member::user(name("alice"))));
        assert_eq!(list.groups().collect::<Vec<_>>(), vec![&name("alice")]);
        assert_eq!(list.users().count(), 0);
    }

    #[test]
    fn member_list_yaml_layout() {
        let list: MemberList = [
            Member::user(name("bob")),
            Member::group(name("admins")),
            Member::user(name("alice")),
        ]
        .into_iter()
        .collect();
        let yaml = render_record(Path::new("members"), &list).unwrap();
        let expected = "\
members:
- kind: group
  name: admins
- kind: user
  name: alice
- kind: user
  name: bob
";
        assert_eq!(yaml, expected);
    }

    #[test]
    fn empty_document_reads_as_empty_list() {
        let list: MemberList = parse_record(Path::new("members"), "{}").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn invalid_member_name_is_corrupt() {
        let yaml = "members:\n- kind: user\n  name: ../escape\n";
        let err = parse_record::<MemberList>(Path::new("/s/groups/g/members"), yaml).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { ref path, .. } if path.ends_with("members")));
    }
}
