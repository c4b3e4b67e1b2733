//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`EntityName`] - Validated user or group name
//! - [`EntityKind`] - Whether a name refers to a user or a group
//! - [`Member`] - A tagged member reference stored in a group's list
//! - [`UtcTimestamp`] - RFC3339 timestamp
//!
//! # Validation
//!
//! Names are validated at construction time, so a path built from an
//! `EntityName` can never escape the `users/` or `groups/` directory.
//!
//! # Examples
//!
//! ```
//! use whawty_groups::core::types::{EntityKind, EntityName, Member};
//!
//! let hugo = EntityName::new("hugo@example.com").unwrap();
//! let member = Member::user(hugo);
//! assert_eq!(member.kind, EntityKind::User);
//!
//! assert!(EntityName::new("@hugo").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::naming;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// A validated user or group name.
///
/// See [`crate::core::naming`] for the rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Create a new validated name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidName` if the name violates the naming rule.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if let Some(reason) = naming::explain_invalid(&name) {
            return Err(TypeError::InvalidName { name, reason });
        }
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl TryFrom<&str> for EntityName {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<EntityName> for String {
    fn from(name: EntityName) -> Self {
        name.0
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two kinds of entity a store holds.
///
/// Ordering puts groups before users so that sorted membership lists show
/// nested groups first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Group,
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Group => write!(f, "group"),
            EntityKind::User => write!(f, "user"),
        }
    }
}

/// A member reference inside a group's membership list.
///
/// Two members are equal only if both kind and name match, so a user and a
/// group sharing a name are distinct members.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Member {
    pub kind: EntityKind,
    pub name: EntityName,
}

impl Member {
    pub fn new(kind: EntityKind, name: EntityName) -> Self {
        Self { kind, name }
    }

    pub fn user(name: EntityName) -> Self {
        Self::new(EntityKind::User, name)
    }

    pub fn group(name: EntityName) -> Self {
        Self::new(EntityKind::Group, name)
    }
}

impl std::fmt::Display for Member {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// A UTC timestamp, serialized as RFC3339.
///
/// # Example
///
/// ```
/// use whawty_groups::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// println!("Current time: {}", now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
