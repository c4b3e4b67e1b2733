//! whawty-groups - a filesystem-resident user and group store
//!
//! Users and groups live as plain files below one root directory. Groups
//! contain users and other groups; the group-to-group relation is kept
//! acyclic, and deleting an entity removes every membership naming it.
//! Any number of processes may operate on one store at the same time.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the store)
//! - [`store`] - The [`Store`] facade: validation, logging, operation entry points
//! - [`core`] - Domain types, on-disk records, membership graph, verification
//! - [`ui`] - Output helpers
//!
//! # Correctness Invariants
//!
//! 1. No group is reachable from itself through member groups
//! 2. No membership names a missing user or group
//! 3. Every write is staged and renamed into place; nothing is edited in place
//! 4. Concurrent writers never lose each other's membership changes

pub mod cli;
pub mod core;
pub mod store;
pub mod ui;

pub use crate::core::error::StoreError;
pub use crate::core::types::{EntityKind, EntityName, Member};
pub use crate::store::{GroupInfo, Store, UserInfo};
