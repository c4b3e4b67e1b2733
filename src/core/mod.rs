//! core
//!
//! Domain types, on-disk records and membership rules for whawty-groups.
//!
//! # Modules
//!
//! - [`types`] - Strong types: EntityName, EntityKind, Member, UtcTimestamp
//! - [`naming`] - Entity naming rule
//! - [`paths`] - Centralized path routing for the store layout
//! - [`ops`] - Atomic file replacement and advisory locking
//! - [`records`] - User and group records on disk
//! - [`graph`] - Group-to-group graph and reachability
//! - [`membership`] - Edge mutations, cycle prevention, cascading removal
//! - [`verify`] - Layout checks and consistency scans
//! - [`error`] - The store error type
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Names are validated once, at the boundary, into [`types::EntityName`]
//! - Every write goes through the staging area; nothing is edited in place
//! - Membership code reaches the disk only through [`records::Records`]

pub mod config;
pub mod error;
pub mod graph;
pub mod membership;
pub mod naming;
pub mod ops;
pub mod paths;
pub mod records;
pub mod types;
pub mod verify;
