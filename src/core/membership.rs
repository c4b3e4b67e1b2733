//! core::membership
//!
//! The membership graph manager: edge mutations, cycle prevention and
//! cascading cleanup.
//!
//! # Architecture
//!
//! Edges live in the containing group's membership list. This module only
//! talks to [`Records`]; it never builds paths. Locking follows the order
//! documented in [`crate::core::ops::lock`]:
//!
//! | operation             | store lock | graph lock | group lock |
//! |-----------------------|------------|------------|------------|
//! | add/remove user edge  | shared     | -          | exclusive  |
//! | add group edge        | shared     | exclusive  | exclusive  |
//! | remove group edge     | shared     | -          | exclusive  |
//! | purge (cascade)       | caller     | -          | exclusive  |
//!
//! Removals of entities hold the store lock exclusively around
//! [`Membership::purge_member`], so no edge insertion can check that an
//! entity exists and then write an edge to it after it was purged.
//!
//! # Invariants
//!
//! - The group-to-group graph stays acyclic
//! - Adding an edge to a missing entity is an error; removing a missing
//!   edge is a no-op

use std::collections::BTreeSet;

use tracing::{debug, info};

use super::error::{Result, StoreError};
use super::graph::GroupGraph;
use super::ops::lock::LockMode;
use super::records::Records;
use super::types::{EntityKind, EntityName, Member};

/// Edge operations over the records of one store.
#[derive(Debug, Clone, Copy)]
pub struct Membership<'a> {
    records: &'a Records,
}

impl<'a> Membership<'a> {
    pub fn new(records: &'a Records) -> Self {
        Self { records }
    }

    /// Make `user` a member of `group`.
    ///
    /// Returns `false` if the edge already existed.
    ///
    /// # Errors
    ///
    /// `UnknownGroup` or `UnknownUser` if either entity is missing.
    pub fn add_user_member(&self, group: &EntityName, user: &EntityName) -> Result<bool> {
        let _store = self.records.lock_store(LockMode::Shared)?;
        self.require(EntityKind::Group, group)?;
        self.require(EntityKind::User, user)?;

        let added = self
            .records
            .group(group)
            .update_members(|list| Ok(list.insert(Member::user(user.clone()))))?;
        if added {
            debug!(%group, %user, "added user member");
        }
        Ok(added)
    }

    /// Remove `user` from `group`.
    ///
    /// Returns `false` if there was no such edge or no such group.
    pub fn remove_user_member(&self, group: &EntityName, user: &EntityName) -> Result<bool> {
        self.remove_edge(group, Member::user(user.clone()))
    }

    /// Make `subgroup` a member of `group`.
    ///
    /// Returns `false` if the edge already existed.
    ///
    /// # Errors
    ///
    /// - `UnknownGroup` if either group is missing
    /// - `CycleDetected` if `group` is reachable from `subgroup`
    ///   (including `group == subgroup`); nothing is written
    pub fn add_group_member(&self, group: &EntityName, subgroup: &EntityName) -> Result<bool> {
        let _store = self.records.lock_store(LockMode::Shared)?;
        let _graph = self.records.lock_graph()?;
        self.require(EntityKind::Group, group)?;
        self.require(EntityKind::Group, subgroup)?;

        if self.load_graph()?.reachable(subgroup, group) {
            debug!(%group, %subgroup, "rejected group member: cycle");
            return Err(StoreError::CycleDetected {
                group: group.to_string(),
                member: subgroup.to_string(),
            });
        }

        let added = self
            .records
            .group(group)
            .update_members(|list| Ok(list.insert(Member::group(subgroup.clone()))))?;
        if added {
            debug!(%group, %subgroup, "added group member");
        }
        Ok(added)
    }

    /// Remove `subgroup` from `group`.
    ///
    /// Returns `false` if there was no such edge or no such group.
    pub fn remove_group_member(&self, group: &EntityName, subgroup: &EntityName) -> Result<bool> {
        self.remove_edge(group, Member::group(subgroup.clone()))
    }

    fn remove_edge(&self, group: &EntityName, member: Member) -> Result<bool> {
        let _store = self.records.lock_store(LockMode::Shared)?;
        match self
            .records
            .group(group)
            .update_members(|list| Ok(list.remove(&member)))
        {
            Ok(removed) => {
                if removed {
                    debug!(%group, %member, "removed member");
                }
                Ok(removed)
            }
            Err(StoreError::UnknownGroup(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Remove `member` from every group that lists it.
    ///
    /// The caller must hold the store lock exclusively. Returns how many
    /// groups were changed.
    pub fn purge_member(&self, member: &Member) -> Result<usize> {
        let mut changed = 0;
        for group in self.records.groups()? {
            match self
                .records
                .group(&group)
                .update_members(|list| Ok(list.remove(member)))
            {
                Ok(true) => {
                    debug!(%group, %member, "purged member");
                    changed += 1;
                }
                Ok(false) => {}
                // Group vanished between listing and locking.
                Err(StoreError::UnknownGroup(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if changed > 0 {
            info!(%member, groups = changed, "purged member from groups");
        }
        Ok(changed)
    }

    /// Build the group-to-group graph from all membership lists.
    pub fn load_graph(&self) -> Result<GroupGraph> {
        let mut graph = GroupGraph::new();
        for group in self.records.groups()? {
            let members = match self.records.group(&group).members() {
                Ok(members) => members,
                Err(StoreError::UnknownGroup(_)) => continue,
                Err(e) => return Err(e),
            };
            for sub in members.groups() {
                graph.add_edge(group.clone(), sub.clone());
            }
            graph.add_group(group);
        }
        Ok(graph)
    }

    /// Groups that list `member` directly, sorted.
    pub fn memberships(&self, member: &Member) -> Result<Vec<EntityName>> {
        let mut result = Vec::new();
        for group in self.records.groups()? {
            match self.records.group(&group).members() {
                Ok(list) if list.contains(member) => result.push(group),
                Ok(_) | Err(StoreError::UnknownGroup(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }

    /// Groups containing `member` directly or through nested groups.
    pub fn effective_memberships(&self, member: &Member) -> Result<BTreeSet<EntityName>> {
        let direct = self.memberships(member)?;
        let graph = self.load_graph()?;

        let mut groups = BTreeSet::new();
        for group in direct {
            groups.extend(graph.ancestors(&group));
            groups.insert(group);
        }
        Ok(groups)
    }

    /// Users reachable from `group` through any depth of nested groups.
    pub fn effective_users(&self, group: &EntityName) -> Result<BTreeSet<EntityName>> {
        self.require(EntityKind::Group, group)?;
        let graph = self.load_graph()?;

        let mut users = BTreeSet::new();
        let nested = graph.descendants(group);
        for g in std::iter::once(group).chain(nested.iter()) {
            match self.records.group(g).members() {
                Ok(list) => users.extend(list.users().cloned()),
                Err(StoreError::UnknownGroup(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(users)
    }

    fn require(&self, kind: EntityKind, name: &EntityName) -> Result<()> {
        if self.records.exists(kind, name)? {
            Ok(())
        } else {
            Err(StoreError::unknown(kind, name.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paths::StorePaths;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        records: Records,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().expect("create temp dir");
            let records = Records::new(StorePaths::new(temp.path()));
            fs::create_dir(records.paths().users_dir()).unwrap();
            fs::create_dir(records.paths().groups_dir()).unwrap();
            Self {
                _temp: temp,
                records,
            }
        }

        fn membership(&self) -> Membership<'_> {
            Membership::new(&self.records)
        }

        fn user(&self, n: &str) -> EntityName {
            let n = name(n);
            self.records.user(&n).add().unwrap();
            n
        }

        fn group(&self, n: &str) -> EntityName {
            let n = name(n);
            self.records.group(&n).add().unwrap();
            n
        }

        fn members(&self, group: &EntityName) -> Vec<String> {
            self.records
                .group(group)
                .members()
                .unwrap()
                .iter()
                .map(ToString::to_string)
                .collect()
        }
    }

    fn name(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    #[test]
    fn add_user_member_is_idempotent() {
        let fx = Fixture::new();
        let g = fx.group("staff");
        let u = fx.user("alice");

        assert!(fx.membership().add_user_member(&g, &u).unwrap());
        assert!(!fx.membership().add_user_member(&g, &u).unwrap());
        assert_eq!(fx.members(&g), vec!["user:alice"]);
    }

    #[test]
    fn add_user_member_requires_both_entities() {
        let fx = Fixture::new();
        let g = fx.group("staff");
        let u = fx.user("alice");

        assert!(matches!(
            fx.membership().add_user_member(&name("ghost"), &u),
            Err(StoreError::UnknownGroup(ref n)) if n == "ghost"
        ));
        assert!(matches!(
            fx.membership().add_user_member(&g, &name("ghost")),
            Err(StoreError::UnknownUser(ref n)) if n == "ghost"
        ));
        assert!(fx.members(&g).is_empty());
    }

    #[test]
    fn remove_missing_edges_is_noop() {
        let fx = Fixture::new();
        let g = fx.group("staff");

        assert!(!fx.membership().remove_user_member(&g, &name("alice")).unwrap());
        assert!(!fx.membership().remove_user_member(&name("ghost"), &name("alice")).unwrap());
        assert!(!fx.membership().remove_group_member(&g, &name("other")).unwrap());
        assert!(fx.members(&g).is_empty());
    }

    #[test]
    fn cycle_law() {
        let fx = Fixture::new();
        let a = fx.group("a");
        let b = fx.group("b");
        let c = fx.group("c");
        let m = fx.membership();

        m.add_group_member(&a, &b).unwrap();
        m.add_group_member(&b, &c).unwrap();
        let before = (fx.members(&a), fx.members(&b));

        assert!(matches!(
            m.add_group_member(&c, &a),
            Err(StoreError::CycleDetected { ref group, ref member }) if group == "c" && member == "a"
        ));
        assert!(matches!(m.add_group_member(&a, &a), Err(StoreError::CycleDetected { .. })));
        assert_eq!((fx.members(&a), fx.members(&b)), before);
        assert!(fx.members(&c).is_empty());
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let fx = Fixture::new();
        let top = fx.group("top");
        let left = fx.group("left");
        let right = fx.group("right");
        let bottom = fx.group("bottom");
        let m = fx.membership();

        m.add_group_member(&top, &left).unwrap();
        m.add_group_member(&top, &right).unwrap();
        m.add_group_member(&left, &bottom).unwrap();
        m.add_group_member(&right, &bottom).unwrap();
        assert!(m.add_group_member(&top, &bottom).unwrap());
    }

    #[test]
    fn add_group_member_requires_both_groups() {
        let fx = Fixture::new();
        let g = fx.group("staff");
        fx.user("alice");

        assert!(matches!(
            fx.membership().add_group_member(&g, &name("alice")),
            Err(StoreError::UnknownGroup(ref n)) if n == "alice"
        ));
    }

    #[test]
    fn user_and_group_edges_are_distinct() {
        let fx = Fixture::new();
        let g = fx.group("staff");
        let u = fx.user("ops");
        let sub = fx.group("ops");
        let m = fx.membership();

        m.add_user_member(&g, &u).unwrap();
        m.add_group_member(&g, &sub).unwrap();
        assert_eq!(fx.members(&g), vec!["group:ops", "user:ops"]);

        m.remove_group_member(&g, &sub).unwrap();
        assert_eq!(fx.members(&g), vec!["user:ops"]);
    }

    #[test]
    fn purge_removes_member_everywhere() {
        let fx = Fixture::new();
        let a = fx.group("a");
        let b = fx.group("b");
        let u = fx.user("alice");
        let bob = fx.user("bob");
        let m = fx.membership();

        m.add_user_member(&a, &u).unwrap();
        m.add_user_member(&b, &u).unwrap();
        m.add_user_member(&b, &bob).unwrap();

        assert_eq!(m.purge_member(&Member::user(u.clone())).unwrap(), 2);
        assert!(fx.members(&a).is_empty());
        assert_eq!(fx.members(&b), vec!["user:bob"]);
        assert_eq!(m.purge_member(&Member::user(u)).unwrap(), 0);
    }

    #[test]
    fn memberships_and_effective_users() {
        let fx = Fixture::new();
        let all = fx.group("all");
        let devs = fx.group("devs");
        let ops = fx.group("ops");
        let alice = fx.user("alice");
        let bob = fx.user("bob");
        let m = fx.membership();

        m.add_group_member(&all, &devs).unwrap();
        m.add_group_member(&devs, &ops).unwrap();
        m.add_user_member(&devs, &alice).unwrap();
        m.add_user_member(&ops, &bob).unwrap();
        m.add_user_member(&all, &bob).unwrap();

        let groups = m.memberships(&Member::user(bob.clone())).unwrap();
        assert_eq!(groups, vec![all.clone(), ops.clone()]);

        let users: Vec<_> = m.effective_users(&all).unwrap().into_iter().collect();
        assert_eq!(users, vec![alice, bob.clone()]);
        let users: Vec<_> = m.effective_users(&ops).unwrap().into_iter().collect();
        assert_eq!(users, vec![bob]);
    }

    #[test]
    fn effective_memberships_follow_nesting_upwards() {
        let fx = Fixture::new();
        let all = fx.group("all");
        let devs = fx.group("devs");
        let ops = fx.group("ops");
        let other = fx.group("other");
        let alice = fx.user("alice");
        let m = fx.membership();

        m.add_group_member(&all, &devs).unwrap();
        m.add_group_member(&devs, &ops).unwrap();
        m.add_user_member(&ops, &alice).unwrap();
        m.add_user_member(&other, &alice).unwrap();

        let groups: Vec<_> = m
            .effective_memberships(&Member::user(alice))
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(groups, vec![all.clone(), devs.clone(), ops.clone(), other]);

        let groups: Vec<_> = m
            .effective_memberships(&Member::group(ops))
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(groups, vec![all.clone(), devs]);
        assert!(m.effective_memberships(&Member::group(all)).unwrap().is_empty());
    }
}
