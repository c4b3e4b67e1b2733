//! core::graph
//!
//! In-memory view of group-to-group membership.
//!
//! # Architecture
//!
//! The group graph is a DAG where:
//! - Nodes are groups
//! - An edge `parent -> child` means `child` is a member of `parent`
//!
//! It is rebuilt from the membership lists whenever a caller needs it and
//! never persisted itself.
//!
//! # Invariants
//!
//! - Graph must be acyclic; [`GroupGraph::reachable`] is what keeps it so
//! - Every traversal visits each group at most once (O(V+E))

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use super::types::EntityName;

/// Group-to-group edges of a store.
#[derive(Debug, Default, Clone)]
pub struct GroupGraph {
    /// Member groups of each group
    subgroups: BTreeMap<EntityName, BTreeSet<EntityName>>,
    /// Cached reverse edges (derived from subgroups)
    supergroups: BTreeMap<EntityName, BTreeSet<EntityName>>,
}

impl GroupGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node without edges.
    pub fn add_group(&mut self, group: EntityName) {
        self.subgroups.entry(group).or_default();
    }

    /// Record that `child` is a member of `parent`.
    ///
    /// This also updates the reverse cache.
    pub fn add_edge(&mut self, parent: EntityName, child: EntityName) {
        self.subgroups.entry(child.clone()).or_default();
        self.supergroups
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
        self.subgroups.entry(parent).or_default().insert(child);
    }

    /// Direct member groups of `group`.
    pub fn subgroups(&self, group: &EntityName) -> impl Iterator<Item = &EntityName> {
        self.subgroups.get(group).into_iter().flatten()
    }

    /// Groups that directly contain `group`.
    pub fn supergroups(&self, group: &EntityName) -> impl Iterator<Item = &EntityName> {
        self.supergroups.get(group).into_iter().flatten()
    }

    /// Whether `to` can be reached from `from` by following member edges.
    ///
    /// A group always reaches itself, so `reachable(g, g)` is true. Adding
    /// the edge `parent -> child` closes a cycle exactly when
    /// `reachable(child, parent)` holds.
    ///
    /// # Example
    ///
    /// ```
    /// use whawty_groups::core::graph::GroupGraph;
    /// use whawty_groups::core::types::EntityName;
    ///
    /// let a = EntityName::new("a").unwrap();
    /// let b = EntityName::new("b").unwrap();
    /// let c = EntityName::new("c").unwrap();
    ///
    /// let mut graph = GroupGraph::new();
    /// graph.add_edge(a.clone(), b.clone());
    /// graph.add_edge(b.clone(), c.clone());
    ///
    /// assert!(graph.reachable(&a, &c));
    /// assert!(!graph.reachable(&c, &a));
    /// ```
    pub fn reachable(&self, from: &EntityName, to: &EntityName) -> bool {
        if from == to {
            return true;
        }
        let mut visited: HashSet<&EntityName> = HashSet::new();
        let mut queue = VecDeque::from([from]);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            for next in self.subgroups(current) {
                if next == to {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// All groups nested (transitively) inside `group`, excluding itself.
    pub fn descendants(&self, group: &EntityName) -> BTreeSet<EntityName> {
        let mut result = BTreeSet::new();
        let mut queue: VecDeque<&EntityName> = self.subgroups(group).collect();

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                queue.extend(self.subgroups(current));
            }
        }
        result
    }

    /// All groups that (transitively) contain `group`, excluding itself.
    pub fn ancestors(&self, group: &EntityName) -> BTreeSet<EntityName> {
        let mut result = BTreeSet::new();
        let mut queue: VecDeque<&EntityName> = self.supergroups(group).collect();

        while let Some(current) = queue.pop_front() {
            if result.insert(current.clone()) {
                queue.extend(self.supergroups(current));
            }
        }
        result
    }

    /// Find a cycle, if the graph has one.
    ///
    /// Returns the groups along the cycle in edge order, starting and
    /// ending at the same group. Only a store edited behind the library's
    /// back can contain one.
    pub fn find_cycle(&self) -> Option<Vec<EntityName>> {
        let mut done: HashSet<&EntityName> = HashSet::new();
        let mut path: Vec<&EntityName> = Vec::new();

        for group in self.subgroups.keys() {
            if let Some(cycle) = self.cycle_from(group, &mut done, &mut path) {
                return Some(cycle);
            }
        }
        None
    }

    fn cycle_from<'a>(
        &'a self,
        group: &'a EntityName,
        done: &mut HashSet<&'a EntityName>,
        path: &mut Vec<&'a EntityName>,
    ) -> Option<Vec<EntityName>> {
        if let Some(start) = path.iter().position(|g| *g == group) {
            let mut cycle: Vec<EntityName> = path[start..].iter().map(|g| (*g).clone()).collect();
            cycle.push(group.clone());
            return Some(cycle);
        }
        if done.contains(group) {
            return None;
        }

        path.push(group);
        for child in self.subgroups(group) {
            if let Some(cycle) = self.cycle_from(child, done, path) {
                return Some(cycle);
            }
        }
        path.pop();
        done.insert(group);
        None
    }
}
