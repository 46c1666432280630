//! Undirected contact graph over registered users.

use super::errors::{ScoreModelError, ScoreModelResult};
use serde::{Deserialize, Serialize};
use shared_types::entities::UserId;
use std::collections::{BTreeMap, BTreeSet};

/// Symmetric contact graph.
///
/// Nodes are unique, edges are stored in both directions and self-loops are
/// rejected. Ordered maps keep iteration deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactGraph {
    adjacency: BTreeMap<UserId, BTreeSet<UserId>>,
}

impl ContactGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with no contacts.
    pub fn register_user(&mut self, user: UserId) -> ScoreModelResult<()> {
        if self.adjacency.contains_key(&user) {
            return Err(ScoreModelError::UserAlreadyRegistered(user));
        }
        self.adjacency.insert(user, BTreeSet::new());
        Ok(())
    }

    /// Record a symmetric contact between two registered users.
    ///
    /// Returns `false` if the edge already existed.
    pub fn add_contact(&mut self, a: UserId, b: UserId) -> ScoreModelResult<bool> {
        if a == b {
            return Err(ScoreModelError::SelfContact(a));
        }
        for user in [a, b] {
            if !self.adjacency.contains_key(&user) {
                return Err(ScoreModelError::UnknownUser(user));
            }
        }

        let inserted = self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        Ok(inserted)
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.adjacency.contains_key(&user)
    }

    /// Neighbors of `user` in ascending id order. Empty for unknown users.
    pub fn neighbors(&self, user: UserId) -> impl Iterator<Item = UserId> + '_ {
        self.adjacency
            .get(&user)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All registered users in ascending id order.
    pub fn users(&self) -> impl Iterator<Item = UserId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn user_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn degree(&self, user: UserId) -> usize {
        self.adjacency.get(&user).map_or(0, BTreeSet::len)
    }

    /// Build a graph from an edge list, registering endpoints on first sight.
    pub fn from_edges<I>(edges: I) -> ScoreModelResult<Self>
    where
        I: IntoIterator<Item = (UserId, UserId)>,
    {
        let mut graph = Self::new();
        for (a, b) in edges {
            for user in [a, b] {
                if !graph.contains(user) {
                    graph.register_user(user)?;
                }
            }
            graph.add_contact(a, b)?;
        }
        Ok(graph)
    }
}
