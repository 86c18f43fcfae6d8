//! Test utilities and mock types for boxgrid development.
//!
//! Provides [`MockAgentStore`], an in-memory implementation of
//! [`AgentStore`], and fixtures that populate it with standard agent
//! layouts ([`lattice`], [`random_cloud`]).

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{lattice, random_cloud};

use boxgrid_core::{AgentHandle, AgentStore, Real3};
use indexmap::IndexMap;

/// Mock implementation of [`AgentStore`].
///
/// Backed by an `IndexMap<AgentHandle, (Real3, f64)>` so enumeration order
/// is insertion order. [`remove`](MockAgentStore::remove) shifts later
/// agents down without renumbering handles, which mirrors a store that
/// compacts its storage while keeping agent identities stable.
#[derive(Clone, Debug, Default)]
pub struct MockAgentStore {
    agents: IndexMap<AgentHandle, (Real3, f64)>,
    next_handle: u64,
}

impl MockAgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent under the next free handle and return it.
    pub fn push(&mut self, position: Real3, radius: f64) -> AgentHandle {
        let handle = AgentHandle(self.next_handle);
        self.insert(handle, position, radius);
        handle
    }

    /// Add or replace an agent under an explicit handle.
    pub fn insert(&mut self, handle: AgentHandle, position: Real3, radius: f64) {
        self.agents.insert(handle, (position, radius));
        self.next_handle = self.next_handle.max(handle.0 + 1);
    }

    /// Remove an agent. Surviving agents keep their handles and order.
    pub fn remove(&mut self, handle: AgentHandle) -> bool {
        self.agents.shift_remove(&handle).is_some()
    }

    /// Move an agent. Returns `false` for an unknown handle.
    pub fn set_position(&mut self, handle: AgentHandle, position: Real3) -> bool {
        match self.agents.get_mut(&handle) {
            Some(entry) => {
                entry.0 = position;
                true
            }
            None => false,
        }
    }

    /// Change an agent's interaction radius. Returns `false` for an unknown handle.
    pub fn set_radius(&mut self, handle: AgentHandle, radius: f64) -> bool {
        match self.agents.get_mut(&handle) {
            Some(entry) => {
                entry.1 = radius;
                true
            }
            None => false,
        }
    }

    /// Number of agents in the store.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Handles in enumeration order.
    pub fn handles(&self) -> impl Iterator<Item = AgentHandle> + '_ {
        self.agents.keys().copied()
    }
}

impl AgentStore for MockAgentStore {
    fn agent_count(&self) -> usize {
        self.agents.len()
    }

    fn agent_at(&self, index: usize) -> AgentHandle {
        // Out-of-range indices yield a handle no lookup will find.
        self.agents
            .get_index(index)
            .map_or(AgentHandle(u64::MAX), |(h, _)| *h)
    }

    fn position(&self, agent: AgentHandle) -> Option<Real3> {
        self.agents.get(&agent).map(|&(p, _)| p)
    }

    fn interaction_radius(&self, agent: AgentHandle) -> Option<f64> {
        self.agents.get(&agent).map(|&(_, r)| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_sequential_handles() {
        let mut store = MockAgentStore::new();
        assert_eq!(store.push([0.0; 3], 1.0), AgentHandle(0));
        assert_eq!(store.push([1.0; 3], 1.0), AgentHandle(1));
        store.insert(AgentHandle(10), [2.0; 3], 1.0);
        assert_eq!(store.push([3.0; 3], 1.0), AgentHandle(11));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn remove_keeps_surviving_handles_in_order() {
        let mut store = MockAgentStore::new();
        for i in 0..4 {
            store.push([i as f64, 0.0, 0.0], 1.0);
        }
        assert!(store.remove(AgentHandle(1)));
        assert!(!store.remove(AgentHandle(1)));
        assert_eq!(store.agent_count(), 3);
        assert_eq!(store.agent_at(1), AgentHandle(2));
        assert_eq!(store.position(AgentHandle(2)), Some([2.0, 0.0, 0.0]));
        assert_eq!(store.position(AgentHandle(1)), None);
    }

    #[test]
    fn mutate_agents() {
        let mut store = MockAgentStore::new();
        let h = store.push([0.0; 3], 1.0);
        assert!(store.set_position(h, [5.0, 6.0, 7.0]));
        assert!(store.set_radius(h, 2.5));
        assert_eq!(store.position(h), Some([5.0, 6.0, 7.0]));
        assert_eq!(store.interaction_radius(h), Some(2.5));
        assert!(!store.set_position(AgentHandle(99), [0.0; 3]));
    }

    #[test]
    fn out_of_range_index_is_unknown() {
        let store = MockAgentStore::new();
        let h = store.agent_at(3);
        assert_eq!(store.position(h), None);
    }
}
