//! Neighbour-search compliance test helpers.
//!
//! These functions check a built [`UniformGrid`] against a
//! [`BruteForceIndex`] oracle over the same store, and verify the structural
//! invariants of the bucket layout. Reused by the query tests for every
//! boundary policy.

use boxgrid_core::{AgentHandle, AgentStore};
use indexmap::IndexSet;

use crate::grid::UniformGrid;
use crate::query::NeighborCallback;
use crate::space::{BruteForceIndex, SpatialIndex};

fn handles(store: &dyn AgentStore) -> Vec<AgentHandle> {
    (0..store.agent_count()).map(|i| store.agent_at(i)).collect()
}

/// Neighbours with squared distances, sorted by handle. Panics on duplicates.
fn neighbors_of(
    index: &dyn SpatialIndex,
    store: &dyn AgentStore,
    agent: AgentHandle,
    squared_radius: f64,
) -> Vec<(AgentHandle, f64)> {
    let mut out = Vec::new();
    let mut push = |h: AgentHandle, d2: f64| out.push((h, d2));
    index
        .visit_neighbors(
            store,
            agent,
            NeighborCallback::WithDistance(&mut push),
            Some(squared_radius),
        )
        .expect("neighbour query should succeed");
    out.sort_by_key(|&(h, _)| h);
    let unique: IndexSet<AgentHandle> = out.iter().map(|&(h, _)| h).collect();
    assert_eq!(unique.len(), out.len(), "agent {agent} reported a neighbour twice");
    out
}

fn candidates_of(index: &dyn SpatialIndex, store: &dyn AgentStore, agent: AgentHandle) -> IndexSet<AgentHandle> {
    let mut out = Vec::new();
    let mut push = |h: AgentHandle| out.push(h);
    index
        .visit_neighbors(store, agent, NeighborCallback::WithoutDistance(&mut push), None)
        .expect("candidate query should succeed");
    let unique: IndexSet<AgentHandle> = out.iter().copied().collect();
    assert_eq!(unique.len(), out.len(), "agent {agent} reported a candidate twice");
    unique
}

fn oracle(grid: &UniformGrid, store: &dyn AgentStore) -> BruteForceIndex {
    let mut brute = BruteForceIndex::new(grid.config()).expect("grid config is valid");
    brute.forced_update(store).expect("store is valid");
    brute
}

/// Assert that radius queries return exactly the brute-force neighbour set.
pub fn assert_complete(grid: &UniformGrid, store: &dyn AgentStore, squared_radius: f64) {
    let brute = oracle(grid, store);
    for agent in handles(store) {
        let got = neighbors_of(grid, store, agent, squared_radius);
        let want = neighbors_of(&brute, store, agent, squared_radius);
        let got_ids: Vec<AgentHandle> = got.iter().map(|&(h, _)| h).collect();
        let want_ids: Vec<AgentHandle> = want.iter().map(|&(h, _)| h).collect();
        assert_eq!(got_ids, want_ids, "neighbour set of {agent} at r2 = {squared_radius}");
        for ((h, d_got), (_, d_want)) in got.iter().zip(&want) {
            assert!(
                (d_got - d_want).abs() <= 1e-9 * d_want.max(1.0),
                "squared distance {agent} -> {h}: {d_got} != {d_want}"
            );
        }
    }
}

/// Assert that `b` near `a` implies `a` near `b`.
pub fn assert_symmetric(grid: &UniformGrid, store: &dyn AgentStore, squared_radius: f64) {
    for agent in handles(store) {
        for (nb, _) in neighbors_of(grid, store, agent, squared_radius) {
            let back = neighbors_of(grid, store, nb, squared_radius);
            assert!(
                back.iter().any(|&(h, _)| h == agent),
                "symmetry violated: {nb} near {agent} but not vice versa"
            );
        }
    }
}

/// Assert that the unfiltered candidates contain every default-radius neighbour.
pub fn assert_candidates_superset(grid: &UniformGrid, store: &dyn AgentStore) {
    let r2 = grid.largest_agent_size_squared();
    for agent in handles(store) {
        let candidates = candidates_of(grid, store, agent);
        assert!(!candidates.contains(&agent), "{agent} is its own candidate");
        for (nb, _) in neighbors_of(grid, store, agent, r2) {
            assert!(candidates.contains(&nb), "{nb} near {agent} but not a candidate");
        }
    }
}

/// Assert that every agent sits in exactly one bucket, the one its position indexes to.
pub fn assert_buckets_partition_agents(grid: &UniformGrid, store: &dyn AgentStore) {
    let mut seen: IndexSet<AgentHandle> = IndexSet::new();
    grid.for_each_box(|index, agents| {
        for &h in agents {
            assert!(seen.insert(h), "{h} stored in more than one bucket");
            let position = store.position(h).expect("agent is in the store");
            assert_eq!(grid.box_index(position), Ok(index), "{h} stored in the wrong box");
        }
    });
    assert_eq!(seen.len(), store.agent_count());
    assert_eq!(grid.agent_count(), store.agent_count());
}

/// Assert `box_coordinates(box_index(p)) == box_coord_of(p)` at every agent.
pub fn assert_index_bijection(grid: &UniformGrid, store: &dyn AgentStore) {
    for agent in handles(store) {
        let position = store.position(agent).expect("agent is in the store");
        let coord = grid.box_coord_of(position).expect("agent position resolves");
        let index = grid.box_index(position).expect("agent box is in the grid");
        assert_eq!(grid.box_coordinates(index), Ok(coord));
    }
}

/// Run all compliance checks on a built grid.
pub fn run_full_compliance(grid: &UniformGrid, store: &dyn AgentStore, squared_radii: &[f64]) {
    for &r2 in squared_radii {
        assert_complete(grid, store, r2);
        assert_symmetric(grid, store, r2);
    }
    assert_candidates_superset(grid, store);
    assert_buckets_partition_agents(grid, store);
    assert_index_bijection(grid, store);
}
