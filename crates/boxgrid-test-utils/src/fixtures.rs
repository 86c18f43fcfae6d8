//! Standard agent layouts.
//!
//! - [`lattice`]: an `n × n × n` cubic lattice, handles in x-fastest order.
//! - [`random_cloud`]: a seeded uniform cloud inside a cube.

use boxgrid_core::AgentHandle;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::MockAgentStore;

/// Cubic lattice of `n^3` agents with the given spacing and diameter.
///
/// Agent `k + n * j + n * n * i` sits at `(k, j, i) * spacing`, so with
/// `n = 4` agent 0 is at the origin, agent 1 at `(spacing, 0, 0)`, agent 4
/// at `(0, spacing, 0)` and agent 16 at `(0, 0, spacing)`.
pub fn lattice(n: usize, spacing: f64, diameter: f64) -> MockAgentStore {
    let mut store = MockAgentStore::new();
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let handle = AgentHandle((k + n * j + n * n * i) as u64);
                let position = [k as f64 * spacing, j as f64 * spacing, i as f64 * spacing];
                store.insert(handle, position, diameter / 2.0);
            }
        }
    }
    store
}

/// `count` agents placed uniformly in `[0, extent)^3`, all with `radius`.
///
/// The same seed always produces the same store.
pub fn random_cloud(seed: u64, count: usize, extent: f64, radius: f64) -> MockAgentStore {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut store = MockAgentStore::new();
    for _ in 0..count {
        let position = [
            rng.random_range(0.0..extent),
            rng.random_range(0.0..extent),
            rng.random_range(0.0..extent),
        ];
        store.push(position, radius);
    }
    store
}
