//! Benchmark profiles and utilities for the boxgrid spatial index.
//!
//! Provides pre-built agent populations for benchmarks:
//!
//! - [`reference_profile`]: 10K agents in an open domain
//! - [`stress_profile`]: 100K agents in an open domain
//! - [`torus_profile`]: 10K agents in a periodic domain
//! - [`jitter`]: deterministic small displacement of every agent

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use boxgrid_core::{AgentStore, Real3};
use boxgrid_space::GridConfig;
use boxgrid_test_utils::{random_cloud, MockAgentStore};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// An agent population plus the grid configuration to index it with.
pub struct BenchProfile {
    pub store: MockAgentStore,
    pub config: GridConfig,
}

/// 10K agents of radius 2 spread over a 200^3 cube (about 1.25 agents per 8^3 box).
pub fn reference_profile(seed: u64) -> BenchProfile {
    BenchProfile {
        store: random_cloud(seed, 10_000, 200.0, 2.0),
        config: GridConfig::default(),
    }
}

/// Same density as [`reference_profile`] at 10x the agent count.
pub fn stress_profile(seed: u64) -> BenchProfile {
    BenchProfile {
        store: random_cloud(seed, 100_000, 431.0, 2.0),
        config: GridConfig::default(),
    }
}

/// [`reference_profile`] on a periodic domain.
pub fn torus_profile(seed: u64) -> BenchProfile {
    BenchProfile {
        store: random_cloud(seed, 10_000, 200.0, 2.0),
        config: GridConfig::torus(0.0, 200.0),
    }
}

/// Move every agent by up to `amplitude` per axis, deterministically.
pub fn jitter(store: &mut MockAgentStore, seed: u64, amplitude: f64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let handles: Vec<_> = store.handles().collect();
    for h in handles {
        let Some(p) = store.position(h) else {
            continue;
        };
        let moved: Real3 = p.map(|v| v + rng.random_range(-amplitude..=amplitude));
        store.set_position(h, moved);
    }
}
