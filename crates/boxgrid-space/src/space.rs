//! The `SpatialIndex` trait and a brute-force reference index.

use boxgrid_core::math::{squared_distance, squared_distance_periodic};
use boxgrid_core::{AgentHandle, AgentStore};

use crate::boundary::BoundaryPolicy;
use crate::bounds::{collect_samples, AgentSample, Envelope};
use crate::config::{ConfigError, GridConfig};
use crate::error::GridError;
use crate::grid::{UniformGrid, UpdateOutcome};
use crate::query::NeighborCallback;

/// Neighbour-search abstraction the simulation driver programs against.
///
/// A driver rebuilds the index once per step and then runs its agent
/// operations against it, usually from many threads at once.
///
/// # Object Safety
///
/// This trait is designed for use as `dyn SpatialIndex`; the store is
/// passed as `&dyn AgentStore` for the same reason.
///
/// # Thread Safety
///
/// `Sync` is required because queries run concurrently through `&self`.
pub trait SpatialIndex: Send + Sync {
    /// Rebuild if anything relevant changed since the last build.
    fn update(&mut self, store: &dyn AgentStore) -> Result<UpdateOutcome, GridError>;

    /// Rebuild unconditionally.
    fn forced_update(&mut self, store: &dyn AgentStore) -> Result<(), GridError>;

    /// Report the neighbours of `agent` through `callback`.
    ///
    /// Semantics of `squared_radius` follow [`UniformGrid::visit_neighbors`].
    /// Indices may report a superset of the true neighbours only for
    /// `WithoutDistance` callbacks without a radius.
    fn visit_neighbors(
        &self,
        store: &dyn AgentStore,
        agent: AgentHandle,
        callback: NeighborCallback<'_>,
        squared_radius: Option<f64>,
    ) -> Result<(), GridError>;

    /// Square of the largest interaction diameter seen at the last build.
    fn largest_agent_size_squared(&self) -> f64;
}

impl SpatialIndex for UniformGrid {
    fn update(&mut self, store: &dyn AgentStore) -> Result<UpdateOutcome, GridError> {
        UniformGrid::update(self, store)
    }

    fn forced_update(&mut self, store: &dyn AgentStore) -> Result<(), GridError> {
        UniformGrid::forced_update(self, store)
    }

    fn visit_neighbors(
        &self,
        store: &dyn AgentStore,
        agent: AgentHandle,
        callback: NeighborCallback<'_>,
        squared_radius: Option<f64>,
    ) -> Result<(), GridError> {
        UniformGrid::visit_neighbors(self, store, agent, callback, squared_radius)
    }

    fn largest_agent_size_squared(&self) -> f64 {
        UniformGrid::largest_agent_size_squared(self)
    }
}

// ── BruteForceIndex ────────────────────────────────────────────────

/// Quadratic-time index that checks every pair.
///
/// Useful as an oracle in tests and as a baseline in benchmarks. Honours
/// the Torus minimum-image distance; Closed and Open use plain distances.
/// Without a radius, `WithoutDistance` reports every other agent.
#[derive(Clone, Debug, Default)]
pub struct BruteForceIndex {
    period: Option<f64>,
    samples: Vec<AgentSample>,
    largest_diameter: f64,
}

impl BruteForceIndex {
    /// Create an empty index for the domain described by `config`.
    pub fn new(config: &GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            period: (config.policy == BoundaryPolicy::Torus).then(|| config.period()),
            ..Self::default()
        })
    }

    fn squared_distance(&self, a: &[f64; 3], b: &[f64; 3]) -> f64 {
        match self.period {
            Some(period) => squared_distance_periodic(a, b, period),
            None => squared_distance(a, b),
        }
    }
}

impl SpatialIndex for BruteForceIndex {
    fn update(&mut self, store: &dyn AgentStore) -> Result<UpdateOutcome, GridError> {
        self.forced_update(store)?;
        Ok(UpdateOutcome::Rebuilt)
    }

    fn forced_update(&mut self, store: &dyn AgentStore) -> Result<(), GridError> {
        let samples = collect_samples(store)?;
        self.largest_diameter = Envelope::scan(&samples).largest_diameter;
        self.samples = samples;
        Ok(())
    }

    fn visit_neighbors(
        &self,
        store: &dyn AgentStore,
        agent: AgentHandle,
        callback: NeighborCallback<'_>,
        squared_radius: Option<f64>,
    ) -> Result<(), GridError> {
        let center = store
            .position(agent)
            .ok_or(GridError::UnknownAgent { agent })?;
        let others = self.samples.iter().filter(|s| s.handle != agent);
        match callback {
            NeighborCallback::WithDistance(f) => {
                let r2 = squared_radius.unwrap_or_else(|| self.largest_agent_size_squared());
                for s in others {
                    let d2 = self.squared_distance(&center, &s.position);
                    if d2 <= r2 {
                        f(s.handle, d2);
                    }
                }
            }
            NeighborCallback::WithoutDistance(f) => {
                for s in others {
                    if squared_radius
                        .is_none_or(|r2| self.squared_distance(&center, &s.position) <= r2)
                    {
                        f(s.handle);
                    }
                }
            }
        }
        Ok(())
    }

    fn largest_agent_size_squared(&self) -> f64 {
        self.largest_diameter * self.largest_diameter
    }
}
