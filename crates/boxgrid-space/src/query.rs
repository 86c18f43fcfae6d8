//! Neighbour queries against a built [`UniformGrid`].
//!
//! Every query resolves the box of its centre, visits the 3×3×3 block of
//! boxes around it in sequencer order, and reports agents in per-box
//! enumeration order. Each qualifying agent is reported exactly once.

use boxgrid_core::math::{squared_distance, squared_distance_periodic};
use boxgrid_core::{AgentHandle, AgentStore, BoxIndex, Real3};
use smallvec::SmallVec;

use crate::boundary::BoundaryPolicy;
use crate::error::GridError;
use crate::grid::UniformGrid;

/// Squared search radius of a distance-filtered query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SearchRadius {
    /// An explicit squared radius.
    Squared(f64),
    /// [`UniformGrid::largest_agent_size_squared`].
    Default,
}

/// Callback of [`UniformGrid::visit_neighbors`].
///
/// The variant is chosen once per call, so the query loop never inspects
/// the callback shape per neighbour.
pub enum NeighborCallback<'a> {
    /// Receives each neighbour and its squared distance to the centre.
    WithDistance(&'a mut dyn FnMut(AgentHandle, f64)),
    /// Receives each neighbour only.
    WithoutDistance(&'a mut dyn FnMut(AgentHandle)),
}

impl std::fmt::Debug for NeighborCallback<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WithDistance(_) => f.write_str("WithDistance(..)"),
            Self::WithoutDistance(_) => f.write_str("WithoutDistance(..)"),
        }
    }
}

impl UniformGrid {
    /// Call `f(neighbour, squared_distance)` for every agent within
    /// `radius` of `agent`, excluding `agent` itself.
    ///
    /// # Errors
    ///
    /// - [`GridError::SearchRadiusTooLarge`] if the squared radius exceeds
    ///   the squared box length. No callback runs.
    /// - [`GridError::UnknownAgent`] if the store does not know `agent` or a
    ///   candidate.
    pub fn for_each_neighbor<S, F>(
        &self,
        store: &S,
        agent: AgentHandle,
        radius: SearchRadius,
        mut f: F,
    ) -> Result<(), GridError>
    where
        S: AgentStore + ?Sized,
        F: FnMut(AgentHandle, f64),
    {
        self.try_for_each_neighbor(store, agent, radius, |h, d2| {
            f(h, d2);
            Ok::<(), GridError>(())
        })
    }

    /// Fallible [`for_each_neighbor`](Self::for_each_neighbor). The first
    /// callback error stops the query and is returned unchanged.
    pub fn try_for_each_neighbor<S, E, F>(
        &self,
        store: &S,
        agent: AgentHandle,
        radius: SearchRadius,
        f: F,
    ) -> Result<(), E>
    where
        S: AgentStore + ?Sized,
        E: From<GridError>,
        F: FnMut(AgentHandle, f64) -> Result<(), E>,
    {
        if self.is_empty() {
            return Ok(());
        }
        let squared_radius = self.resolve_radius(radius)?;
        let center = reference_position(store, agent)?;
        self.scan_within(store, center, Some(agent), Some(squared_radius), f)
    }

    /// Call `f(candidate)` for every agent in the 27 boxes around `agent`,
    /// excluding `agent` itself. No distances are computed.
    pub fn for_each_candidate<S, F>(
        &self,
        store: &S,
        agent: AgentHandle,
        mut f: F,
    ) -> Result<(), GridError>
    where
        S: AgentStore + ?Sized,
        F: FnMut(AgentHandle),
    {
        self.try_for_each_candidate(store, agent, |h| {
            f(h);
            Ok::<(), GridError>(())
        })
    }

    /// Fallible [`for_each_candidate`](Self::for_each_candidate).
    pub fn try_for_each_candidate<S, E, F>(
        &self,
        store: &S,
        agent: AgentHandle,
        mut f: F,
    ) -> Result<(), E>
    where
        S: AgentStore + ?Sized,
        E: From<GridError>,
        F: FnMut(AgentHandle) -> Result<(), E>,
    {
        if self.is_empty() {
            return Ok(());
        }
        let center = reference_position(store, agent)?;
        self.visit_boxes(center, |h| if h == agent { Ok(()) } else { f(h) })
    }

    /// Unified entry point.
    ///
    /// `WithDistance` reports neighbours within `squared_radius`, or within
    /// [`largest_agent_size_squared`](Self::largest_agent_size_squared) when
    /// it is `None`. `WithoutDistance` reports every candidate of the 27-box
    /// neighbourhood when `squared_radius` is `None`, and only those within
    /// it otherwise.
    pub fn visit_neighbors<S>(
        &self,
        store: &S,
        agent: AgentHandle,
        callback: NeighborCallback<'_>,
        squared_radius: Option<f64>,
    ) -> Result<(), GridError>
    where
        S: AgentStore + ?Sized,
    {
        match (callback, squared_radius) {
            (NeighborCallback::WithDistance(f), r) => {
                let radius = r.map_or(SearchRadius::Default, SearchRadius::Squared);
                self.for_each_neighbor(store, agent, radius, f)
            }
            (NeighborCallback::WithoutDistance(f), None) => self.for_each_candidate(store, agent, f),
            (NeighborCallback::WithoutDistance(f), Some(r)) => {
                self.for_each_neighbor(store, agent, SearchRadius::Squared(r), |h, _| f(h))
            }
        }
    }

    /// Call `f(agent, squared_distance)` for every agent within
    /// `squared_radius` of an arbitrary `position`, skipping `exclude`.
    pub fn for_each_neighbor_at<S, F>(
        &self,
        store: &S,
        position: Real3,
        squared_radius: f64,
        exclude: Option<AgentHandle>,
        mut f: F,
    ) -> Result<(), GridError>
    where
        S: AgentStore + ?Sized,
        F: FnMut(AgentHandle, f64),
    {
        if self.is_empty() {
            return Ok(());
        }
        self.check_radius(squared_radius)?;
        self.scan_within(store, position, exclude, Some(squared_radius), |h, d2| {
            f(h, d2);
            Ok::<(), GridError>(())
        })
    }

    /// Agents in a box, in enumeration order. Empty for an out-of-range index.
    pub fn bucket(&self, index: BoxIndex) -> &[AgentHandle] {
        if index.0 >= self.box_count() {
            return &[];
        }
        self.buckets().bucket(self.sequence().rank_of(index))
    }

    /// Call `f(box, agents)` for every non-empty box, in sequencer order.
    pub fn for_each_box<F>(&self, mut f: F)
    where
        F: FnMut(BoxIndex, &[AgentHandle]),
    {
        for (rank, agents) in self.buckets().occupied() {
            f(self.sequence().box_at(rank), agents);
        }
    }

    // ── Internals ──────────────────────────────────────────────────

    fn resolve_radius(&self, radius: SearchRadius) -> Result<f64, GridError> {
        let squared_radius = match radius {
            SearchRadius::Squared(r2) => r2,
            SearchRadius::Default => self.largest_agent_size_squared(),
        };
        self.check_radius(squared_radius)?;
        Ok(squared_radius)
    }

    /// A radius beyond the box length could reach past the 27-box block.
    fn check_radius(&self, squared_radius: f64) -> Result<(), GridError> {
        if squared_radius.is_nan() || squared_radius < 0.0 {
            return Err(GridError::InvalidSearchRadius { squared_radius });
        }
        let box_length = self.indexer().extent().box_length;
        if squared_radius > box_length * box_length {
            return Err(GridError::SearchRadiusTooLarge {
                squared_radius,
                box_length,
            });
        }
        Ok(())
    }

    fn squared_distance(&self, a: &Real3, b: &Real3) -> f64 {
        if self.indexer().policy() == BoundaryPolicy::Torus {
            squared_distance_periodic(a, b, self.indexer().period())
        } else {
            squared_distance(a, b)
        }
    }

    fn scan_within<S, E, F>(
        &self,
        store: &S,
        center: Real3,
        exclude: Option<AgentHandle>,
        squared_radius: Option<f64>,
        mut f: F,
    ) -> Result<(), E>
    where
        S: AgentStore + ?Sized,
        E: From<GridError>,
        F: FnMut(AgentHandle, f64) -> Result<(), E>,
    {
        self.visit_boxes(center, |h| {
            if Some(h) == exclude {
                return Ok(());
            }
            let position = store
                .position(h)
                .ok_or(GridError::UnknownAgent { agent: h })?;
            let d2 = self.squared_distance(&center, &position);
            if squared_radius.is_none_or(|r2| d2 <= r2) {
                f(h, d2)?;
            }
            Ok(())
        })
    }

    /// Visit every agent in the neighbourhood of `center`.
    fn visit_boxes<E, F>(&self, center: Real3, mut f: F) -> Result<(), E>
    where
        E: From<GridError>,
        F: FnMut(AgentHandle) -> Result<(), E>,
    {
        let coord = self.indexer().box_coord_of(center)?;
        let mut ranks: SmallVec<[usize; 27]> = self
            .indexer()
            .neighborhood(coord)
            .iter()
            .map(|&b| self.sequence().rank_of(b))
            .collect();
        ranks.sort_unstable();
        for rank in ranks {
            for &h in self.buckets().bucket(rank) {
                f(h)?;
            }
        }
        Ok(())
    }
}

fn reference_position<S: AgentStore + ?Sized>(
    store: &S,
    agent: AgentHandle,
) -> Result<Real3, GridError> {
    store
        .position(agent)
        .ok_or(GridError::UnknownAgent { agent })
}
