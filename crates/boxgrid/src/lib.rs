//! Boxgrid: uniform-grid neighbour search for agent-based simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the boxgrid sub-crates. For most users, adding `boxgrid` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use boxgrid::prelude::*;
//!
//! // The simulation owns its agents; the grid only reads them.
//! struct Cells {
//!     positions: Vec<Real3>,
//!     diameter: f64,
//! }
//!
//! impl AgentStore for Cells {
//!     fn agent_count(&self) -> usize {
//!         self.positions.len()
//!     }
//!     fn agent_at(&self, index: usize) -> AgentHandle {
//!         AgentHandle(index as u64)
//!     }
//!     fn position(&self, agent: AgentHandle) -> Option<Real3> {
//!         self.positions.get(agent.0 as usize).copied()
//!     }
//!     fn interaction_radius(&self, agent: AgentHandle) -> Option<f64> {
//!         self.positions.get(agent.0 as usize).map(|_| self.diameter / 2.0)
//!     }
//! }
//!
//! let cells = Cells {
//!     positions: vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [9.0, 0.0, 0.0]],
//!     diameter: 5.0,
//! };
//! let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
//! grid.update(&cells).unwrap();
//!
//! let mut near = Vec::new();
//! grid.for_each_neighbor(&cells, AgentHandle(0), SearchRadius::Default, |h, d2| {
//!     near.push((h, d2))
//! })
//! .unwrap();
//! assert_eq!(near, vec![(AgentHandle(1), 9.0)]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `boxgrid-core` | Handles, box indices, vector math, the `AgentStore` trait |
//! | [`space`] | `boxgrid-space` | The uniform grid, boundary policies, queries |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`boxgrid-core`).
///
/// Contains [`types::AgentHandle`], [`types::BoxIndex`], the vector helpers
/// in [`types::math`], and the [`types::AgentStore`] collaborator trait.
pub use boxgrid_core as types;

/// The uniform grid and its components (`boxgrid-space`).
///
/// Provides [`space::UniformGrid`], [`space::GridConfig`],
/// [`space::BoundaryPolicy`], and the [`space::SpatialIndex`] trait.
pub use boxgrid_space as space;

/// Common imports for typical boxgrid usage.
///
/// ```rust
/// use boxgrid::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use boxgrid_core::{AgentHandle, AgentStore, BoxCoord, BoxIndex, Real3};

    // Configuration and errors
    pub use boxgrid_space::{BoundaryPolicy, ConfigError, GridConfig, GridError};

    // Grid and queries
    pub use boxgrid_space::{
        BuildMetrics, NeighborCallback, SearchRadius, SpatialIndex, UniformGrid, UpdateOutcome,
    };
}
