//! Uniform-grid neighbour search for agent-based simulations.
//!
//! This crate partitions 3-D space into cubic boxes whose edge is at least
//! the largest agent interaction diameter, so the interaction partners of
//! any agent lie in the 3×3×3 block of boxes around it. The grid is rebuilt
//! once per step from an [`AgentStore`](boxgrid_core::AgentStore) and then
//! queried concurrently.
//!
//! # Components
//!
//! - [`bounds`]: parallel envelope scan and grid extent resolution
//! - [`indexer`]: position → box coordinate → linear box index
//! - [`sequencer`]: Morton order over boxes
//! - [`buckets`]: flat, rank-ordered per-box agent lists
//! - [`UniformGrid`]: the build pipeline plus neighbour queries
//!
//! # Boundary policies
//!
//! [`BoundaryPolicy::Open`] grows the grid to the observed agents,
//! [`BoundaryPolicy::Closed`] clamps positions onto a fixed cuboid, and
//! [`BoundaryPolicy::Torus`] wraps the cuboid periodically.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod bounds;
pub mod buckets;
pub mod config;
pub mod error;
pub mod grid;
pub mod indexer;
pub mod metrics;
pub mod query;
pub mod sequencer;
pub mod space;

#[cfg(test)]
pub(crate) mod compliance;

pub use boundary::BoundaryPolicy;
pub use bounds::{AgentSample, Envelope, GridExtent};
pub use config::{ConfigError, GridConfig, DEFAULT_MAX_BOX_COUNT};
pub use error::GridError;
pub use grid::{UniformGrid, UpdateOutcome};
pub use indexer::BoxIndexer;
pub use metrics::BuildMetrics;
pub use query::{NeighborCallback, SearchRadius};
pub use sequencer::BoxSequence;
pub use space::{BruteForceIndex, SpatialIndex};
