//! Error types for grid construction and neighbour queries.

use boxgrid_core::{AgentHandle, BoxCoord, BoxIndex, Real3};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors arising from grid rebuilds, index arithmetic, or neighbour queries.
///
/// Build-time errors are all-or-nothing: the grid that was live before the
/// failing rebuild stays untouched and queryable.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GridError {
    /// The grid configuration is invalid.
    #[error("invalid grid configuration: {0}")]
    Config(#[from] ConfigError),
    /// An agent reported a NaN or infinite coordinate. This indicates
    /// corrupted agent state upstream and aborts the rebuild.
    #[error("agent {agent} has non-finite position {position:?}")]
    NonFinitePosition {
        /// The offending agent.
        agent: AgentHandle,
        /// The position as read from the store.
        position: Real3,
    },
    /// A query position contains a NaN or infinite coordinate.
    #[error("query position {position:?} is not finite")]
    NonFiniteQuery {
        /// The offending position.
        position: Real3,
    },
    /// An agent reported a negative or non-finite interaction radius.
    #[error("agent {agent} has invalid interaction radius {radius}")]
    InvalidRadius {
        /// The offending agent.
        agent: AgentHandle,
        /// The radius as read from the store.
        radius: f64,
    },
    /// The agent store does not know this handle.
    #[error("agent {agent} is not present in the agent store")]
    UnknownAgent {
        /// The unknown handle.
        agent: AgentHandle,
    },
    /// Box arithmetic left the representable range. Caused by extreme
    /// position magnitudes.
    #[error("box index arithmetic overflowed on axis {axis} (value {value})")]
    IndexOverflow {
        /// Axis (0 = x, 1 = y, 2 = z).
        axis: usize,
        /// The value that could not be represented.
        value: f64,
    },
    /// The grid would need more boxes than `GridConfig::max_box_count`.
    #[error("grid needs {requested} boxes, budget is {max}")]
    TooManyBoxes {
        /// Boxes the envelope would require.
        requested: u64,
        /// The configured budget.
        max: usize,
    },
    /// Index operations are undefined on a grid with zero boxes.
    #[error("grid is empty")]
    EmptyGrid,
    /// A box coordinate lies outside the current grid extent.
    #[error("box coordinate {coord:?} is outside the grid")]
    OutsideGrid {
        /// The coordinate that was requested.
        coord: BoxCoord,
    },
    /// A box index is not smaller than the box count.
    #[error("box index {index} out of range for {count} boxes")]
    BoxOutOfRange {
        /// The index that was requested.
        index: BoxIndex,
        /// Number of boxes in the current grid.
        count: usize,
    },
    /// The squared search radius exceeds the squared box length, so the
    /// 27-box neighbourhood cannot contain every qualifying neighbour.
    #[error("squared search radius {squared_radius} exceeds squared box length ({box_length}^2)")]
    SearchRadiusTooLarge {
        /// The requested squared radius.
        squared_radius: f64,
        /// Box length of the current grid.
        box_length: f64,
    },
    /// The squared search radius is negative or NaN.
    #[error("squared search radius {squared_radius} is not a valid distance")]
    InvalidSearchRadius {
        /// The requested squared radius.
        squared_radius: f64,
    },
}
