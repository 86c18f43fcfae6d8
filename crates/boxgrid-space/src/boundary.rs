//! Domain boundary policies for the grid.

use boxgrid_core::BoxCoord;

/// How the simulation domain treats its edges.
///
/// The policy changes three things: the grid envelope (observed vs fixed
/// cuboid), how a position resolves to a box, and whether the 27-box
/// neighbourhood wraps around.
///
/// # Examples
///
/// ```
/// use boxgrid_space::BoundaryPolicy;
///
/// // Closed: positions are clamped onto the bound cuboid.
/// assert_eq!(BoundaryPolicy::Closed.resolve_position(120.0, 0.0, 100.0), 100.0);
/// // Torus wraps it into the period.
/// assert_eq!(BoundaryPolicy::Torus.resolve_position(120.0, 0.0, 100.0), 20.0);
/// // Open leaves it alone.
/// assert_eq!(BoundaryPolicy::Open.resolve_position(120.0, 0.0, 100.0), 120.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryPolicy {
    /// Unbounded space: the grid grows to the observed agent envelope.
    #[default]
    Open,
    /// Reflecting cuboid `[min_bound, max_bound]^3`. Out-of-bounds positions
    /// index into the boundary box; the agent itself is not moved.
    Closed,
    /// Periodic cuboid `[min_bound, max_bound]^3`. Box coordinates wrap and
    /// neighbourhoods reach across opposite faces.
    Torus,
}

impl BoundaryPolicy {
    /// Returns `true` if the grid extent is the fixed bound cuboid rather
    /// than the observed agent envelope.
    pub fn is_bounded(self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Resolve one position component before box lookup.
    ///
    /// Closed clamps onto `[min_bound, max_bound]`, Torus wraps into
    /// `[min_bound, max_bound)`. Bounds must satisfy `min_bound < max_bound`
    /// for the bounded policies.
    pub fn resolve_position(self, value: f64, min_bound: f64, max_bound: f64) -> f64 {
        match self {
            Self::Open => value,
            Self::Closed => value.clamp(min_bound, max_bound),
            Self::Torus => min_bound + (value - min_bound).rem_euclid(max_bound - min_bound),
        }
    }

    /// Resolve one box coordinate component against an axis of `len` boxes.
    ///
    /// Returns `None` when the coordinate falls off a non-periodic grid.
    pub fn resolve_axis(self, val: i64, len: usize) -> Option<i64> {
        let n = len as i64;
        if val >= 0 && val < n {
            return Some(val);
        }
        match self {
            Self::Open | Self::Closed => None,
            Self::Torus if n > 0 => Some(val.rem_euclid(n)),
            Self::Torus => None,
        }
    }

    /// Resolve a full box coordinate, or `None` if any axis falls off.
    pub fn resolve_coord(self, coord: BoxCoord, boxes_per_axis: [usize; 3]) -> Option<BoxCoord> {
        Some([
            self.resolve_axis(coord[0], boxes_per_axis[0])?,
            self.resolve_axis(coord[1], boxes_per_axis[1])?,
            self.resolve_axis(coord[2], boxes_per_axis[2])?,
        ])
    }
}
