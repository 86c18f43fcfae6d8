//! Bounds estimation and grid extent resolution.
//!
//! One parallel pass reads every agent's position and radius out of the
//! store ([`collect_samples`]). A partitioned reduction over those samples
//! produces the [`Envelope`], and [`GridExtent::resolve`] turns the envelope
//! into a padded, box-aligned grid according to the boundary policy.

use boxgrid_core::math::is_finite;
use boxgrid_core::{AgentHandle, AgentStore, Real3};
use rayon::prelude::*;

use crate::boundary::BoundaryPolicy;
use crate::config::GridConfig;
use crate::error::GridError;

/// Agents per reduction partition.
const PARTITION_SIZE: usize = 4096;

/// Largest box count along one axis. Morton codes interleave 21 bits per axis.
pub const MAX_BOXES_PER_AXIS: usize = 1 << 21;

/// One agent as seen by a rebuild: handle, position, and radius.
///
/// A rebuild works exclusively from samples, so the store is read once
/// per agent per step. The samples of the last successful build are kept
/// for change detection in [`UniformGrid::update`](crate::UniformGrid::update).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentSample {
    /// Agent handle.
    pub handle: AgentHandle,
    /// Position at the time of the scan.
    pub position: Real3,
    /// Interaction radius at the time of the scan.
    pub radius: f64,
}

/// Read every agent from the store in parallel, validating as we go.
///
/// Output order equals the store's enumeration order.
pub fn collect_samples<S: AgentStore + ?Sized>(store: &S) -> Result<Vec<AgentSample>, GridError> {
    (0..store.agent_count())
        .into_par_iter()
        .map(|i| {
            let handle = store.agent_at(i);
            let position = store
                .position(handle)
                .ok_or(GridError::UnknownAgent { agent: handle })?;
            if !is_finite(&position) {
                return Err(GridError::NonFinitePosition {
                    agent: handle,
                    position,
                });
            }
            let radius = store
                .interaction_radius(handle)
                .ok_or(GridError::UnknownAgent { agent: handle })?;
            if !(radius.is_finite() && radius >= 0.0) {
                return Err(GridError::InvalidRadius {
                    agent: handle,
                    radius,
                });
            }
            Ok(AgentSample {
                handle,
                position,
                radius,
            })
        })
        .collect()
}

// ── Envelope ───────────────────────────────────────────────────────

/// Per-axis extremes of agent positions plus the largest diameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    /// Per-axis minimum position.
    pub min: Real3,
    /// Per-axis maximum position.
    pub max: Real3,
    /// Largest interaction diameter (`2 * radius`).
    pub largest_diameter: f64,
    /// Number of agents folded into this envelope.
    pub agent_count: usize,
}

impl Envelope {
    /// Identity element of [`merge`](Self::merge).
    pub const EMPTY: Self = Self {
        min: [f64::INFINITY; 3],
        max: [f64::NEG_INFINITY; 3],
        largest_diameter: 0.0,
        agent_count: 0,
    };

    /// Sequential envelope of one partition.
    pub fn of(samples: &[AgentSample]) -> Self {
        let mut env = Self::EMPTY;
        for s in samples {
            for axis in 0..3 {
                env.min[axis] = env.min[axis].min(s.position[axis]);
                env.max[axis] = env.max[axis].max(s.position[axis]);
            }
            env.largest_diameter = env.largest_diameter.max(2.0 * s.radius);
        }
        env.agent_count = samples.len();
        env
    }

    /// Combine two envelopes. Associative and commutative.
    pub fn merge(self, other: Self) -> Self {
        let mut out = self;
        for axis in 0..3 {
            out.min[axis] = out.min[axis].min(other.min[axis]);
            out.max[axis] = out.max[axis].max(other.max[axis]);
        }
        out.largest_diameter = out.largest_diameter.max(other.largest_diameter);
        out.agent_count += other.agent_count;
        out
    }

    /// Reduce partitions on the rayon pool, then merge the partials in order.
    pub fn scan(samples: &[AgentSample]) -> Self {
        let partials: Vec<Self> = samples.par_chunks(PARTITION_SIZE).map(Self::of).collect();
        partials.into_iter().fold(Self::EMPTY, Self::merge)
    }

    /// Returns `true` if no agent was folded in.
    pub fn is_empty(&self) -> bool {
        self.agent_count == 0
    }
}

// ── GridExtent ─────────────────────────────────────────────────────

/// Box-aligned spatial extent of one grid build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridExtent {
    /// Lower corner of box `(0, 0, 0)`.
    pub origin: Real3,
    /// `[x_lo, x_hi, y_lo, y_hi, z_lo, z_hi]`.
    pub dimensions: [f64; 6],
    /// Number of boxes along each axis.
    pub boxes_per_axis: [usize; 3],
    /// Edge length of every box.
    pub box_length: f64,
}

impl GridExtent {
    /// A zero-box extent.
    pub fn empty(box_length: f64) -> Self {
        Self {
            origin: [0.0; 3],
            dimensions: [0.0; 6],
            boxes_per_axis: [0; 3],
            box_length,
        }
    }

    /// Total number of boxes.
    pub fn box_count(&self) -> usize {
        self.boxes_per_axis.iter().product()
    }

    /// Derive the grid extent for an envelope and box length.
    ///
    /// Open grids cover the observed envelope, Closed grids the bound
    /// cuboid; both are rounded out to a whole number of boxes and padded
    /// by one box on every side. Torus grids tile the period exactly,
    /// stretching the box edge to `period / floor(period / box_length)`.
    pub fn resolve(
        envelope: &Envelope,
        box_length: f64,
        config: &GridConfig,
    ) -> Result<Self, GridError> {
        let mut extent = Self::empty(box_length);
        match config.policy {
            BoundaryPolicy::Open | BoundaryPolicy::Closed => {
                for axis in 0..3 {
                    let (min, max) = if config.policy == BoundaryPolicy::Open {
                        (envelope.min[axis], envelope.max[axis])
                    } else {
                        (config.min_bound, config.max_bound)
                    };
                    let (lo, hi, n) = padded_axis(min, max, box_length, axis)?;
                    extent.origin[axis] = lo;
                    extent.dimensions[2 * axis] = lo;
                    extent.dimensions[2 * axis + 1] = hi;
                    extent.boxes_per_axis[axis] = n;
                }
            }
            BoundaryPolicy::Torus => {
                let period = config.period();
                let n = (period / box_length).floor().max(1.0);
                if n > MAX_BOXES_PER_AXIS as f64 {
                    return Err(GridError::IndexOverflow { axis: 0, value: n });
                }
                extent.box_length = period / n;
                extent.origin = [config.min_bound; 3];
                extent.dimensions = [
                    config.min_bound,
                    config.max_bound,
                    config.min_bound,
                    config.max_bound,
                    config.min_bound,
                    config.max_bound,
                ];
                extent.boxes_per_axis = [n as usize; 3];
            }
        }

        let requested = extent
            .boxes_per_axis
            .iter()
            .try_fold(1u64, |acc, &n| acc.checked_mul(n as u64))
            .unwrap_or(u64::MAX);
        if requested > config.max_box_count as u64 {
            return Err(GridError::TooManyBoxes {
                requested,
                max: config.max_box_count,
            });
        }
        Ok(extent)
    }
}

/// Round `[min, max]` out to whole boxes, then pad one box on each side.
///
/// When the rounded span is already a multiple of the box length one extra
/// box is added, because the outermost agent sits exactly on the upper edge.
fn padded_axis(
    min: f64,
    max: f64,
    box_length: f64,
    axis: usize,
) -> Result<(f64, f64, usize), GridError> {
    let lo = min.floor();
    let mut hi = max.ceil();
    let r = (hi - lo) % box_length;
    if r != 0.0 {
        hi += box_length - r;
    } else {
        hi += box_length;
    }
    let lo = lo - box_length;
    let hi = hi + box_length;

    let n = ((hi - lo) / box_length).round();
    if !n.is_finite() || n < 3.0 || n > MAX_BOXES_PER_AXIS as f64 {
        return Err(GridError::IndexOverflow { axis, value: n });
    }
    let n = n as usize;
    Ok((lo, lo + n as f64 * box_length, n))
}
