//! Per-rebuild metrics for the uniform grid.
//!
//! [`BuildMetrics`] captures timing and occupancy data for a single call to
//! `update` or `forced_update`, for telemetry and for tuning the box length.

/// Timing and occupancy metrics collected during a single grid update.
///
/// All durations are in microseconds. The grid replaces these after each
/// successful `update()`/`forced_update()` call; a failed rebuild leaves the
/// previous metrics in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BuildMetrics {
    /// Wall-clock time for the entire update, in microseconds.
    pub total_us: u64,
    /// Time spent reading agents and, for `update()`, comparing them with
    /// the previous build, in microseconds.
    pub compare_us: u64,
    /// Time spent reducing the envelope and resolving the extent, in microseconds.
    pub bounds_us: u64,
    /// Time spent building (or reusing) the box sequence, in microseconds.
    pub sequence_us: u64,
    /// Time spent assigning agents to buckets, in microseconds.
    pub populate_us: u64,
    /// Agents indexed by the grid.
    pub agent_count: usize,
    /// Boxes in the grid.
    pub box_count: usize,
    /// Boxes holding at least one agent.
    pub occupied_boxes: usize,
    /// Agents in the fullest box.
    pub largest_bucket: usize,
    /// Agents outside a Closed domain that were indexed at the boundary.
    pub clamped_agents: usize,
    /// `true` if `update()` found nothing changed and kept the previous grid.
    pub skipped: bool,
    /// `true` if a fixed box length is smaller than the largest agent diameter.
    pub box_length_violation: bool,
}
