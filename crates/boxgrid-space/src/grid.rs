//! The uniform grid: build pipeline, state, and index accessors.

use std::sync::Arc;
use std::time::Instant;

use boxgrid_core::{AgentStore, BoxCoord, BoxIndex, Real3};
use rayon::prelude::*;
use tracing::{debug, debug_span, info_span, warn};

use crate::boundary::BoundaryPolicy;
use crate::bounds::{collect_samples, AgentSample, Envelope, GridExtent};
use crate::buckets::BucketStore;
use crate::config::{validate_box_length, ConfigError, GridConfig};
use crate::error::GridError;
use crate::indexer::BoxIndexer;
use crate::metrics::BuildMetrics;
use crate::sequencer::BoxSequence;

/// Result of [`UniformGrid::update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The grid was rebuilt from the store.
    Rebuilt,
    /// Nothing relevant changed; the previous grid was kept.
    Skipped,
}

/// Uniform-grid spatial index over the agents of an [`AgentStore`].
///
/// Space is partitioned into cubic boxes of edge length `L` at least as
/// large as the largest interaction diameter, so every interaction partner
/// of an agent lies in the 3×3×3 block of boxes around it. The grid is
/// rebuilt once per simulation step with [`update`](Self::update) or
/// [`forced_update`](Self::forced_update) (which take `&mut self`) and then
/// queried concurrently through `&self`.
///
/// A rebuild that fails leaves the previous grid in place.
///
/// # Examples
///
/// ```
/// use boxgrid_core::AgentHandle;
/// use boxgrid_space::{GridConfig, SearchRadius, UniformGrid};
/// use boxgrid_test_utils::lattice;
///
/// let store = lattice(4, 20.0, 30.0);
/// let mut grid = UniformGrid::new(GridConfig::default()).unwrap();
/// grid.forced_update(&store).unwrap();
/// assert_eq!(grid.box_length(), 30.0);
///
/// let mut found = Vec::new();
/// grid.for_each_neighbor(&store, AgentHandle(0), SearchRadius::Squared(900.0), |h, _| found.push(h.0))
///     .unwrap();
/// found.sort();
/// assert_eq!(found, vec![1, 4, 5, 16, 17, 20]);
/// ```
#[derive(Clone, Debug)]
pub struct UniformGrid {
    config: GridConfig,
    indexer: BoxIndexer,
    sequence: Arc<BoxSequence>,
    buckets: BucketStore,
    /// Samples of the last successful build, for change detection.
    samples: Vec<AgentSample>,
    largest_diameter: f64,
    /// Open grids only: running `[min lower, max upper]` dimension.
    observed_thresholds: Option<[f64; 2]>,
    metrics: BuildMetrics,
    /// Set by configuration changes; forces the next `update` to rebuild.
    dirty: bool,
}

impl UniformGrid {
    /// Create an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    pub fn new(config: GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let extent = GridExtent::empty(config.box_length.unwrap_or(1.0));
        Ok(Self {
            indexer: BoxIndexer::new(extent, &config),
            config,
            ..Self::default()
        })
    }

    // ── Build ──────────────────────────────────────────────────────

    /// Rebuild the grid unless nothing that affects neighbour relations
    /// changed since the last successful build.
    ///
    /// The change check is exact: every agent's handle, position, and
    /// radius is compared against the previous build, in parallel. Any
    /// configuration change since the last build also forces a rebuild.
    pub fn update<S: AgentStore + ?Sized>(&mut self, store: &S) -> Result<UpdateOutcome, GridError> {
        let start = Instant::now();
        let samples = collect_samples(store)?;
        let unchanged = !self.dirty
            && samples.len() == self.samples.len()
            && samples.par_iter().zip(self.samples.par_iter()).all(|(a, b)| a == b);
        let compare_us = start.elapsed().as_micros() as u64;
        if unchanged {
            debug!(agents = samples.len(), "agents unchanged, grid rebuild skipped");
            self.metrics = BuildMetrics {
                total_us: start.elapsed().as_micros() as u64,
                compare_us,
                bounds_us: 0,
                sequence_us: 0,
                populate_us: 0,
                skipped: true,
                ..self.metrics.clone()
            };
            return Ok(UpdateOutcome::Skipped);
        }
        self.rebuild(samples, start, compare_us)?;
        Ok(UpdateOutcome::Rebuilt)
    }

    /// Rebuild the grid unconditionally.
    pub fn forced_update<S: AgentStore + ?Sized>(&mut self, store: &S) -> Result<(), GridError> {
        let start = Instant::now();
        let samples = collect_samples(store)?;
        let read_us = start.elapsed().as_micros() as u64;
        self.rebuild(samples, start, read_us)
    }

    fn rebuild(
        &mut self,
        samples: Vec<AgentSample>,
        start: Instant,
        compare_us: u64,
    ) -> Result<(), GridError> {
        let _span = info_span!("UniformGrid::rebuild", agents = samples.len()).entered();

        let bounds_start = Instant::now();
        let envelope = {
            let _s = debug_span!("bounds").entered();
            Envelope::scan(&samples)
        };
        let derived = envelope.largest_diameter.ceil().max(1.0);
        let box_length = self.config.box_length.unwrap_or(derived);
        let box_length_violation = self
            .config
            .box_length
            .is_some_and(|l| l < envelope.largest_diameter);
        let extent = if envelope.is_empty() {
            GridExtent::empty(box_length)
        } else {
            GridExtent::resolve(&envelope, box_length, &self.config)?
        };
        let indexer = BoxIndexer::new(extent, &self.config);
        let bounds_us = bounds_start.elapsed().as_micros() as u64;

        let seq_start = Instant::now();
        let sequence = {
            let _s = debug_span!("sequence", boxes = extent.box_count()).entered();
            if self.sequence.boxes_per_axis() == extent.boxes_per_axis {
                Arc::clone(&self.sequence)
            } else {
                Arc::new(BoxSequence::new(extent.boxes_per_axis)?)
            }
        };
        let sequence_us = seq_start.elapsed().as_micros() as u64;

        let pop_start = Instant::now();
        let (buckets, clamped_agents) = {
            let _s = debug_span!("populate").entered();
            let assignments = samples
                .par_iter()
                .map(|s| {
                    let index = indexer.box_index(s.position)?;
                    Ok((sequence.rank_of(index), s.handle))
                })
                .collect::<Result<Vec<_>, GridError>>()?;
            let clamped = if self.config.policy == BoundaryPolicy::Closed {
                samples
                    .par_iter()
                    .filter(|s| indexer.is_outside_bounds(&s.position))
                    .count()
            } else {
                0
            };
            (BucketStore::populate(assignments, extent.box_count()), clamped)
        };
        let populate_us = pop_start.elapsed().as_micros() as u64;

        // Everything fallible is done; commit.
        if box_length_violation {
            warn!(
                box_length,
                largest_diameter = envelope.largest_diameter,
                "fixed box length is smaller than the largest agent diameter"
            );
        }
        if clamped_agents > 0 {
            warn!(clamped_agents, "agents outside the closed domain were indexed at the boundary");
        }
        if self.indexer.policy() != self.config.policy {
            self.observed_thresholds = None;
        }
        if self.config.policy == BoundaryPolicy::Open && !envelope.is_empty() {
            let d = extent.dimensions;
            let lo = d[0].min(d[2]).min(d[4]);
            let hi = d[1].max(d[3]).max(d[5]);
            self.observed_thresholds = Some(match self.observed_thresholds {
                Some([t_lo, t_hi]) => [t_lo.min(lo), t_hi.max(hi)],
                None => [lo, hi],
            });
        }
        self.metrics = BuildMetrics {
            total_us: start.elapsed().as_micros() as u64,
            compare_us,
            bounds_us,
            sequence_us,
            populate_us,
            agent_count: samples.len(),
            box_count: extent.box_count(),
            occupied_boxes: buckets.occupied_boxes(),
            largest_bucket: buckets.largest_bucket(),
            clamped_agents,
            skipped: false,
            box_length_violation,
        };
        self.indexer = indexer;
        self.sequence = sequence;
        self.buckets = buckets;
        self.samples = samples;
        self.largest_diameter = envelope.largest_diameter;
        self.dirty = false;
        Ok(())
    }

    // ── Configuration ──────────────────────────────────────────────

    /// Current configuration.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Replace the configuration. Takes effect at the next update; until
    /// then queries, indexing, and thresholds keep using the built grid.
    pub fn set_config(&mut self, config: GridConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.dirty = true;
        Ok(())
    }

    /// Fix the box length instead of deriving it from agent diameters.
    ///
    /// The value is reported by [`box_length`](Self::box_length) right away
    /// and used for indexing from the next update on. A length smaller than
    /// the largest agent diameter is accepted but flagged at build time.
    pub fn set_box_length(&mut self, box_length: f64) -> Result<(), ConfigError> {
        validate_box_length(box_length)?;
        self.config.box_length = Some(box_length);
        self.dirty = true;
        Ok(())
    }

    /// Go back to deriving the box length from the largest agent diameter.
    pub fn clear_box_length(&mut self) {
        self.config.box_length = None;
        self.dirty = true;
    }

    // ── Accessors ──────────────────────────────────────────────────

    /// Box edge length.
    ///
    /// A length fixed with [`set_box_length`](Self::set_box_length) since the
    /// last build is reported as-is; otherwise this is the edge length of
    /// the current grid (for Torus, the period divided by the box count).
    pub fn box_length(&self) -> f64 {
        match self.config.box_length {
            Some(fixed) if self.dirty => fixed,
            _ => self.indexer.extent().box_length,
        }
    }

    /// Grid extent as `[x_lo, x_hi, y_lo, y_hi, z_lo, z_hi]`.
    pub fn dimensions(&self) -> [f64; 6] {
        self.indexer.extent().dimensions
    }

    /// Lower corner of box `(0, 0, 0)`.
    pub fn origin(&self) -> Real3 {
        self.indexer.extent().origin
    }

    /// `[lo, hi]` the domain has covered, as of the last build.
    ///
    /// Closed and Torus grids report the bound cuboid. Open grids report the
    /// smallest lower and largest upper grid dimension over every build so
    /// far; the range never shrinks. `[0, 0]` before the first non-empty
    /// Open build.
    pub fn dimension_thresholds(&self) -> [f64; 2] {
        if self.indexer.policy().is_bounded() {
            self.indexer.bounds()
        } else {
            self.observed_thresholds.unwrap_or([0.0, 0.0])
        }
    }

    /// Number of boxes along each axis.
    pub fn boxes_per_axis(&self) -> [usize; 3] {
        self.indexer.extent().boxes_per_axis
    }

    /// Total number of boxes.
    pub fn box_count(&self) -> usize {
        self.indexer.box_count()
    }

    /// Agents indexed by the current grid.
    pub fn agent_count(&self) -> usize {
        self.buckets.agent_count()
    }

    /// Returns `true` if the grid has no boxes.
    pub fn is_empty(&self) -> bool {
        self.indexer.is_empty()
    }

    /// Square of the largest interaction diameter seen at the last build.
    pub fn largest_agent_size_squared(&self) -> f64 {
        self.largest_diameter * self.largest_diameter
    }

    /// Metrics of the last update.
    pub fn last_build_metrics(&self) -> &BuildMetrics {
        &self.metrics
    }

    /// Box coordinate containing `position`, after the boundary policy.
    pub fn box_coord_of(&self, position: Real3) -> Result<BoxCoord, GridError> {
        self.indexer.box_coord_of(position)
    }

    /// Linear index of the box containing `position`.
    pub fn box_index(&self, position: Real3) -> Result<BoxIndex, GridError> {
        self.indexer.box_index(position)
    }

    /// Box coordinate of a linear box index.
    pub fn box_coordinates(&self, index: BoxIndex) -> Result<BoxCoord, GridError> {
        self.indexer.box_coordinates(index)
    }

    pub(crate) fn indexer(&self) -> &BoxIndexer {
        &self.indexer
    }

    pub(crate) fn sequence(&self) -> &BoxSequence {
        &self.sequence
    }

    pub(crate) fn buckets(&self) -> &BucketStore {
        &self.buckets
    }
}

impl Default for UniformGrid {
    fn default() -> Self {
        let config = GridConfig::default();
        let indexer = BoxIndexer::new(GridExtent::empty(1.0), &config);
        Self {
            config,
            indexer,
            sequence: Arc::new(BoxSequence::empty()),
            buckets: BucketStore::empty(),
            samples: Vec::new(),
            largest_diameter: 0.0,
            observed_thresholds: None,
            metrics: BuildMetrics::default(),
            dirty: true,
        }
    }
}
