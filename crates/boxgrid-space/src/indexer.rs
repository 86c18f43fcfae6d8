//! Box indexer: positions to box coordinates to linear box indices.

use boxgrid_core::math::is_finite;
use boxgrid_core::{BoxCoord, BoxIndex, Real3};
use smallvec::SmallVec;

use crate::boundary::BoundaryPolicy;
use crate::bounds::GridExtent;
use crate::config::GridConfig;
use crate::error::GridError;

/// Box coordinates beyond this magnitude are rejected before integer conversion.
const MAX_COORD_MAGNITUDE: f64 = (1u64 << 40) as f64;

/// The 27 offsets of a 3×3×3 neighbourhood, x fastest.
const NEIGHBOR_OFFSETS: [[i64; 3]; 27] = {
    let mut out = [[0i64; 3]; 27];
    let mut i = 0;
    while i < 27 {
        out[i] = [(i % 3) as i64 - 1, ((i / 3) % 3) as i64 - 1, (i / 9) as i64 - 1];
        i += 1;
    }
    out
};

/// Maps positions onto the boxes of one grid build.
///
/// An indexer is immutable and tied to the [`GridExtent`] it was built
/// from; every rebuild produces a new one. Linearisation is
/// `x + y * nx + z * nx * ny`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxIndexer {
    extent: GridExtent,
    policy: BoundaryPolicy,
    min_bound: f64,
    max_bound: f64,
}

impl BoxIndexer {
    /// Indexer for `extent` under the policy and bounds of `config`.
    pub fn new(extent: GridExtent, config: &GridConfig) -> Self {
        Self {
            extent,
            policy: config.policy,
            min_bound: config.min_bound,
            max_bound: config.max_bound,
        }
    }

    /// The extent this indexer resolves against.
    pub fn extent(&self) -> &GridExtent {
        &self.extent
    }

    /// Boundary policy in effect.
    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// `[min_bound, max_bound]` of the configuration this indexer was built from.
    pub fn bounds(&self) -> [f64; 2] {
        [self.min_bound, self.max_bound]
    }

    /// Span of the bound cuboid; the period of a Torus grid.
    pub fn period(&self) -> f64 {
        self.max_bound - self.min_bound
    }

    /// Total number of boxes.
    pub fn box_count(&self) -> usize {
        self.extent.box_count()
    }

    /// Returns `true` if the grid has no boxes.
    pub fn is_empty(&self) -> bool {
        self.box_count() == 0
    }

    /// Apply the boundary policy to a position.
    ///
    /// Closed clamps onto the bound cuboid and Torus wraps into the period.
    pub fn resolve_position(&self, position: Real3) -> Real3 {
        position.map(|v| self.policy.resolve_position(v, self.min_bound, self.max_bound))
    }

    /// Returns `true` if a Closed policy would clamp this position.
    pub fn is_outside_bounds(&self, position: &Real3) -> bool {
        self.policy == BoundaryPolicy::Closed
            && position
                .iter()
                .any(|&v| v < self.min_bound || v > self.max_bound)
    }

    /// Box coordinate containing `position`.
    ///
    /// A position exactly on a grid line belongs to the box on its positive
    /// side. Under the Open policy the result may lie outside the grid.
    /// Under Torus the box is located on the unwrapped position and only the
    /// integer coordinate wraps, so a value just below `min_bound` lands in
    /// the last box rather than rounding onto the seam.
    pub fn box_coord_of(&self, position: Real3) -> Result<BoxCoord, GridError> {
        if self.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        if !is_finite(&position) {
            return Err(GridError::NonFiniteQuery { position });
        }
        let mut coord = [0i64; 3];
        for (axis, &value) in position.iter().enumerate() {
            let c = self.unwrapped_coord(value, axis);
            if !c.is_finite() || c.abs() >= MAX_COORD_MAGNITUDE {
                return Err(GridError::IndexOverflow { axis, value: c });
            }
            coord[axis] = c as i64;
        }
        if self.policy == BoundaryPolicy::Torus {
            for (axis, c) in coord.iter_mut().enumerate() {
                *c = c.rem_euclid(self.extent.boxes_per_axis[axis] as i64);
            }
        }
        Ok(coord)
    }

    /// Box coordinate along one axis before any Torus wrap.
    fn unwrapped_coord(&self, value: f64, axis: usize) -> f64 {
        let origin = self.extent.origin[axis];
        let length = self.extent.box_length;
        let resolved = self.policy.resolve_position(value, self.min_bound, self.max_bound);
        if self.policy != BoundaryPolicy::Torus {
            return axis_coord(resolved, origin, length);
        }
        let c = axis_coord(value, origin, length);
        if c.is_finite() && c.abs() < MAX_COORD_MAGNITUDE {
            c
        } else {
            // Too many periods away to count boxes directly.
            axis_coord(resolved, origin, length)
        }
    }

    /// Linear index of a box coordinate.
    pub fn linear_index(&self, coord: BoxCoord) -> Result<BoxIndex, GridError> {
        if self.is_empty() {
            return Err(GridError::EmptyGrid);
        }
        let [nx, ny, nz] = self.extent.boxes_per_axis;
        let in_range = |c: i64, n: usize| c >= 0 && (c as u64) < n as u64;
        if !(in_range(coord[0], nx) && in_range(coord[1], ny) && in_range(coord[2], nz)) {
            return Err(GridError::OutsideGrid { coord });
        }
        Ok(BoxIndex(self.linearize(coord)))
    }

    /// Linear index of the box containing `position`.
    pub fn box_index(&self, position: Real3) -> Result<BoxIndex, GridError> {
        self.linear_index(self.box_coord_of(position)?)
    }

    /// Box coordinate of a linear index. Inverse of [`linear_index`](Self::linear_index).
    pub fn box_coordinates(&self, index: BoxIndex) -> Result<BoxCoord, GridError> {
        let count = self.box_count();
        if count == 0 {
            return Err(GridError::EmptyGrid);
        }
        if index.0 >= count {
            return Err(GridError::BoxOutOfRange { index, count });
        }
        Ok(self.delinearize(index.0))
    }

    /// Boxes of the 3×3×3 neighbourhood around `coord`, including `coord`.
    ///
    /// Open and Closed grids drop boxes that fall off the grid; Torus grids
    /// wrap them, removing duplicates when an axis has fewer than three boxes.
    pub fn neighborhood(&self, coord: BoxCoord) -> SmallVec<[BoxIndex; 27]> {
        let dims = self.extent.boxes_per_axis;
        let mut out: SmallVec<[BoxIndex; 27]> = NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|d| {
                let c = [coord[0] + d[0], coord[1] + d[1], coord[2] + d[2]];
                self.policy
                    .resolve_coord(c, dims)
                    .map(|c| BoxIndex(self.linearize(c)))
            })
            .collect();
        if self.policy == BoundaryPolicy::Torus && dims.iter().any(|&n| n < 3) {
            out.sort_unstable();
            out.dedup();
        }
        out
    }

    /// Caller guarantees `coord` is inside the grid.
    pub(crate) fn linearize(&self, coord: BoxCoord) -> usize {
        let [nx, ny, _] = self.extent.boxes_per_axis;
        coord[0] as usize + coord[1] as usize * nx + coord[2] as usize * nx * ny
    }

    /// Caller guarantees `index < box_count()`.
    pub(crate) fn delinearize(&self, index: usize) -> BoxCoord {
        let [nx, ny, _] = self.extent.boxes_per_axis;
        let z = index / (nx * ny);
        let rem = index % (nx * ny);
        [(rem % nx) as i64, (rem / nx) as i64, z as i64]
    }
}

/// Floor of `(value - origin) / box_length`, corrected against the grid
/// lines `origin + c * box_length` so that values an ulp below a line land
/// in the lower box even when the subtraction rounds them onto it.
fn axis_coord(value: f64, origin: f64, box_length: f64) -> f64 {
    let mut c = ((value - origin) / box_length).floor();
    if !c.is_finite() {
        return c;
    }
    if value < origin + c * box_length {
        c -= 1.0;
    } else if value >= origin + (c + 1.0) * box_length {
        c += 1.0;
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Envelope;
    use proptest::prelude::*;

    fn lattice_indexer() -> BoxIndexer {
        // The 3×3×3 lattice with spacing 20 and diameter 30.
        let env = Envelope {
            min: [0.0; 3],
            max: [40.0; 3],
            largest_diameter: 30.0,
            agent_count: 27,
        };
        let cfg = GridConfig::default();
        BoxIndexer::new(GridExtent::resolve(&env, 30.0, &cfg).unwrap(), &cfg)
    }

    fn torus_indexer(period: f64, box_length: f64) -> BoxIndexer {
        let cfg = GridConfig::torus(0.0, period);
        let env = Envelope::EMPTY;
        BoxIndexer::new(GridExtent::resolve(&env, box_length, &cfg).unwrap(), &cfg)
    }

    #[test]
    fn offsets_cover_cube() {
        assert_eq!(NEIGHBOR_OFFSETS[0], [-1, -1, -1]);
        assert_eq!(NEIGHBOR_OFFSETS[13], [0, 0, 0]);
        assert_eq!(NEIGHBOR_OFFSETS[26], [1, 1, 1]);
    }

    #[test]
    fn box_index_tie_break() {
        let idx = lattice_indexer();
        assert_eq!(idx.box_index([0.0, 0.0, 0.0]).unwrap(), BoxIndex(21));
        assert_eq!(idx.box_index([1e-15, 1e-15, 1e-15]).unwrap(), BoxIndex(21));
        assert_eq!(idx.box_index([-1e-15, 1e-15, 1e-15]).unwrap(), BoxIndex(20));
    }

    #[test]
    fn box_coordinates_of_index() {
        let idx = lattice_indexer();
        assert_eq!(idx.box_coordinates(BoxIndex(3)).unwrap(), [3, 0, 0]);
        assert_eq!(idx.box_coordinates(BoxIndex(9)).unwrap(), [1, 2, 0]);
        assert_eq!(idx.box_coordinates(BoxIndex(57)).unwrap(), [1, 2, 3]);
        assert!(matches!(
            idx.box_coordinates(BoxIndex(64)),
            Err(GridError::BoxOutOfRange { count: 64, .. })
        ));
    }

    #[test]
    fn empty_grid_rejects_lookups() {
        let cfg = GridConfig::default();
        let idx = BoxIndexer::new(GridExtent::empty(1.0), &cfg);
        assert_eq!(idx.box_index([0.0; 3]), Err(GridError::EmptyGrid));
        assert_eq!(idx.box_coordinates(BoxIndex(0)), Err(GridError::EmptyGrid));
    }

    #[test]
    fn non_finite_query_rejected() {
        let idx = lattice_indexer();
        assert!(matches!(
            idx.box_coord_of([0.0, f64::INFINITY, 0.0]),
            Err(GridError::NonFiniteQuery { .. })
        ));
    }

    #[test]
    fn open_outside_grid() {
        let idx = lattice_indexer();
        assert_eq!(idx.box_coord_of([-45.0, 0.0, 0.0]).unwrap(), [-1, 1, 1]);
        assert!(matches!(
            idx.box_index([-45.0, 0.0, 0.0]),
            Err(GridError::OutsideGrid { .. })
        ));
        assert!(matches!(
            idx.box_coord_of([1e30, 0.0, 0.0]),
            Err(GridError::IndexOverflow { axis: 0, .. })
        ));
    }

    #[test]
    fn closed_clamps_before_indexing() {
        let cfg = GridConfig::closed(0.0, 60.0);
        let extent = GridExtent::resolve(&Envelope::EMPTY, 30.0, &cfg).unwrap();
        let idx = BoxIndexer::new(extent, &cfg);
        assert!(idx.is_outside_bounds(&[70.0, 0.0, 0.0]));
        assert!(!idx.is_outside_bounds(&[60.0, 0.0, 0.0]));
        assert_eq!(
            idx.box_coord_of([500.0, -500.0, 30.0]).unwrap(),
            idx.box_coord_of([60.0, 0.0, 30.0]).unwrap()
        );
    }

    #[test]
    fn interior_neighborhood_has_27_boxes() {
        let idx = lattice_indexer();
        let hood = idx.neighborhood([1, 1, 1]);
        assert_eq!(hood.len(), 27);
        assert!(hood.contains(&BoxIndex(21)));
    }

    #[test]
    fn corner_neighborhood_is_clipped() {
        let idx = lattice_indexer();
        assert_eq!(idx.neighborhood([0, 0, 0]).len(), 8);
        assert_eq!(idx.neighborhood([3, 1, 1]).len(), 18);
    }

    #[test]
    fn torus_neighborhood_wraps() {
        let idx = torus_indexer(100.0, 20.0);
        let hood = idx.neighborhood([0, 0, 0]);
        assert_eq!(hood.len(), 27);
        assert!(hood.contains(&BoxIndex(idx.linearize([4, 4, 4]))));
    }

    #[test]
    fn small_torus_neighborhood_is_deduplicated() {
        let idx = torus_indexer(100.0, 50.0);
        let hood = idx.neighborhood([0, 0, 0]);
        assert_eq!(hood.len(), 8);
        let single = torus_indexer(100.0, 200.0);
        assert_eq!(single.neighborhood([0, 0, 0]).as_slice(), &[BoxIndex(0)]);
    }

    #[test]
    fn torus_positions_wrap() {
        let idx = torus_indexer(100.0, 20.0);
        assert_eq!(idx.box_coord_of([-1.0, 101.0, 250.0]).unwrap(), [4, 0, 2]);
        assert!(idx.box_index([-1.0, 101.0, 250.0]).is_ok());
        let far = idx.box_coord_of([1e30, 0.0, 0.0]).unwrap();
        assert!((0..5).contains(&far[0]));
    }

    #[test]
    fn torus_tie_break_at_the_seam() {
        let idx = torus_indexer(100.0, 10.0);
        assert_eq!(idx.extent().boxes_per_axis, [10, 10, 10]);
        assert_eq!(idx.box_coord_of([-1e-15, 50.0, 50.0]).unwrap(), [9, 5, 5]);
        assert_eq!(idx.box_coord_of([0.0, 50.0, 50.0]).unwrap(), [0, 5, 5]);
        assert_eq!(idx.box_coord_of([1e-15, 50.0, 50.0]).unwrap(), [0, 5, 5]);
        assert_eq!(idx.box_coord_of([100.0, 50.0, 50.0]).unwrap(), [0, 5, 5]);
        assert_eq!(idx.box_coord_of([100.0 - 1e-13, 50.0, 50.0]).unwrap(), [9, 5, 5]);
    }

    #[test]
    fn bounds_come_from_the_build_config() {
        let idx = torus_indexer(100.0, 20.0);
        assert_eq!(idx.bounds(), [0.0, 100.0]);
        assert_eq!(idx.period(), 100.0);
    }

    proptest! {
        #[test]
        fn index_coordinate_bijection(
            x in 0.0f64..40.0, y in 0.0f64..40.0, z in 0.0f64..40.0,
        ) {
            let idx = lattice_indexer();
            let p = [x, y, z];
            let coord = idx.box_coord_of(p).unwrap();
            let index = idx.box_index(p).unwrap();
            prop_assert_eq!(idx.box_coordinates(index).unwrap(), coord);
            prop_assert_eq!(idx.linear_index(coord).unwrap(), index);
        }

        #[test]
        fn position_lies_inside_its_box(
            x in -1e4f64..1e4, origin in -100.0f64..100.0, len in 0.1f64..50.0,
        ) {
            let c = axis_coord(x, origin, len);
            prop_assert!(origin + c * len <= x);
            prop_assert!(x < origin + (c + 1.0) * len);
        }

        #[test]
        fn every_box_round_trips(i in 0usize..64) {
            let idx = lattice_indexer();
            let coord = idx.box_coordinates(BoxIndex(i)).unwrap();
            prop_assert_eq!(idx.linear_index(coord).unwrap(), BoxIndex(i));
        }
    }
}
