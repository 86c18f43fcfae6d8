//! Space-filling sequencer: Morton (Z-order) ranks for grid boxes.
//!
//! The sequence fixes the memory order of buckets in the
//! [`BucketStore`](crate::buckets::BucketStore) and the visit order of
//! neighbourhood boxes during queries. Boxes that are close in space get
//! close ranks, so a neighbourhood sweep touches nearby memory.

use boxgrid_core::BoxIndex;
use rayon::prelude::*;

use crate::bounds::MAX_BOXES_PER_AXIS;
use crate::error::GridError;

/// Bijection between linear box indices and Morton ranks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxSequence {
    boxes_per_axis: [usize; 3],
    /// rank -> box
    order: Vec<BoxIndex>,
    /// box -> rank
    rank: Vec<usize>,
}

impl BoxSequence {
    /// Sequence for a grid of `boxes_per_axis`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::IndexOverflow`] if an axis has more boxes than
    /// a 21-bit Morton component can address.
    pub fn new(boxes_per_axis: [usize; 3]) -> Result<Self, GridError> {
        for (axis, &n) in boxes_per_axis.iter().enumerate() {
            if n > MAX_BOXES_PER_AXIS {
                return Err(GridError::IndexOverflow {
                    axis,
                    value: n as f64,
                });
            }
        }
        let [nx, ny, _] = boxes_per_axis;
        let total: usize = boxes_per_axis.iter().product();

        let mut codes: Vec<(u64, usize)> = (0..total)
            .into_par_iter()
            .map(|i| {
                let x = i % nx;
                let y = (i / nx) % ny;
                let z = i / (nx * ny);
                (morton_code([x as u64, y as u64, z as u64]), i)
            })
            .collect();
        // Codes are unique, so the unstable sort is still deterministic.
        codes.par_sort_unstable_by_key(|&(code, _)| code);

        let mut rank = vec![0; total];
        let order = codes
            .iter()
            .enumerate()
            .map(|(r, &(_, linear))| {
                rank[linear] = r;
                BoxIndex(linear)
            })
            .collect();

        Ok(Self {
            boxes_per_axis,
            order,
            rank,
        })
    }

    /// Sequence of a grid with no boxes.
    pub fn empty() -> Self {
        Self {
            boxes_per_axis: [0; 3],
            order: Vec::new(),
            rank: Vec::new(),
        }
    }

    /// Grid shape this sequence was built for.
    pub fn boxes_per_axis(&self) -> [usize; 3] {
        self.boxes_per_axis
    }

    /// Number of boxes in the sequence.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if the sequence covers no boxes.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Boxes in visit order.
    pub fn order(&self) -> &[BoxIndex] {
        &self.order
    }

    /// Rank of a box. `index` must be in range.
    pub fn rank_of(&self, index: BoxIndex) -> usize {
        self.rank[index.0]
    }

    /// Box at a rank. `rank` must be in range.
    pub fn box_at(&self, rank: usize) -> BoxIndex {
        self.order[rank]
    }
}

/// Morton code of a box coordinate; each component uses its low 21 bits.
pub fn morton_code(coord: [u64; 3]) -> u64 {
    interleave_3(coord[0]) | (interleave_3(coord[1]) << 1) | (interleave_3(coord[2]) << 2)
}

/// Spread the low 21 bits of `x` so that two zero bits follow each one.
fn interleave_3(mut x: u64) -> u64 {
    x &= 0x1f_ffff;
    x = (x | x << 32) & 0x1f_0000_0000_ffff;
    x = (x | x << 16) & 0x1f_0000_ff00_00ff;
    x = (x | x << 8) & 0x100f_00f0_0f00_f00f;
    x = (x | x << 4) & 0x10c3_0c30_c30c_30c3;
    x = (x | x << 2) & 0x1249_2492_4924_9249;
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn codes_are_distinct_per_box() {
        let mut codes: Vec<u64> = (0..4u64)
            .flat_map(|z| (0..4u64).flat_map(move |y| (0..4u64).map(move |x| morton_code([x, y, z]))))
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 64);
    }

    #[test]
    fn empty_grid_sequence() {
        let seq = BoxSequence::new([0, 0, 0]).unwrap();
        assert!(seq.is_empty());
        assert_eq!(seq.len(), 0);
        assert_eq!(seq, BoxSequence::empty());
    }

    #[test]
    fn oversized_axis_rejected() {
        assert!(matches!(
            BoxSequence::new([1, MAX_BOXES_PER_AXIS + 1, 1]),
            Err(GridError::IndexOverflow { axis: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn sequence_is_a_permutation(nx in 1usize..9, ny in 1usize..9, nz in 1usize..9) {
            let seq = BoxSequence::new([nx, ny, nz]).unwrap();
            let total = nx * ny * nz;
            prop_assert_eq!(seq.len(), total);
            let mut seen = vec![false; total];
            for (r, &b) in seq.order().iter().enumerate() {
                prop_assert!(!seen[b.0]);
                seen[b.0] = true;
                prop_assert_eq!(seq.rank_of(b), r);
                prop_assert_eq!(seq.box_at(r), b);
            }
        }

        #[test]
        fn sequence_is_reproducible(nx in 1usize..7, ny in 1usize..7, nz in 1usize..7) {
            let a = BoxSequence::new([nx, ny, nz]).unwrap();
            let b = BoxSequence::new([nx, ny, nz]).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
