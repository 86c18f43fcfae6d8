//! Agent bucket store: per-box agent lists in one flat buffer.
//!
//! Buckets are laid out in sequencer rank order (compressed sparse rows):
//! the agents of rank `r` live in `agents[starts[r]..starts[r + 1]]`.
//! Population is two-phase. Workers compute `(rank, handle)` assignments
//! independently, then a stable parallel sort by rank groups them, so no
//! bucket is ever shared between threads while being written.

use boxgrid_core::AgentHandle;
use rayon::prelude::*;

/// Flat, rank-ordered bucket storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketStore {
    starts: Vec<usize>,
    agents: Vec<AgentHandle>,
}

impl BucketStore {
    /// A store with no boxes.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Group assignments into `box_count` buckets.
    ///
    /// Every assignment's rank must be below `box_count`. Within a bucket,
    /// agents keep the order they have in `assignments`.
    pub fn populate(mut assignments: Vec<(usize, AgentHandle)>, box_count: usize) -> Self {
        assignments.par_sort_by_key(|&(rank, _)| rank);

        let mut starts = vec![0usize; box_count + 1];
        for &(rank, _) in &assignments {
            starts[rank + 1] += 1;
        }
        for r in 0..box_count {
            starts[r + 1] += starts[r];
        }
        let agents = assignments.into_iter().map(|(_, handle)| handle).collect();
        Self { starts, agents }
    }

    /// Agents in the box at `rank`; empty for an out-of-range rank.
    pub fn bucket(&self, rank: usize) -> &[AgentHandle] {
        match (self.starts.get(rank), self.starts.get(rank + 1)) {
            (Some(&lo), Some(&hi)) => &self.agents[lo..hi],
            _ => &[],
        }
    }

    /// Number of buckets.
    pub fn box_count(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    /// Number of agents across all buckets.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Number of non-empty buckets.
    pub fn occupied_boxes(&self) -> usize {
        self.starts.windows(2).filter(|w| w[1] > w[0]).count()
    }

    /// Size of the largest bucket.
    pub fn largest_bucket(&self) -> usize {
        self.starts.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0)
    }

    /// Non-empty buckets with their ranks, in rank order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &[AgentHandle])> + '_ {
        self.starts
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[1] > w[0])
            .map(|(rank, w)| (rank, &self.agents[w[0]..w[1]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(i: u64) -> AgentHandle {
        AgentHandle(i)
    }

    #[test]
    fn groups_by_rank_keeping_enumeration_order() {
        let store = BucketStore::populate(
            vec![(2, h(0)), (0, h(1)), (2, h(2)), (3, h(3)), (0, h(4))],
            5,
        );
        assert_eq!(store.bucket(0), &[h(1), h(4)]);
        assert_eq!(store.bucket(1), &[] as &[AgentHandle]);
        assert_eq!(store.bucket(2), &[h(0), h(2)]);
        assert_eq!(store.bucket(3), &[h(3)]);
        assert_eq!(store.bucket(4), &[] as &[AgentHandle]);
        assert_eq!(store.box_count(), 5);
        assert_eq!(store.agent_count(), 5);
        assert_eq!(store.occupied_boxes(), 3);
        assert_eq!(store.largest_bucket(), 2);
    }

    #[test]
    fn out_of_range_bucket_is_empty() {
        let store = BucketStore::populate(vec![(0, h(0))], 1);
        assert!(store.bucket(1).is_empty());
        assert!(store.bucket(usize::MAX - 1).is_empty());
    }

    #[test]
    fn empty_store() {
        let store = BucketStore::empty();
        assert_eq!(store.box_count(), 0);
        assert_eq!(store.largest_bucket(), 0);
        assert_eq!(store.occupied().count(), 0);
        assert!(store.bucket(0).is_empty());
    }

    #[test]
    fn occupied_iterates_in_rank_order() {
        let store = BucketStore::populate(vec![(4, h(9)), (1, h(8)), (4, h(7))], 6);
        let got: Vec<(usize, Vec<AgentHandle>)> =
            store.occupied().map(|(r, b)| (r, b.to_vec())).collect();
        assert_eq!(got, vec![(1, vec![h(8)]), (4, vec![h(9), h(7)])]);
    }

    #[test]
    fn large_population_has_no_lost_or_duplicated_agents() {
        let n = 50_000u64;
        let assignments: Vec<(usize, AgentHandle)> =
            (0..n).map(|i| ((i * 7919 % 97) as usize, h(i))).collect();
        let store = BucketStore::populate(assignments, 97);
        let mut all: Vec<u64> = (0..97).flat_map(|r| store.bucket(r).iter().map(|a| a.0)).collect();
        assert_eq!(all.len(), n as usize);
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), n as usize);
        for r in 0..97 {
            let b = store.bucket(r);
            assert!(b.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
