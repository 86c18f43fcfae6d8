//! Strongly-typed identifiers for agents and grid boxes.

use std::fmt;

/// Opaque, stable reference to an agent record in the external agent store.
///
/// The grid never owns agents; it stores handles and asks the
/// [`AgentStore`](crate::AgentStore) for positions and radii on demand.
/// Handles stay valid across storage reallocation, which is why the grid
/// holds them instead of references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentHandle(pub u64);

impl fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for AgentHandle {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Linear index of a box within the current grid extent.
///
/// Linearisation is x-fastest: `x + y * nx + z * nx * ny`. A `BoxIndex` is
/// only meaningful for the grid build that produced it; the next rebuild
/// may change the grid dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxIndex(pub usize);

impl fmt::Display for BoxIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for BoxIndex {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// Integer coordinate `(ix, iy, iz)` of a cubic box of the partition.
///
/// Signed so that neighbourhood offsets (`-1..=1`) can be applied before
/// clipping or wrapping.
pub type BoxCoord = [i64; 3];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_display_and_from() {
        let h = AgentHandle::from(42);
        assert_eq!(h, AgentHandle(42));
        assert_eq!(h.to_string(), "42");
    }

    #[test]
    fn handles_order_by_value() {
        let mut v = vec![AgentHandle(3), AgentHandle(1), AgentHandle(2)];
        v.sort();
        assert_eq!(v, vec![AgentHandle(1), AgentHandle(2), AgentHandle(3)]);
    }

    #[test]
    fn box_index_display() {
        assert_eq!(BoxIndex(57).to_string(), "57");
        assert_eq!(BoxIndex::from(9), BoxIndex(9));
    }
}
