//! The agent store collaborator trait.

use crate::id::AgentHandle;
use crate::math::Real3;

/// Read-only view of the external agent store.
///
/// The grid enumerates agents by dense index (`0..agent_count()`) so that
/// rayon can split the range across worker threads, and then reads each
/// agent's position and interaction radius through its handle.
///
/// # Thread Safety
///
/// `Sync` is required because the bounds scan and bucket population read
/// the store from every worker thread at once.
pub trait AgentStore: Sync {
    /// Number of agents currently in the store.
    fn agent_count(&self) -> usize;

    /// Handle of the agent at dense position `index`.
    ///
    /// `index` is always in `0..agent_count()`. Enumeration order must be
    /// stable while the store is not mutated; it determines the order of
    /// agents within each bucket.
    fn agent_at(&self, index: usize) -> AgentHandle;

    /// Current position of an agent, or `None` for an unknown handle.
    fn position(&self, agent: AgentHandle) -> Option<Real3>;

    /// Interaction radius of an agent, or `None` for an unknown handle.
    ///
    /// The interaction diameter (twice this value) drives the default
    /// box length of the grid.
    fn interaction_radius(&self, agent: AgentHandle) -> Option<f64>;
}
