//! Core types and traits for the boxgrid spatial index.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared between the grid and the agent store that feeds it:
//! agent handles, box identifiers, 3-D vector helpers, and the
//! [`AgentStore`] collaborator trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod math;
pub mod traits;

pub use id::{AgentHandle, BoxCoord, BoxIndex};
pub use math::{squared_distance, Real3};
pub use traits::AgentStore;
