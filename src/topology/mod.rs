//! Mesh topology: arena handles, entities, the finest-level grid, CSR
//! incidence tables and the coarse grid levels of the multigrid hierarchy.
//!
//! Entities refer to each other only through [`handle`] indices into vectors
//! owned by [`grid::MeshGrid`], so adjacency lookups stay O(1) without any
//! shared ownership.

pub mod adjacency;
pub mod coarsen;
pub mod entity;
pub mod grid;
pub mod handle;
pub mod validation;

pub use adjacency::{Adjacency, Csr};
pub use entity::{Edge, EdgeFlags, KuttaNode, Node, NodeFlags, Triangle, WakeSheet};
pub use grid::MeshGrid;
pub use handle::{ComponentId, EdgeId, NodeId, PatchId, TriId};
