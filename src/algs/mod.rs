//! Mesh-construction and classification algorithms, in pipeline order.

pub mod degeneracy;
pub mod triangulate;
pub mod sharp_edges;
pub mod wake_chains;
pub mod upwind;
pub mod dual_graph;
pub mod agglomerate;

pub use agglomerate::{AgglomerationOptions, build_hierarchy};
pub use degeneracy::{FilterOptions, FilterReport, filter_stations};
pub use sharp_edges::{ClassifierOptions, SharpNodes, classify};
pub use wake_chains::assemble_chains;
