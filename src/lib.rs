#![cfg_attr(docsrs, feature(doc_cfg))]
//! # wake-mesh
//!
//! wake-mesh turns the geometric description of an aircraft component into a
//! solver-ready surface mesh for panel and vortex-lattice aerodynamics codes.
//! Alongside the triangles it derives where the wake leaves the surface: the
//! trailing-edge ("Kutta") nodes, ordered into the chains from which vortex
//! sheets are shed.
//!
//! ## Features
//! - Readers for flat-plate wing and body station files and for raw or
//!   extended triangulations with an optional patch key file
//! - Removal of degenerate stations and collapse of closed body caps
//! - Consistently wound triangle meshes with O(1) node, triangle and edge adjacency
//! - Sharp-edge classification from explicit node lists or from dihedral tests,
//!   with wing-tip detection
//! - Wake-sheet chains with arc-length parameterization, open or periodic
//! - Upwind edge weights for a +x freestream
//! - A multigrid hierarchy that never buries a trailing edge, boundary or
//!   patch boundary inside a coarse cell
//!
//! ## Usage
//!
//! ```
//! use wake_mesh::prelude::*;
//!
//! let source = GeometrySource::RawTriangulation {
//!     text: "3 1\n0 0 0\n1 0 0\n0 1 0\n1 2 3\n7\n".into(),
//!     key: None,
//!     sharp_nodes: None,
//! };
//! let surface = SurfaceBuilder::new(SurfaceOptions::default()).build(&source)?;
//! assert_eq!(surface.triangles().len(), 1);
//! assert!(surface.sheets().is_empty());
//! # Ok::<(), WakeMeshError>(())
//! ```
//!
//! The library logs through the [`log`] facade and never installs a logger.
//! Every stage reports failure as a [`WakeMeshError`](mesh_error::WakeMeshError);
//! a [`Surface`](surface::Surface) exists only when all stages succeeded.

pub mod algs;
pub mod debug_invariants;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod surface;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::agglomerate::AgglomerationOptions;
    pub use crate::algs::degeneracy::FilterOptions;
    pub use crate::algs::sharp_edges::ClassifierOptions;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::{GeometryInput, GeometryReader, GeometrySource};
    pub use crate::mesh_error::WakeMeshError;
    pub use crate::surface::{Surface, SurfaceBuilder, SurfaceKind, SurfaceOptions};
    pub use crate::topology::coarsen::GridLevel;
    pub use crate::topology::entity::{
        Edge, EdgeFlags, KuttaNode, Node, NodeFlags, PatchInfo, Triangle, WakeSheet,
    };
    pub use crate::topology::grid::MeshGrid;
    pub use crate::topology::handle::{ComponentId, EdgeId, NodeId, PatchId, TriId};
}
