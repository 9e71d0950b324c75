//! Mesh entities: nodes, triangles, edges and the Kutta-node records that
//! define wake sheets.
//!
//! All entities are created by the mesh builder and the classifier and are
//! immutable once a [`Surface`](crate::surface::Surface) has been assembled.

use serde::{Deserialize, Serialize};

use crate::topology::handle::{ComponentId, EdgeId, NodeId, PatchId, TriId};

bitflags::bitflags! {
    /// Classification flags of a node.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct NodeFlags: u8 {
        const TRAILING_EDGE = 1 << 0;
        const LEADING_EDGE = 1 << 1;
        const BOUNDARY_EDGE = 1 << 2;
        const BOUNDARY_CORNER = 1 << 3;
        /// Wake-shedding node.
        const KUTTA = 1 << 4;
        /// Open chain end sitting on a wing tip.
        const WINGTIP = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Classification flags of an edge.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct EdgeFlags: u8 {
        const TRAILING_EDGE = 1 << 0;
        const LEADING_EDGE = 1 << 1;
        /// Touches one triangle, or is a sharp non-trailing crease.
        const BOUNDARY = 1 << 2;
        /// Separates two surface patches.
        const PATCH_BOUNDARY = 1 << 3;
        /// Has a single adjoining triangle.
        const SELF_ADJACENT = 1 << 4;
    }
}

impl EdgeFlags {
    /// Flags that coarse grids must keep on their own edges.
    pub const MARKERS: EdgeFlags = EdgeFlags::TRAILING_EDGE
        .union(EdgeFlags::BOUNDARY)
        .union(EdgeFlags::PATCH_BOUNDARY);
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub position: [f64; 3],
    pub flags: NodeFlags,
    pub component: ComponentId,
    /// Index into the surface's Kutta-node sequence.
    pub kutta: Option<usize>,
}

impl Node {
    pub fn new(position: [f64; 3], component: ComponentId) -> Self {
        Node {
            position,
            flags: NodeFlags::empty(),
            component,
            kutta: None,
        }
    }
}

/// Airfoil descriptors of the span station a triangle belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AirfoilSection {
    pub thickness_to_chord: f64,
    pub max_thickness_location: f64,
    pub radius_to_chord: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Node handles in winding order; the winding defines `normal`.
    pub nodes: [NodeId; 3],
    pub normal: [f64; 3],
    pub area: f64,
    pub centroid: [f64; 3],
    /// Mean of the corner `(u, v)` parametric coordinates.
    pub uv_centroid: [f64; 2],
    pub patch: PatchId,
    pub component: ComponentId,
    pub span_station: Option<usize>,
    pub airfoil: Option<AirfoilSection>,
    /// Index of the control surface whose parametric box holds the centroid.
    pub control_surface: Option<usize>,
}

impl Triangle {
    /// The corner not on the edge `(a, b)`.
    pub fn opposite(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        self.nodes.iter().copied().find(|&n| n != a && n != b)
    }

    /// Whether `a -> b` appears in this triangle's winding order.
    pub fn runs_forward(&self, a: NodeId, b: NodeId) -> bool {
        (0..3).any(|k| self.nodes[k] == a && self.nodes[(k + 1) % 3] == b)
    }
}

/// Per-edge upwind annotation consumed by the solver stencils.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeUpwind {
    /// The left triangle lies downwind of this edge.
    pub left_downwind: bool,
    pub left_weight: f64,
    /// The right triangle lies downwind of this edge. Always `false` on boundaries.
    pub right_downwind: bool,
    pub right_weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// End nodes; `nodes[0] -> nodes[1]` runs forward in `left`'s winding once
    /// the upwind annotator has run.
    pub nodes: [NodeId; 2],
    pub left: TriId,
    /// Absent on boundary edges.
    pub right: Option<TriId>,
    pub flags: EdgeFlags,
    /// Area-weighted mean of the adjoining triangle normals.
    pub normal: [f64; 3],
    pub length: f64,
    pub upwind: EdgeUpwind,
}

impl Edge {
    pub fn other_node(&self, n: NodeId) -> NodeId {
        if self.nodes[0] == n {
            self.nodes[1]
        } else {
            self.nodes[0]
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = TriId> + '_ {
        std::iter::once(self.left).chain(self.right)
    }

    pub fn is_self_adjacent(&self) -> bool {
        self.right.is_none()
    }
}

/// A wake-shedding node, in chain order within its sheet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KuttaNode {
    pub node: NodeId,
    pub sheet: usize,
    /// Cumulative arc length along the sheet divided by the sheet length.
    pub arc_fraction: f64,
    pub periodic: bool,
    pub component: ComponentId,
    pub is_wingtip: bool,
    /// The first two incident trailing edges.
    pub edges: [Option<EdgeId>; 2],
}

/// An ordered chain of Kutta nodes from which one vortex sheet is shed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WakeSheet {
    pub id: usize,
    /// Indices into the surface's Kutta-node sequence, in chain order.
    pub kutta_nodes: Vec<usize>,
    pub periodic: bool,
    pub component: ComponentId,
}

/// Boundary condition applied to a surface patch by the solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    #[default]
    Wall,
    Symmetry,
    None,
}

/// Per-patch metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchInfo {
    pub id: PatchId,
    pub name: String,
    pub boundary_condition: BoundaryCondition,
    pub component: ComponentId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_flag_operations() {
        let mut f = NodeFlags::empty();
        assert!(f.is_empty());
        f.insert(NodeFlags::KUTTA | NodeFlags::TRAILING_EDGE);
        assert!(f.contains(NodeFlags::KUTTA));
        assert!(f.intersects(NodeFlags::KUTTA | NodeFlags::WINGTIP));
        assert!(!f.contains(NodeFlags::KUTTA | NodeFlags::WINGTIP));
        f.remove(NodeFlags::KUTTA);
        assert_eq!(f, NodeFlags::TRAILING_EDGE);
        assert_eq!(format!("{:?}", f), "NodeFlags(TRAILING_EDGE)");
    }

    #[test]
    fn flags_serialize_by_name() {
        let flags = EdgeFlags::TRAILING_EDGE | EdgeFlags::SELF_ADJACENT;
        let json = serde_json::to_string(&flags).unwrap();
        assert!(json.contains("TRAILING_EDGE"));
        let back: EdgeFlags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn marker_flags() {
        assert!(EdgeFlags::MARKERS.contains(EdgeFlags::TRAILING_EDGE));
        assert!(!EdgeFlags::MARKERS.intersects(EdgeFlags::LEADING_EDGE));
    }

    #[test]
    fn triangle_winding_queries() {
        let tri = Triangle {
            nodes: [NodeId::new(0), NodeId::new(1), NodeId::new(2)],
            normal: [0.0, 0.0, 1.0],
            area: 0.5,
            centroid: [0.0; 3],
            uv_centroid: [0.0; 2],
            patch: PatchId(1),
            component: ComponentId(1),
            span_station: None,
            airfoil: None,
            control_surface: None,
        };
        assert!(tri.runs_forward(NodeId::new(2), NodeId::new(0)));
        assert!(!tri.runs_forward(NodeId::new(0), NodeId::new(2)));
        assert_eq!(tri.opposite(NodeId::new(0), NodeId::new(2)), Some(NodeId::new(1)));
    }
}
