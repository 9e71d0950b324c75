//! The finest-level triangle mesh and its construction from raw triangles.
//!
//! [`MeshGrid::from_seed`] is the shared finishing step behind every input
//! format: it computes triangle metrics, extracts unique edges, assigns
//! left/right triangles and boundary flags, and derives node components.
//! Incidence tables are built lazily on first use and cached.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::geometry::metrics::{
    add, distance, normalize, scale, triangle_centroid, triangle_normal_area,
};
use crate::mesh_error::WakeMeshError;
use crate::topology::adjacency::Adjacency;
use crate::topology::entity::{
    AirfoilSection, Edge, EdgeFlags, EdgeUpwind, Node, NodeFlags, Triangle,
};
use crate::topology::handle::{ComponentId, EdgeId, NodeId, PatchId, TriId};

/// A triangle before metrics and edges are known.
#[derive(Clone, Debug, PartialEq)]
pub struct SeedTriangle {
    /// Zero-based node indices in winding order.
    pub nodes: [usize; 3],
    /// Parametric `(u, v)` of each corner.
    pub uv: [[f64; 2]; 3],
    pub patch: PatchId,
    pub component: ComponentId,
    pub span_station: Option<usize>,
    pub airfoil: Option<AirfoilSection>,
}

/// Node positions, builder-assigned node flags and triangles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshSeed {
    pub positions: Vec<[f64; 3]>,
    pub node_flags: Vec<NodeFlags>,
    pub triangles: Vec<SeedTriangle>,
}

impl MeshSeed {
    pub fn with_positions(positions: Vec<[f64; 3]>) -> Self {
        let node_flags = vec![NodeFlags::empty(); positions.len()];
        MeshSeed {
            positions,
            node_flags,
            triangles: Vec::new(),
        }
    }
}

/// Finest-level mesh: owned node, triangle and edge arrays.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeshGrid {
    pub(crate) nodes: Vec<Node>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) edges: Vec<Edge>,
    /// Zero-area triangles discarded during construction.
    pub(crate) dropped_triangles: usize,
    #[serde(skip)]
    adjacency: OnceCell<Adjacency>,
}

impl MeshGrid {
    /// Finish a [`MeshSeed`] into a mesh with edges and metrics.
    ///
    /// Fails on out-of-range node indices, triangles repeating a node and
    /// edges shared by more than two triangles. Triangles whose corners are
    /// distinct but coincident are dropped and logged.
    pub fn from_seed(seed: MeshSeed) -> Result<Self, WakeMeshError> {
        let MeshSeed {
            positions,
            node_flags,
            triangles: seed_tris,
        } = seed;
        let node_count = positions.len();

        let mut nodes: Vec<Node> = positions
            .iter()
            .zip(node_flags.iter().copied().chain(std::iter::repeat(NodeFlags::empty())))
            .map(|(&p, flags)| {
                let mut node = Node::new(p, ComponentId(0));
                node.flags = flags;
                node
            })
            .collect();

        let mut triangles = Vec::with_capacity(seed_tris.len());
        let mut dropped = 0usize;
        for (t, st) in seed_tris.into_iter().enumerate() {
            for &n in &st.nodes {
                if n >= node_count {
                    return Err(WakeMeshError::NodeIndexOutOfRange {
                        index: n,
                        count: node_count,
                    });
                }
            }
            let [a, b, c] = st.nodes;
            if a == b || a == c {
                return Err(WakeMeshError::DegenerateTriangle { tri: t, node: a });
            }
            if b == c {
                return Err(WakeMeshError::DegenerateTriangle { tri: t, node: b });
            }
            let (pa, pb, pc) = (positions[a], positions[b], positions[c]);
            let (normal, area) = match triangle_normal_area(pa, pb, pc) {
                Ok(metrics) => metrics,
                Err(err) => {
                    log::warn!("Dropping triangle {t}: {err}");
                    dropped += 1;
                    continue;
                }
            };
            let uv_centroid = [
                (st.uv[0][0] + st.uv[1][0] + st.uv[2][0]) / 3.0,
                (st.uv[0][1] + st.uv[1][1] + st.uv[2][1]) / 3.0,
            ];
            triangles.push(Triangle {
                nodes: [NodeId::new(a), NodeId::new(b), NodeId::new(c)],
                normal,
                area,
                centroid: triangle_centroid(pa, pb, pc),
                uv_centroid,
                patch: st.patch,
                component: st.component,
                span_station: st.span_station,
                airfoil: st.airfoil,
                control_surface: None,
            });
        }

        for tri in &triangles {
            for n in tri.nodes {
                let node = &mut nodes[n.index()];
                if node.component == ComponentId(0) {
                    node.component = tri.component;
                }
            }
        }

        let edges = build_edges(&nodes, &triangles)?;
        for edge in &edges {
            if edge.flags.contains(EdgeFlags::SELF_ADJACENT) {
                for n in edge.nodes {
                    nodes[n.index()].flags.insert(NodeFlags::BOUNDARY_EDGE);
                }
            }
        }

        log::debug!(
            "Built mesh grid: {} nodes, {} triangles ({} dropped), {} edges",
            nodes.len(),
            triangles.len(),
            dropped,
            edges.len()
        );

        Ok(MeshGrid {
            nodes,
            triangles,
            edges,
            dropped_triangles: dropped,
            adjacency: OnceCell::new(),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn triangle(&self, id: TriId) -> &Triangle {
        &self.triangles[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    pub fn dropped_triangles(&self) -> usize {
        self.dropped_triangles
    }

    /// Cached incidence tables.
    pub fn adjacency(&self) -> &Adjacency {
        self.adjacency
            .get_or_init(|| Adjacency::build(self.nodes.len(), &self.triangles, &self.edges))
    }

    /// Sum of triangle areas.
    pub fn wetted_area(&self) -> f64 {
        self.triangles.iter().map(|t| t.area).sum()
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }

    pub(crate) fn triangles_mut(&mut self) -> &mut [Triangle] {
        &mut self.triangles
    }
}

/// Unique edges keyed by sorted node pair; left = first triangle seen.
fn build_edges(nodes: &[Node], triangles: &[Triangle]) -> Result<Vec<Edge>, WakeMeshError> {
    let mut by_key: HashMap<(NodeId, NodeId), usize> = HashMap::with_capacity(triangles.len() * 2);
    let mut edges: Vec<Edge> = Vec::with_capacity(triangles.len() * 3 / 2 + 1);

    for (t, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            let (a, b) = (tri.nodes[k], tri.nodes[(k + 1) % 3]);
            let key = if a < b { (a, b) } else { (b, a) };
            match by_key.get(&key) {
                Some(&e) => {
                    let edge = &mut edges[e];
                    if edge.right.is_some() {
                        return Err(WakeMeshError::NonManifoldEdge {
                            a: key.0.index(),
                            b: key.1.index(),
                            triangles: 3,
                        });
                    }
                    edge.right = Some(TriId::new(t));
                }
                None => {
                    by_key.insert(key, edges.len());
                    edges.push(Edge {
                        nodes: [a, b],
                        left: TriId::new(t),
                        right: None,
                        flags: EdgeFlags::empty(),
                        normal: [0.0; 3],
                        length: distance(nodes[a.index()].position, nodes[b.index()].position),
                        upwind: EdgeUpwind::default(),
                    });
                }
            }
        }
    }

    for edge in &mut edges {
        let left = &triangles[edge.left.index()];
        let mut weighted = scale(left.normal, left.area);
        match edge.right {
            None => edge.flags.insert(EdgeFlags::BOUNDARY | EdgeFlags::SELF_ADJACENT),
            Some(r) => {
                let right = &triangles[r.index()];
                weighted = add(weighted, scale(right.normal, right.area));
                if right.patch != left.patch {
                    edge.flags.insert(EdgeFlags::PATCH_BOUNDARY);
                }
            }
        }
        edge.normal = normalize(weighted).unwrap_or(left.normal);
        let [a, b] = edge.nodes;
        if nodes[a.index()].flags.contains(NodeFlags::LEADING_EDGE)
            && nodes[b.index()].flags.contains(NodeFlags::LEADING_EDGE)
        {
            edge.flags.insert(EdgeFlags::LEADING_EDGE);
        }
    }

    Ok(edges)
}
