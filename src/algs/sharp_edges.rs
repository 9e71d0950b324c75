//! Trailing-edge detection and Kutta-node classification.
//!
//! Classification runs in two phases: [`analyze`] inspects an immutable mesh
//! and returns a [`Classification`], which [`classify`] then writes back as
//! node and edge flags.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::metrics::{FREESTREAM, add, angle_deg, dot, norm, normalize, scale, sub};
use crate::topology::adjacency::Csr;
use crate::topology::entity::{Edge, EdgeFlags, NodeFlags};
use crate::topology::grid::MeshGrid;
use crate::topology::handle::{EdgeId, NodeId};

/// Thresholds of the trailing-edge and boundary tests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierOptions {
    /// Minimum angle between the two triangle normals of a sharp edge.
    pub dihedral_angle_deg: f64,
    /// Edges with `|cos|` to the freestream above this are never trailing.
    pub freestream_alignment_cos: f64,
    /// Minimum normal angle of a non-trailing crease flagged as boundary.
    pub boundary_angle_deg: f64,
    /// Maximum angle between a tip triangle normal and the trailing edge.
    pub wingtip_angle_deg: f64,
    pub drop_short_tip_segments: bool,
    pub short_segment_ratio: f64,
    pub short_segment_alignment: f64,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        ClassifierOptions {
            dihedral_angle_deg: 65.0,
            freestream_alignment_cos: 0.98,
            boundary_angle_deg: 45.0,
            wingtip_angle_deg: 45.0,
            drop_short_tip_segments: false,
            short_segment_ratio: 0.25,
            short_segment_alignment: 0.99,
        }
    }
}

/// Where the sharp nodes of a mesh come from.
#[derive(Clone, Debug, PartialEq)]
pub enum SharpNodes {
    /// Non-lifting geometry: no trailing edges.
    None,
    /// Listed by the source; an edge is sharp when both ends are listed.
    Explicit(Vec<NodeId>),
    /// Found by the dihedral, alignment and orientation tests.
    Derived,
}

/// Result of [`analyze`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Classification {
    /// Kept trailing edges, ascending.
    pub trailing_edges: Vec<EdgeId>,
    /// Kutta nodes, ascending.
    pub kutta_nodes: Vec<NodeId>,
    /// Trailing edges incident to every node, ascending by edge index.
    pub kutta_edges: Csr<EdgeId>,
    pub wingtips: Vec<NodeId>,
    /// Non-trailing edges to flag as boundary.
    pub boundary_edges: Vec<EdgeId>,
}

impl Classification {
    pub fn kutta_edges_of(&self, node: NodeId) -> &[EdgeId] {
        self.kutta_edges.row(node.index())
    }
}

/// Inspect `grid` and decide its trailing edges, Kutta nodes and boundary edges.
pub fn analyze(grid: &MeshGrid, sharp: &SharpNodes, opts: &ClassifierOptions) -> Classification {
    let node_count = grid.nodes().len();
    let edges = grid.edges();

    let candidate: Vec<bool> = match sharp {
        SharpNodes::None => vec![false; edges.len()],
        SharpNodes::Explicit(list) => {
            let listed: HashSet<NodeId> = list.iter().copied().collect();
            edges
                .iter()
                .map(|e| listed.contains(&e.nodes[0]) && listed.contains(&e.nodes[1]))
                .collect()
        }
        SharpNodes::Derived => edges.iter().map(|e| is_sharp(grid, e, opts)).collect(),
    };

    let incident = |flags: &[bool]| {
        let mut count = vec![0usize; node_count];
        for (e, edge) in edges.iter().enumerate() {
            if flags[e] {
                for n in edge.nodes {
                    count[n.index()] += 1;
                }
            }
        }
        count
    };

    let candidate_count = incident(&candidate);
    let qualifies: Vec<bool> = (0..node_count)
        .map(|n| {
            candidate_count[n] >= 2
                || (candidate_count[n] == 1 && !is_convex(grid, NodeId::new(n)))
        })
        .collect();
    let mut kept: Vec<bool> = edges
        .iter()
        .zip(&candidate)
        .map(|(e, &c)| c && e.nodes.iter().any(|n| qualifies[n.index()]))
        .collect();

    if opts.drop_short_tip_segments {
        let demoted = short_tip_segments(grid, &kept, &incident(&kept), opts);
        if !demoted.is_empty() {
            log::debug!("Demoted {} short trailing-edge segments", demoted.len());
        }
        for e in demoted {
            kept[e.index()] = false;
        }
    }

    let trailing_edges: Vec<EdgeId> = (0..edges.len())
        .filter(|&e| kept[e])
        .map(EdgeId::new)
        .collect();
    let kutta_edges = Csr::from_pairs(
        node_count,
        trailing_edges
            .iter()
            .flat_map(|&e| edges[e.index()].nodes.map(|n| (n.index(), e))),
    );
    let kutta_nodes: Vec<NodeId> = (0..node_count)
        .filter(|&n| !kutta_edges.row(n).is_empty())
        .map(NodeId::new)
        .collect();

    let wingtips = kutta_nodes
        .iter()
        .copied()
        .filter(|&n| {
            let row = kutta_edges.row(n.index());
            row.len() == 1 && is_convex(grid, n) && touches_tip(grid, n, &edges[row[0].index()], opts)
        })
        .collect();

    let boundary_edges = edges
        .iter()
        .enumerate()
        .filter(|&(e, edge)| {
            !kept[e]
                && match edge.right {
                    None => true,
                    Some(r) => {
                        let n1 = grid.triangle(edge.left).normal;
                        let n2 = grid.triangle(r).normal;
                        angle_deg(n1, n2) >= opts.boundary_angle_deg
                    }
                }
        })
        .map(|(e, _)| EdgeId::new(e))
        .collect();

    Classification {
        trailing_edges,
        kutta_nodes,
        kutta_edges,
        wingtips,
        boundary_edges,
    }
}

/// Run [`analyze`] and write the result into the node and edge flags.
///
/// Trailing edges drop their boundary and patch-boundary flags; their end
/// nodes gain `TRAILING_EDGE` and `KUTTA`.
pub fn classify(grid: &mut MeshGrid, sharp: &SharpNodes, opts: &ClassifierOptions) -> Classification {
    let result = analyze(grid, sharp, opts);

    let edges = grid.edges_mut();
    for &e in &result.trailing_edges {
        let flags = &mut edges[e.index()].flags;
        flags.insert(EdgeFlags::TRAILING_EDGE);
        flags.remove(EdgeFlags::BOUNDARY | EdgeFlags::PATCH_BOUNDARY);
    }
    for &e in &result.boundary_edges {
        edges[e.index()].flags.insert(EdgeFlags::BOUNDARY);
    }

    let nodes = grid.nodes_mut();
    for &n in &result.kutta_nodes {
        nodes[n.index()]
            .flags
            .insert(NodeFlags::TRAILING_EDGE | NodeFlags::KUTTA);
    }
    for &n in &result.wingtips {
        nodes[n.index()].flags.insert(NodeFlags::WINGTIP);
    }

    log::debug!(
        "Classified {} trailing edges, {} Kutta nodes ({} wingtips), {} boundary edges",
        result.trailing_edges.len(),
        result.kutta_nodes.len(),
        result.wingtips.len(),
        result.boundary_edges.len()
    );
    result
}

/// Dihedral, freestream-alignment, cove and aft-facing tests of one edge.
fn is_sharp(grid: &MeshGrid, edge: &Edge, opts: &ClassifierOptions) -> bool {
    let Some(right) = edge.right else {
        return false;
    };
    let [a, b] = edge.nodes;
    let p1 = grid.node(a).position;
    let Some(dir) = normalize(sub(grid.node(b).position, p1)) else {
        return false;
    };
    if dot(FREESTREAM, dir).abs() > opts.freestream_alignment_cos {
        return false;
    }
    let n1 = grid.triangle(edge.left).normal;
    let right_tri = grid.triangle(right);
    let n2 = right_tri.normal;
    if angle_deg(n1, n2) <= opts.dihedral_angle_deg {
        return false;
    }
    let Some(c) = right_tri.opposite(a, b) else {
        return false;
    };
    let p3 = grid.node(c).position;
    dot(sub(p3, p1), n1) < 0.0 && add(n1, n2)[0] > 0.0
}

/// Relative tolerance below which a centroid counts as level with the node.
const PLANAR_TOLERANCE: f64 = 1e-9;

/// A node is convex when the surface bends away from its mean normal on
/// every side: each neighboring centroid lies behind the node. Planar
/// neighborhoods are not convex.
pub fn is_convex(grid: &MeshGrid, node: NodeId) -> bool {
    let tris = grid.adjacency().triangles_of(node);
    if tris.len() == 2 {
        return true;
    }
    let weighted = tris.iter().fold([0.0; 3], |acc, &t| {
        let tri = grid.triangle(t);
        add(acc, scale(tri.normal, tri.area))
    });
    let Some(mean) = normalize(weighted) else {
        return false;
    };
    let p = grid.node(node).position;
    tris.iter().all(|&t| {
        let d = sub(grid.triangle(t).centroid, p);
        dot(d, mean) < -PLANAR_TOLERANCE * norm(d)
    })
}

/// Whether a triangle around `node` faces along the trailing edge, as the
/// side face of a wing tip does.
///
/// The fan around `node` is walked from the trailing edge's left triangle
/// across shared edges, and the walk ends after the first triangle touching
/// a self-adjacent edge.
fn touches_tip(grid: &MeshGrid, node: NodeId, edge: &Edge, opts: &ClassifierOptions) -> bool {
    let a = grid.node(edge.nodes[0]).position;
    let b = grid.node(edge.nodes[1]).position;
    let Some(dir) = normalize(sub(b, a)) else {
        return false;
    };
    let limit = opts.wingtip_angle_deg.to_radians().cos();
    let adjacency = grid.adjacency();
    let edges = grid.edges();
    let fan_size = adjacency.triangles_of(node).len();

    let start = edge.left;
    let mut current = start;
    let mut entered = adjacency.edge_between(edges, edge.nodes[0], edge.nodes[1]);
    for _ in 0..fan_size {
        if dot(grid.triangle(current).normal, dir).abs() >= limit {
            return true;
        }
        let around = &adjacency.triangle_edges[current.index()];
        if around.iter().any(|e| grid.edge(*e).is_self_adjacent()) {
            return false;
        }
        let Some(&exit) = around
            .iter()
            .find(|&&e| Some(e) != entered && grid.edge(e).nodes.contains(&node))
        else {
            return false;
        };
        let next = grid.edge(exit).triangles().find(|&t| t != current);
        match next {
            Some(t) if t != start => {
                current = t;
                entered = Some(exit);
            }
            _ => return false,
        }
    }
    false
}

/// Trailing edges ending a chain that continue a much longer collinear
/// neighbor.
fn short_tip_segments(
    grid: &MeshGrid,
    kept: &[bool],
    count: &[usize],
    opts: &ClassifierOptions,
) -> Vec<EdgeId> {
    let edges = grid.edges();
    let adj = grid.adjacency();
    let kutta_edges_of = |n: NodeId| {
        adj.edges_of(n)
            .iter()
            .copied()
            .filter(|e| kept[e.index()])
            .collect::<Vec<_>>()
    };
    let direction = |e: &Edge| {
        normalize(sub(
            grid.node(e.nodes[1]).position,
            grid.node(e.nodes[0]).position,
        ))
    };

    let mut demoted = Vec::new();
    for end in (0..count.len()).filter(|&n| count[n] == 1).map(NodeId::new) {
        let row = kutta_edges_of(end);
        let &[tip] = row.as_slice() else {
            continue;
        };
        let tip_edge = &edges[tip.index()];
        let inner = tip_edge.other_node(end);
        if count[inner.index()] != 2 {
            continue;
        }
        let Some(next) = kutta_edges_of(inner).into_iter().find(|&e| e != tip) else {
            continue;
        };
        let next_edge = &edges[next.index()];
        let (Some(d1), Some(d2)) = (direction(tip_edge), direction(next_edge)) else {
            continue;
        };
        if dot(d1, d2).abs() > opts.short_segment_alignment
            && tip_edge.length <= opts.short_segment_ratio * next_edge.length
        {
            demoted.push(tip);
        }
    }
    demoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::grid::MeshSeed;
    use crate::topology::grid::tests::{seed_tri, unit_square};

    /// Upper and lower faces meeting at a crease along y through nodes 0, 1, 2.
    /// With `mirror` the wedge is reflected in x, turning the crease into a cove.
    fn wedge_strip(mirror: bool) -> MeshGrid {
        let x = |v: f64| if mirror { 1.0 - v } else { v };
        let mut positions = Vec::new();
        for (px, z) in [(1.0, 0.0), (0.0, 0.1), (0.0, -0.1)] {
            for y in 0..3 {
                positions.push([x(px), y as f64, z]);
            }
        }
        let mut seed = MeshSeed::with_positions(positions);
        let (te, up, lo) = (0, 3, 6);
        for k in 0..2 {
            seed.triangles.push(seed_tri([te + k, te + k + 1, up + k + 1]));
            seed.triangles.push(seed_tri([te + k, up + k + 1, up + k]));
            seed.triangles.push(seed_tri([te + k + 1, te + k, lo + k]));
            seed.triangles.push(seed_tri([te + k + 1, lo + k, lo + k + 1]));
        }
        MeshGrid::from_seed(seed).unwrap()
    }

    #[test]
    fn derived_trailing_edge_on_a_wedge() {
        let mut grid = wedge_strip(false);
        let result = classify(&mut grid, &SharpNodes::Derived, &ClassifierOptions::default());
        assert_eq!(result.trailing_edges.len(), 2);
        for &e in &result.trailing_edges {
            let te = grid.edge(e);
            assert!(te.flags.contains(EdgeFlags::TRAILING_EDGE));
            assert!(!te.flags.intersects(EdgeFlags::BOUNDARY));
        }
        assert_eq!(
            result.kutta_nodes,
            vec![NodeId::new(0), NodeId::new(1), NodeId::new(2)]
        );
        assert!(grid.node(NodeId::new(2)).flags.contains(NodeFlags::KUTTA));
        assert_eq!(result.kutta_edges_of(NodeId::new(1)), &result.trailing_edges[..]);
        assert_eq!(result.kutta_edges_of(NodeId::new(0)).len(), 1);
    }

    #[test]
    fn flipped_crease_is_a_cove() {
        let grid = wedge_strip(true);
        let result = analyze(&grid, &SharpNodes::Derived, &ClassifierOptions::default());
        assert!(result.trailing_edges.is_empty());
    }

    #[test]
    fn isolated_segment_between_convex_ends_is_dropped() {
        let grid = wedge_strip(false);
        // only the first segment is listed; both of its ends are convex
        let list = SharpNodes::Explicit(vec![NodeId::new(0), NodeId::new(1)]);
        let explicit = analyze(&grid, &list, &ClassifierOptions::default());
        assert!(is_convex(&grid, NodeId::new(0)));
        assert!(is_convex(&grid, NodeId::new(1)));
        assert!(explicit.trailing_edges.is_empty());
        assert!(explicit.kutta_nodes.is_empty());
    }

    #[test]
    fn explicit_list_needs_both_ends() {
        let grid = MeshGrid::from_seed(unit_square()).unwrap();
        let list = SharpNodes::Explicit(vec![NodeId::new(0), NodeId::new(1)]);
        let result = analyze(&grid, &list, &ClassifierOptions::default());
        assert_eq!(result.kutta_nodes, vec![NodeId::new(0), NodeId::new(1)]);
        let none = analyze(
            &grid,
            &SharpNodes::Explicit(vec![NodeId::new(0)]),
            &ClassifierOptions::default(),
        );
        assert!(none.kutta_nodes.is_empty());
    }

    #[test]
    fn no_sharp_source_still_flags_boundaries() {
        let mut grid = MeshGrid::from_seed(unit_square()).unwrap();
        let result = classify(&mut grid, &SharpNodes::None, &ClassifierOptions::default());
        assert!(result.kutta_nodes.is_empty());
        assert_eq!(result.boundary_edges.len(), 4);
    }

    #[test]
    fn two_triangle_node_is_convex() {
        let grid = MeshGrid::from_seed(unit_square()).unwrap();
        assert!(is_convex(&grid, NodeId::new(0)));
        // a single flat triangle has its centroid in the tangent plane
        assert!(!is_convex(&grid, NodeId::new(1)));
    }

    #[test]
    fn short_tip_segment_is_demoted_when_enabled() {
        let mut positions = Vec::new();
        for (px, z) in [(1.0, 0.0), (0.0, 0.1), (0.0, -0.1)] {
            for y in [0.0, 1.0, 2.0, 2.1] {
                positions.push([px, y, z]);
            }
        }
        let mut seed = MeshSeed::with_positions(positions);
        let (te, up, lo) = (0, 4, 8);
        for k in 0..3 {
            seed.triangles.push(seed_tri([te + k, te + k + 1, up + k + 1]));
            seed.triangles.push(seed_tri([te + k, up + k + 1, up + k]));
            seed.triangles.push(seed_tri([te + k + 1, te + k, lo + k]));
            seed.triangles.push(seed_tri([te + k + 1, lo + k, lo + k + 1]));
        }
        let grid = MeshGrid::from_seed(seed).unwrap();

        let default = analyze(&grid, &SharpNodes::Derived, &ClassifierOptions::default());
        assert_eq!(default.trailing_edges.len(), 3);

        let opts = ClassifierOptions {
            drop_short_tip_segments: true,
            ..ClassifierOptions::default()
        };
        let pruned = analyze(&grid, &SharpNodes::Derived, &opts);
        assert_eq!(pruned.trailing_edges.len(), 2);
        assert!(!pruned.kutta_nodes.contains(&NodeId::new(3)));
    }

    #[test]
    fn tip_search_stops_at_the_first_open_edge() {
        // triangle 0 is flat and open on every side; triangle 1 faces along
        // the edge 0-1 but only shares node 0
        let mut seed = MeshSeed::with_positions(vec![
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [-1.0, 0.0, 1.0],
        ]);
        seed.triangles = vec![seed_tri([0, 1, 2]), seed_tri([0, 3, 4])];
        let grid = MeshGrid::from_seed(seed).unwrap();
        let node = NodeId::new(0);
        let e = grid
            .adjacency()
            .edge_between(grid.edges(), node, NodeId::new(1))
            .unwrap();
        let opts = ClassifierOptions::default();
        assert!(!touches_tip(&grid, node, grid.edge(e), &opts));

        // the same face reached before any open edge marks a tip
        let side = grid
            .adjacency()
            .edge_between(grid.edges(), node, NodeId::new(3))
            .unwrap();
        let along_side = Edge {
            nodes: [NodeId::new(0), NodeId::new(1)],
            ..grid.edge(side).clone()
        };
        assert!(touches_tip(&grid, node, &along_side, &opts));
    }
}
