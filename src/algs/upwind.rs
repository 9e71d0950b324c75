//! Left/right orientation and downwind weighting of edges.

use crate::geometry::metrics::{FREESTREAM, cross, dot, normalize, sub};
use crate::topology::entity::EdgeUpwind;
use crate::topology::grid::MeshGrid;
use crate::topology::handle::TriId;

/// Orient every edge so `nodes[0] -> nodes[1]` runs forward in its left
/// triangle, then weight each triangle's inflow edges.
///
/// For a triangle, the in-plane outward normal of an edge is the unit edge
/// vector crossed with the triangle normal; its inflow is `max(-n . x, 0)`.
/// Weights are normalized per triangle.
pub fn annotate_upwind(grid: &mut MeshGrid) {
    orient_edges(grid);

    let mut upwind = vec![EdgeUpwind::default(); grid.edges().len()];
    let adjacency = grid.adjacency();
    for (t, tri) in grid.triangles().iter().enumerate() {
        let tid = TriId::new(t);
        let flux: [f64; 3] = std::array::from_fn(|k| {
            let a = grid.node(tri.nodes[k]).position;
            let b = grid.node(tri.nodes[(k + 1) % 3]).position;
            // coincident end points carry no flux
            let Some(along) = normalize(sub(b, a)) else {
                return 0.0;
            };
            let outward = cross(along, tri.normal);
            (-dot(outward, FREESTREAM)).max(0.0)
        });
        let total: f64 = flux.iter().sum();
        if total <= 0.0 {
            continue;
        }
        for (k, &e) in adjacency.triangle_edges[t].iter().enumerate() {
            if flux[k] <= 0.0 {
                continue;
            }
            let weight = flux[k] / total;
            let slot = &mut upwind[e.index()];
            if grid.edge(e).left == tid {
                slot.left_downwind = true;
                slot.left_weight = weight;
            } else {
                slot.right_downwind = true;
                slot.right_weight = weight;
            }
        }
    }

    for (edge, up) in grid.edges_mut().iter_mut().zip(upwind) {
        edge.upwind = up;
    }
}

/// Swap sides or end nodes until the left triangle runs the edge forward.
fn orient_edges(grid: &mut MeshGrid) {
    let mut flips = Vec::new();
    for (e, edge) in grid.edges().iter().enumerate() {
        let [a, b] = edge.nodes;
        if grid.triangle(edge.left).runs_forward(a, b) {
            continue;
        }
        let swap_sides = edge
            .right
            .is_some_and(|r| grid.triangle(r).runs_forward(a, b));
        flips.push((e, swap_sides));
    }
    if !flips.is_empty() {
        log::debug!("Reoriented {} edges", flips.len());
    }
    let edges = grid.edges_mut();
    for (e, swap_sides) in flips {
        let edge = &mut edges[e];
        match (swap_sides, edge.right) {
            (true, Some(r)) => {
                edge.right = Some(edge.left);
                edge.left = r;
            }
            _ => edge.nodes.swap(0, 1),
        }
    }
}
