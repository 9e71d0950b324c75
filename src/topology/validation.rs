//! Mesh validation helpers.

use std::collections::HashMap;

use crate::mesh_error::WakeMeshError;
use crate::topology::entity::{EdgeFlags, NodeFlags};
use crate::topology::grid::MeshGrid;
use crate::topology::handle::NodeId;

/// Optional validation toggles for finished meshes.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct MeshValidationOptions {
    /// Ensure each triangle references three distinct, existing nodes.
    pub check_triangle_nodes: bool,
    /// Ensure every edge is used by exactly one or two triangles and that the
    /// edge table agrees with the triangles.
    pub check_edge_incidence: bool,
    /// How to handle interior edges traversed in the same direction by both
    /// neighbours (inconsistent winding).
    pub winding: WindingHandling,
    /// Ensure classification flags agree with each other and with the edge
    /// table.
    pub check_flags: bool,
}

impl Default for MeshValidationOptions {
    fn default() -> Self {
        Self {
            check_triangle_nodes: true,
            check_edge_incidence: true,
            winding: WindingHandling::Warn,
            check_flags: true,
        }
    }
}

impl MeshValidationOptions {
    /// Enable all checks, treating winding flips as errors.
    pub fn all() -> Self {
        Self {
            check_triangle_nodes: true,
            check_edge_incidence: true,
            winding: WindingHandling::Error,
            check_flags: true,
        }
    }
}

/// Behavior for inconsistent winding across an interior edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WindingHandling {
    /// Skip the check.
    Ignore,
    /// Log a warning per offending edge.
    Warn,
    /// Return an error on the first offending edge.
    Error,
}

/// Validate a finished mesh against the chosen checks.
pub fn validate_mesh(grid: &MeshGrid, options: MeshValidationOptions) -> Result<(), WakeMeshError> {
    let node_count = grid.nodes().len();

    if options.check_triangle_nodes {
        for (t, tri) in grid.triangles().iter().enumerate() {
            for n in tri.nodes {
                if n.index() >= node_count {
                    return Err(WakeMeshError::NodeIndexOutOfRange {
                        index: n.index(),
                        count: node_count,
                    });
                }
            }
            let [a, b, c] = tri.nodes;
            if a == b || a == c || b == c {
                let node = if a == b || a == c { a } else { b };
                return Err(WakeMeshError::DegenerateTriangle {
                    tri: t,
                    node: node.index(),
                });
            }
        }
    }

    if options.check_edge_incidence {
        let mut uses: HashMap<(NodeId, NodeId), usize> = HashMap::new();
        for tri in grid.triangles() {
            for k in 0..3 {
                let (a, b) = (tri.nodes[k], tri.nodes[(k + 1) % 3]);
                *uses.entry(if a < b { (a, b) } else { (b, a) }).or_insert(0) += 1;
            }
        }
        if uses.len() != grid.edges().len() {
            return Err(WakeMeshError::Topology(format!(
                "edge table holds {} edges but triangles define {}",
                grid.edges().len(),
                uses.len()
            )));
        }
        for edge in grid.edges() {
            let [a, b] = edge.nodes;
            let key = if a < b { (a, b) } else { (b, a) };
            let count = uses.get(&key).copied().unwrap_or(0);
            let expected = 1 + usize::from(edge.right.is_some());
            if count == 0 || count > 2 || count != expected {
                return Err(WakeMeshError::NonManifoldEdge {
                    a: a.index(),
                    b: b.index(),
                    triangles: count,
                });
            }
        }
    }

    if options.winding != WindingHandling::Ignore {
        for edge in grid.edges() {
            let Some(right) = edge.right else { continue };
            let [a, b] = edge.nodes;
            let left_fwd = grid.triangle(edge.left).runs_forward(a, b);
            let right_fwd = grid.triangle(right).runs_forward(a, b);
            if left_fwd == right_fwd {
                match options.winding {
                    WindingHandling::Warn => {
                        log::warn!(
                            "Inconsistent winding across edge ({a}, {b}): triangles {} and {right}",
                            edge.left
                        );
                    }
                    WindingHandling::Error => {
                        return Err(WakeMeshError::Topology(format!(
                            "inconsistent winding across edge ({a}, {b})"
                        )));
                    }
                    WindingHandling::Ignore => {}
                }
            }
        }
    }

    if options.check_flags {
        check_flags(grid)?;
    }

    Ok(())
}

/// Open edges are exactly the self-adjacent ones; trailing edges are not
/// boundaries and end on Kutta nodes; wingtips are Kutta nodes.
fn check_flags(grid: &MeshGrid) -> Result<(), WakeMeshError> {
    for (e, edge) in grid.edges().iter().enumerate() {
        if edge.flags.contains(EdgeFlags::SELF_ADJACENT) != edge.right.is_none() {
            return Err(WakeMeshError::Topology(format!(
                "edge {e}: self-adjacent flag disagrees with its {} triangles",
                edge.triangles().count()
            )));
        }
        if !edge.flags.contains(EdgeFlags::TRAILING_EDGE) {
            continue;
        }
        if edge
            .flags
            .intersects(EdgeFlags::BOUNDARY | EdgeFlags::PATCH_BOUNDARY)
        {
            return Err(WakeMeshError::Topology(format!(
                "trailing edge {e} is also flagged as a boundary"
            )));
        }
        if let Some(n) = edge
            .nodes
            .iter()
            .find(|n| !grid.node(**n).flags.contains(NodeFlags::KUTTA))
        {
            return Err(WakeMeshError::Topology(format!(
                "trailing edge {e} ends on node {n}, which is not a Kutta node"
            )));
        }
    }
    for (n, node) in grid.nodes().iter().enumerate() {
        if node.flags.contains(NodeFlags::WINGTIP) && !node.flags.contains(NodeFlags::KUTTA) {
            return Err(WakeMeshError::Topology(format!(
                "wingtip node {n} is not a Kutta node"
            )));
        }
    }
    Ok(())
}
