//! Compressed-sparse-row adjacency between mesh entities.
//
// Rows are stored ParMETIS-style:
//
// * `offsets[i] .. offsets[i+1]` = slice of `targets` belonging to row *i*
// * `targets`                    = concatenated neighbour handles
//
// Rows keep insertion order, which follows ascending triangle/edge index, so
// every query is deterministic.

use serde::{Deserialize, Serialize};

use crate::topology::entity::{Edge, Triangle};
use crate::topology::handle::{EdgeId, NodeId, TriId};

/// CSR table mapping a dense row index to a list of handles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Csr<T> {
    pub offsets: Vec<usize>,
    pub targets: Vec<T>,
}

// Handles have no meaningful default value, so no `T: Default` bound.
impl<T> Default for Csr<T> {
    fn default() -> Self {
        Csr {
            offsets: Vec::new(),
            targets: Vec::new(),
        }
    }
}

impl<T: Copy> Csr<T> {
    /// Builds a table with `rows` rows from `(row, target)` pairs.
    pub fn from_pairs(rows: usize, pairs: impl IntoIterator<Item = (usize, T)> + Clone) -> Self {
        let mut counts = vec![0usize; rows + 1];
        for (row, _) in pairs.clone() {
            counts[row + 1] += 1;
        }
        for i in 0..rows {
            counts[i + 1] += counts[i];
        }
        let offsets = counts.clone();
        let mut cursor = counts;
        let mut slots: Vec<Option<T>> = vec![None; offsets[rows]];
        for (row, target) in pairs {
            slots[cursor[row]] = Some(target);
            cursor[row] += 1;
        }
        Csr {
            offsets,
            targets: slots.into_iter().flatten().collect(),
        }
    }

    pub fn row(&self, i: usize) -> &[T] {
        &self.targets[self.offsets[i]..self.offsets[i + 1]]
    }

    pub fn rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

/// Node → triangle, node → edge and triangle → edge incidence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Adjacency {
    pub node_triangles: Csr<TriId>,
    pub node_edges: Csr<EdgeId>,
    pub triangle_edges: Vec<[EdgeId; 3]>,
}

impl Adjacency {
    /// Builds all incidence tables.
    ///
    /// `triangle_edges[t][k]` is the edge opposite corner `(k + 2) % 3`, i.e.
    /// the edge running from corner `k` to corner `(k + 1) % 3`.
    pub fn build(node_count: usize, triangles: &[Triangle], edges: &[Edge]) -> Self {
        let node_triangles = Csr::from_pairs(
            node_count,
            triangles
                .iter()
                .enumerate()
                .flat_map(|(t, tri)| tri.nodes.iter().map(move |n| (n.index(), TriId::new(t)))),
        );
        let node_edges = Csr::from_pairs(
            node_count,
            edges
                .iter()
                .enumerate()
                .flat_map(|(e, edge)| edge.nodes.iter().map(move |n| (n.index(), EdgeId::new(e)))),
        );

        let mut triangle_edges = vec![[EdgeId::new(0); 3]; triangles.len()];
        for (t, tri) in triangles.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (tri.nodes[k], tri.nodes[(k + 1) % 3]);
                if let Some(&e) = node_edges
                    .row(a.index())
                    .iter()
                    .find(|e| edges[e.index()].other_node(a) == b)
                {
                    triangle_edges[t][k] = e;
                }
            }
        }

        Adjacency {
            node_triangles,
            node_edges,
            triangle_edges,
        }
    }

    pub fn triangles_of(&self, node: NodeId) -> &[TriId] {
        self.node_triangles.row(node.index())
    }

    pub fn edges_of(&self, node: NodeId) -> &[EdgeId] {
        self.node_edges.row(node.index())
    }

    /// The edge joining `a` and `b`, if any.
    pub fn edge_between(&self, edges: &[Edge], a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.edges_of(a)
            .iter()
            .copied()
            .find(|e| edges[e.index()].other_node(a) == b)
    }
}
