//! Build a CSR (compressed-sparse-row) *dual graph* of one grid level.
//
// Each *cell* is a vertex; an undirected edge joins two cells that share at
// least one level edge and no marker edge. Cells of different patches or
// components are never joined.
//
// Returned as CSR triples:
//
// * `xadj[i] .. xadj[i+1]`   = neighbour list of cell *i*
// * `adjncy`                 = concatenated neighbour cells, ascending
// * `shared_length`          = total length of the edges shared with that neighbour
//
// The dual graph is **symmetrised** (i↔j appear in both lists) and
// **self-free** (no loops).

use std::collections::{BTreeMap, HashSet};

use crate::topology::coarsen::GridLevel;

/// CSR triple
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DualGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub shared_length: Vec<f64>,
}

impl DualGraph {
    /// `(neighbour, shared length)` pairs of cell `i`.
    pub fn neighbors(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.xadj[i]..self.xadj[i + 1];
        self.adjncy[range.clone()]
            .iter()
            .copied()
            .zip(self.shared_length[range].iter().copied())
    }

    pub fn vertex_count(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }
}

/// Unordered cell pairs separated by at least one marker edge.
pub fn marker_pairs(level: &GridLevel) -> HashSet<(usize, usize)> {
    level
        .edges
        .iter()
        .filter(|e| e.is_marker())
        .filter_map(|e| e.right.map(|r| (e.left.min(r), e.left.max(r))))
        .collect()
}

/// Build the mergeable-neighbour graph of `level`.
pub fn build_dual(level: &GridLevel) -> DualGraph {
    let blocked = marker_pairs(level);
    let n = level.cell_count();

    // 1. accumulate shared lengths per neighbour, ordered for determinism
    let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
    for edge in &level.edges {
        let Some(r) = edge.right else { continue };
        let l = edge.left;
        if l == r || blocked.contains(&(l.min(r), l.max(r))) {
            continue;
        }
        let (a, b) = (&level.cells[l], &level.cells[r]);
        if a.patch != b.patch || a.component != b.component {
            continue;
        }
        *adj[l].entry(r).or_default() += edge.length;
        *adj[r].entry(l).or_default() += edge.length;
    }

    // 2. convert to CSR vectors
    let mut xadj = Vec::with_capacity(n + 1);
    let mut adjncy = Vec::new();
    let mut shared_length = Vec::new();
    xadj.push(0);
    for nbrs in &adj {
        for (&c, &len) in nbrs {
            adjncy.push(c);
            shared_length.push(len);
        }
        xadj.push(adjncy.len());
    }

    DualGraph {
        xadj,
        adjncy,
        shared_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::entity::EdgeFlags;
    use crate::topology::grid::MeshGrid;
    use crate::topology::grid::tests::unit_square;

    #[test]
    fn dual_graph_two_cells() {
        let level = GridLevel::finest(&MeshGrid::from_seed(unit_square()).unwrap());
        let dg = build_dual(&level);

        // should be 2 vertices with a single undirected edge
        assert_eq!(dg.xadj, vec![0, 1, 2]);
        assert_eq!(dg.adjncy, vec![1, 0]);
        assert!((dg.shared_length[0] - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(dg.neighbors(1).collect::<Vec<_>>(), vec![(0, dg.shared_length[1])]);
    }

    #[test]
    fn marker_edge_separates_cells() {
        let mut level = GridLevel::finest(&MeshGrid::from_seed(unit_square()).unwrap());
        let diag = level.edges.iter().position(|e| e.right.is_some()).unwrap();
        level.edges[diag].flags.insert(EdgeFlags::TRAILING_EDGE);
        let dg = build_dual(&level);
        assert_eq!(dg.vertex_count(), 2);
        assert!(dg.adjncy.is_empty());
        assert!(marker_pairs(&level).contains(&(0, 1)));
    }
}
