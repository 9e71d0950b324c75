//! Assembly of Kutta nodes into ordered wake-sheet chains.
//!
//! Chains are grown with an explicit worklist. Open ends (one incident
//! trailing edge) start chains first, then junctions, and whatever remains
//! forms closed loops shed as periodic sheets.

use itertools::Itertools;

use crate::algs::sharp_edges::Classification;
use crate::geometry::metrics::distance;
use crate::topology::entity::{KuttaNode, NodeFlags, WakeSheet};
use crate::topology::grid::MeshGrid;
use crate::topology::handle::{EdgeId, NodeId};

/// Order the classified Kutta nodes into sheets.
///
/// Returns the Kutta-node sequence (sheet by sheet, in chain order) and the
/// sheets indexing into it. Every node's `kutta` slot is set to its position
/// in the sequence.
pub fn assemble_chains(
    grid: &mut MeshGrid,
    classification: &Classification,
) -> (Vec<KuttaNode>, Vec<WakeSheet>) {
    let incident = |n: NodeId| classification.kutta_edges_of(n).len();
    let mut visited = vec![false; grid.nodes().len()];
    let mut kutta_nodes: Vec<KuttaNode> = Vec::with_capacity(classification.kutta_nodes.len());
    let mut sheets: Vec<WakeSheet> = Vec::new();

    loop {
        let candidates = &classification.kutta_nodes;
        let (start, periodic) =
            if let Some(n) = first_unvisited(candidates, &visited, |n| incident(n) == 1) {
                (n, false)
            } else if let Some(n) = first_unvisited(candidates, &visited, |n| incident(n) != 2) {
                (n, false)
            } else if let Some(n) = first_unvisited(candidates, &visited, |_| true) {
                (n, true)
            } else {
                break;
            };

        let chain = walk(grid, classification, start, &mut visited);
        let sheet = sheets.len();
        let component = grid.node(start).component;
        let fractions = arc_fractions(grid, &chain, periodic);
        if periodic {
            log::warn!(
                "Closed trailing edge of {} nodes shed as periodic sheet {sheet}",
                chain.len()
            );
        }

        let first = kutta_nodes.len();
        for (&node, arc_fraction) in chain.iter().zip(fractions) {
            let mut edges: [Option<EdgeId>; 2] = [None; 2];
            for (slot, &e) in edges.iter_mut().zip(classification.kutta_edges_of(node)) {
                *slot = Some(e);
            }
            grid.nodes_mut()[node.index()].kutta = Some(kutta_nodes.len());
            kutta_nodes.push(KuttaNode {
                node,
                sheet,
                arc_fraction,
                periodic,
                component,
                is_wingtip: grid.node(node).flags.contains(NodeFlags::WINGTIP),
                edges,
            });
        }
        sheets.push(WakeSheet {
            id: sheet,
            kutta_nodes: (first..kutta_nodes.len()).collect(),
            periodic,
            component,
        });
    }

    log::debug!(
        "Assembled {} wake sheets from {} Kutta nodes",
        sheets.len(),
        kutta_nodes.len()
    );
    (kutta_nodes, sheets)
}

fn first_unvisited(
    candidates: &[NodeId],
    visited: &[bool],
    accept: impl Fn(NodeId) -> bool,
) -> Option<NodeId> {
    candidates
        .iter()
        .copied()
        .find(|&n| !visited[n.index()] && accept(n))
}

/// Follow trailing edges from `start` through unvisited nodes of the same
/// component.
fn walk(
    grid: &MeshGrid,
    classification: &Classification,
    start: NodeId,
    visited: &mut [bool],
) -> Vec<NodeId> {
    let component = grid.node(start).component;
    let mut chain = vec![start];
    visited[start.index()] = true;
    let mut worklist = vec![start];

    while let Some(current) = worklist.pop() {
        let next = classification
            .kutta_edges_of(current)
            .iter()
            .map(|&e| grid.edge(e).other_node(current))
            .find(|n| !visited[n.index()] && grid.node(*n).component == component);
        if let Some(n) = next {
            visited[n.index()] = true;
            chain.push(n);
            worklist.push(n);
        }
    }
    chain
}

/// Cumulative arc length along `chain` over its total length; periodic
/// chains include the closing segment.
fn arc_fractions(grid: &MeshGrid, chain: &[NodeId], periodic: bool) -> Vec<f64> {
    let position = |n: &NodeId| grid.node(*n).position;
    let mut cumulative = Vec::with_capacity(chain.len());
    let mut length = 0.0;
    cumulative.push(0.0);
    for (a, b) in chain.iter().tuple_windows() {
        length += distance(position(a), position(b));
        cumulative.push(length);
    }
    if periodic && chain.len() > 1 {
        length += distance(position(&chain[chain.len() - 1]), position(&chain[0]));
    }
    if length <= 0.0 {
        return vec![0.0; chain.len()];
    }
    cumulative.into_iter().map(|s| s / length).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::sharp_edges::{ClassifierOptions, SharpNodes, classify};
    use crate::topology::grid::MeshSeed;
    use crate::topology::grid::tests::seed_tri;

    /// Flat strip of `n` quads along y; the row at x = 1 is listed as sharp.
    fn strip(n: usize) -> MeshGrid {
        let mut positions = Vec::new();
        for x in [1.0, 0.0] {
            for y in 0..=n {
                positions.push([x, y as f64, 0.0]);
            }
        }
        let mut seed = MeshSeed::with_positions(positions);
        let up = n + 1;
        for k in 0..n {
            seed.triangles.push(seed_tri([k, k + 1, up + k + 1]));
            seed.triangles.push(seed_tri([k, up + k + 1, up + k]));
        }
        MeshGrid::from_seed(seed).unwrap()
    }

    #[test]
    fn open_chain_runs_from_its_lowest_end() {
        let mut grid = strip(4);
        let sharp = SharpNodes::Explicit((0..5).map(NodeId::new).collect());
        let classification = classify(&mut grid, &sharp, &ClassifierOptions::default());
        let (kutta, sheets) = assemble_chains(&mut grid, &classification);
        assert_eq!(sheets.len(), 1);
        assert!(!sheets[0].periodic);
        let order: Vec<usize> = kutta.iter().map(|k| k.node.index()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
        let fractions: Vec<f64> = kutta.iter().map(|k| k.arc_fraction).collect();
        assert_eq!(fractions, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(kutta[0].edges[1], None);
        assert!(kutta[2].edges.iter().all(Option::is_some));
        assert_eq!(grid.node(NodeId::new(3)).kutta, Some(3));
    }

    #[test]
    fn closed_loop_is_periodic() {
        // four Kutta nodes ringing a flat fan
        let mut seed = MeshSeed::with_positions(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.5, 0.0],
        ]);
        seed.triangles = vec![
            seed_tri([0, 1, 4]),
            seed_tri([1, 2, 4]),
            seed_tri([2, 3, 4]),
            seed_tri([3, 0, 4]),
        ];
        let mut grid = MeshGrid::from_seed(seed).unwrap();
        let sharp = SharpNodes::Explicit((0..4).map(NodeId::new).collect());
        let classification = classify(&mut grid, &sharp, &ClassifierOptions::default());
        assert_eq!(classification.trailing_edges.len(), 4);
        let (kutta, sheets) = assemble_chains(&mut grid, &classification);
        assert_eq!(sheets.len(), 1);
        assert!(sheets[0].periodic);
        assert_eq!(kutta.len(), 4);
        let fractions: Vec<f64> = kutta.iter().map(|k| k.arc_fraction).collect();
        assert_eq!(fractions, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn single_node_chain_has_zero_fraction() {
        let grid = strip(1);
        assert_eq!(arc_fractions(&grid, &[NodeId::new(0)], false), vec![0.0]);
        assert_eq!(arc_fractions(&grid, &[NodeId::new(0)], true), vec![0.0]);
    }
}
