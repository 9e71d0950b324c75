//! Grid levels of the multigrid hierarchy and the coarsening step that
//! merges fine cells into coarse cells with a transfer map.
//!
//! Coarsening replaces groups of fine cells with one coarse cell each and
//! rebuilds the edge set. Marker edges (trailing edge, boundary, patch
//! boundary) must separate cells at every level; a grouping that would bury
//! one inside a coarse cell is rejected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::metrics::{add, normalize, scale};
use crate::mesh_error::WakeMeshError;
use crate::topology::entity::EdgeFlags;
use crate::topology::grid::MeshGrid;
use crate::topology::handle::{ComponentId, EdgeId, PatchId, TriId};

/// Mapping from coarse cells to the previous level's cells they replace.
pub type CoarseningMap = Vec<(usize, Vec<usize>)>;

/// An agglomerated cell: one triangle on the finest level, a patch of
/// triangles on coarser ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub area: f64,
    /// Area-weighted unit normal.
    pub normal: [f64; 3],
    /// Area-weighted centroid.
    pub centroid: [f64; 3],
    pub patch: PatchId,
    pub component: ComponentId,
    /// Cells of the previous level merged into this one.
    pub children: Vec<usize>,
    /// Finest-level triangles covered by this cell.
    pub triangles: Vec<TriId>,
}

/// Edge between two cells of one level, or on the boundary of one cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelEdge {
    pub left: usize,
    pub right: Option<usize>,
    pub flags: EdgeFlags,
    /// Total length of the fine edges it represents.
    pub length: f64,
    /// Edges of the previous level merged into this one.
    pub children: Vec<usize>,
    /// Finest-level edges it represents.
    pub fine_edges: Vec<EdgeId>,
}

impl LevelEdge {
    pub fn is_marker(&self) -> bool {
        self.flags.intersects(EdgeFlags::MARKERS)
    }
}

/// One level of the multigrid hierarchy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLevel {
    pub cells: Vec<Cell>,
    pub edges: Vec<LevelEdge>,
    /// Coarse cell → previous-level cells; empty on the finest level.
    pub transfer_map: CoarseningMap,
}

impl GridLevel {
    /// Level 0: one cell per triangle, one edge per mesh edge.
    pub fn finest(grid: &MeshGrid) -> Self {
        let cells = grid
            .triangles()
            .iter()
            .enumerate()
            .map(|(t, tri)| Cell {
                area: tri.area,
                normal: tri.normal,
                centroid: tri.centroid,
                patch: tri.patch,
                component: tri.component,
                children: Vec::new(),
                triangles: vec![TriId::new(t)],
            })
            .collect();
        let edges = grid
            .edges()
            .iter()
            .enumerate()
            .map(|(e, edge)| LevelEdge {
                left: edge.left.index(),
                right: edge.right.map(TriId::index),
                flags: edge.flags,
                length: edge.length,
                children: Vec::new(),
                fine_edges: vec![EdgeId::new(e)],
            })
            .collect();
        GridLevel {
            cells,
            edges,
            transfer_map: Vec::new(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// A coarse cell and the fine cells it replaces.
#[derive(Clone, Debug)]
pub struct CoarsenEntity {
    pub fine_cells: Vec<usize>,
}

/// Coarsen a level by merging fine cells into coarse cells.
///
/// Every fine cell must appear in exactly one entity. Coarse cell `k` is built
/// from `entities[k]`; the returned level's transfer map records the merge.
pub fn coarsen_level(
    fine: &GridLevel,
    entities: &[CoarsenEntity],
) -> Result<GridLevel, WakeMeshError> {
    let mut owner: Vec<Option<usize>> = vec![None; fine.cells.len()];
    for (k, entity) in entities.iter().enumerate() {
        if entity.fine_cells.is_empty() {
            return Err(WakeMeshError::Topology(format!("coarse cell {k} is empty")));
        }
        for &c in &entity.fine_cells {
            let slot = owner.get_mut(c).ok_or_else(|| {
                WakeMeshError::Topology(format!("coarse cell {k} references unknown cell {c}"))
            })?;
            if let Some(prev) = slot.replace(k) {
                return Err(WakeMeshError::Topology(format!(
                    "cell {c} assigned to coarse cells {prev} and {k}"
                )));
            }
        }
    }
    let owner: Vec<usize> = owner
        .into_iter()
        .enumerate()
        .map(|(c, o)| {
            o.ok_or_else(|| WakeMeshError::Topology(format!("cell {c} was not agglomerated")))
        })
        .collect::<Result<_, _>>()?;

    let mut cells = Vec::with_capacity(entities.len());
    let mut transfer_map = Vec::with_capacity(entities.len());
    for (k, entity) in entities.iter().enumerate() {
        let first = &fine.cells[entity.fine_cells[0]];
        let mut area = 0.0;
        let mut weighted_normal = [0.0; 3];
        let mut weighted_centroid = [0.0; 3];
        let mut triangles = Vec::new();
        for &c in &entity.fine_cells {
            let cell = &fine.cells[c];
            if cell.patch != first.patch || cell.component != first.component {
                return Err(WakeMeshError::Topology(format!(
                    "coarse cell {k} mixes patches {} and {}",
                    first.patch, cell.patch
                )));
            }
            area += cell.area;
            weighted_normal = add(weighted_normal, scale(cell.normal, cell.area));
            weighted_centroid = add(weighted_centroid, scale(cell.centroid, cell.area));
            triangles.extend_from_slice(&cell.triangles);
        }
        let centroid = if area > 0.0 {
            scale(weighted_centroid, 1.0 / area)
        } else {
            first.centroid
        };
        cells.push(Cell {
            area,
            normal: normalize(weighted_normal).unwrap_or(first.normal),
            centroid,
            patch: first.patch,
            component: first.component,
            children: entity.fine_cells.clone(),
            triangles,
        });
        transfer_map.push((k, entity.fine_cells.clone()));
    }

    let mut by_key: HashMap<(usize, Option<usize>, EdgeFlags), usize> = HashMap::new();
    let mut edges: Vec<LevelEdge> = Vec::new();
    for (fe, edge) in fine.edges.iter().enumerate() {
        let l = owner[edge.left];
        let r = edge.right.map(|r| owner[r]);
        if r == Some(l) {
            if edge.is_marker() {
                return Err(WakeMeshError::Topology(format!(
                    "marker edge {fe} would lie inside coarse cell {l}"
                )));
            }
            continue;
        }
        let key = match r {
            Some(r) => (l.min(r), Some(l.max(r)), edge.flags),
            None => (l, None, edge.flags),
        };
        match by_key.get(&key) {
            Some(&idx) => {
                let coarse = &mut edges[idx];
                coarse.length += edge.length;
                coarse.children.push(fe);
                coarse.fine_edges.extend_from_slice(&edge.fine_edges);
            }
            None => {
                by_key.insert(key, edges.len());
                edges.push(LevelEdge {
                    left: l,
                    right: r,
                    flags: edge.flags,
                    length: edge.length,
                    children: vec![fe],
                    fine_edges: edge.fine_edges.clone(),
                });
            }
        }
    }

    Ok(GridLevel {
        cells,
        edges,
        transfer_map,
    })
}
