//! Multigrid agglomeration: repeated pairwise merging of neighboring cells.
//!
//! Each pass visits cells in seed order (trailing-edge cells, then cells on a
//! marker edge, then the rest) and merges every unmerged seed with its best
//! unmerged neighbor. Cells left alone may join a much larger neighboring
//! coarse cell. Marker edges never end up inside a coarse cell.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::algs::dual_graph::{DualGraph, build_dual, marker_pairs};
use crate::geometry::metrics::dot;
use crate::mesh_error::WakeMeshError;
use crate::topology::coarsen::{CoarsenEntity, GridLevel, coarsen_level};
use crate::topology::entity::EdgeFlags;
use crate::topology::grid::MeshGrid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgglomerationOptions {
    /// Cap on the number of coarse levels; the triangle-count limit applies
    /// regardless.
    pub max_levels: Option<usize>,
    /// Stop once a level has at most this many cells.
    pub min_cells: usize,
    /// A lone cell joins a neighboring coarse cell at most this much larger
    /// than itself (by inverse area ratio).
    pub small_cell_area_ratio: f64,
}

impl Default for AgglomerationOptions {
    fn default() -> Self {
        AgglomerationOptions {
            max_levels: None,
            min_cells: 1,
            small_cell_area_ratio: 0.2,
        }
    }
}

/// `floor(log4(triangles))`, at least 1.
pub fn max_coarse_levels(triangles: usize) -> usize {
    let mut n = triangles;
    let mut levels = 0;
    while n >= 4 {
        n /= 4;
        levels += 1;
    }
    levels.max(1)
}

/// The finest level followed by every coarse level built.
pub fn build_hierarchy(
    grid: &MeshGrid,
    opts: &AgglomerationOptions,
) -> Result<Vec<GridLevel>, WakeMeshError> {
    let cap = max_coarse_levels(grid.triangles().len());
    let limit = opts.max_levels.map_or(cap, |m| m.min(cap));

    let mut levels = vec![GridLevel::finest(grid)];
    while levels.len() <= limit {
        let Some(fine) = levels.last() else { break };
        if fine.cell_count() <= opts.min_cells {
            break;
        }
        let entities = plan_pass(fine, opts);
        if entities.len() >= fine.cell_count() {
            break;
        }
        let coarse = coarsen_level(fine, &entities)?;
        log::debug!(
            "Agglomerated level {}: {} -> {} cells",
            levels.len(),
            fine.cell_count(),
            coarse.cell_count()
        );
        levels.push(coarse);
    }
    Ok(levels)
}

/// Seed order: cells on a trailing edge, then cells on any other marker
/// edge, then the rest, each by index.
fn seed_order(level: &GridLevel) -> Vec<usize> {
    let mut rank = vec![2u8; level.cell_count()];
    for edge in &level.edges {
        let tier = if edge.flags.contains(EdgeFlags::TRAILING_EDGE) {
            0
        } else if edge.is_marker() {
            1
        } else {
            continue;
        };
        for c in std::iter::once(edge.left).chain(edge.right) {
            rank[c] = rank[c].min(tier);
        }
    }
    let mut order: Vec<usize> = (0..level.cell_count()).collect();
    order.sort_by_key(|&c| (rank[c], c));
    order
}

/// Group the cells of `level` into the coarse cells of the next level.
pub fn plan_pass(level: &GridLevel, opts: &AgglomerationOptions) -> Vec<CoarsenEntity> {
    let dual = build_dual(level);
    let mut group_of: Vec<Option<usize>> = vec![None; level.cell_count()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for seed in seed_order(level) {
        if group_of[seed].is_some() {
            continue;
        }
        let normal = level.cells[seed].normal;
        let partner = dual
            .neighbors(seed)
            .filter(|&(c, _)| group_of[c].is_none())
            .map(|(c, len)| (c, dot(normal, level.cells[c].normal) * len))
            .fold(None, |best: Option<(usize, f64)>, (c, score)| match best {
                Some((_, s)) if s >= score => best,
                _ => Some((c, score)),
            });
        let g = groups.len();
        group_of[seed] = Some(g);
        let mut members = vec![seed];
        if let Some((c, _)) = partner {
            group_of[c] = Some(g);
            members.push(c);
        }
        groups.push(members);
    }

    absorb_small_cells(level, &dual, opts, &mut groups, &mut group_of);

    groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(|fine_cells| CoarsenEntity { fine_cells })
        .collect()
}

/// Fold lone cells into a neighboring coarse cell when they are small next
/// to it and share no marker edge with any of its members.
fn absorb_small_cells(
    level: &GridLevel,
    dual: &DualGraph,
    opts: &AgglomerationOptions,
    groups: &mut [Vec<usize>],
    group_of: &mut [Option<usize>],
) {
    let blocked: HashSet<(usize, usize)> = marker_pairs(level);
    let group_area = |members: &[usize]| members.iter().map(|&c| level.cells[c].area).sum::<f64>();

    for g in 0..groups.len() {
        let &[cell] = groups[g].as_slice() else {
            continue;
        };
        let area = level.cells[cell].area;
        let target = dual
            .neighbors(cell)
            .filter_map(|(c, _)| group_of[c])
            .filter(|&h| h != g && groups[h].len() > 1)
            .filter(|&h| area <= opts.small_cell_area_ratio * group_area(&groups[h]))
            .find(|&h| {
                groups[h]
                    .iter()
                    .all(|&m| !blocked.contains(&(cell.min(m), cell.max(m))))
            });
        if let Some(h) = target {
            groups[g].clear();
            groups[h].push(cell);
            group_of[cell] = Some(h);
        }
    }
}
