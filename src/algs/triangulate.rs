//! Triangulation of structured station grids and raw triangle soups into a
//! [`MeshSeed`].
//!
//! Structured quads are split into two triangles, each re-wound against a
//! local reference normal. Closed body caps collapse onto one node and the
//! triangles degenerating onto it are dropped.

use crate::algs::degeneracy::FilterReport;
use crate::algs::sharp_edges::SharpNodes;
use crate::geometry::metrics::{
    EPS, area_vector, dot, mean, normalize, scale, sub, triangle_centroid,
};
use crate::io::TriangleSoup;
use crate::io::flat_plate::{FlatPlateGeometry, StationGrid};
use crate::topology::entity::NodeFlags;
use crate::topology::grid::{MeshSeed, SeedTriangle};
use crate::topology::handle::{ComponentId, NodeId, PatchId};

/// Seed for the solver-facing mesh plus the sharp-node source it implies.
#[derive(Clone, Debug)]
pub struct SeededMesh {
    pub seed: MeshSeed,
    pub sharp: SharpNodes,
}

/// Grid point `(i, j)` to node index for wings.
#[inline]
fn wing_node(i: usize, j: usize, num_j: usize) -> usize {
    i * num_j + j
}

/// Split every quad of a wing plate and flag its trailing, leading and
/// boundary rows.
pub fn triangulate_wing(geom: &FlatPlateGeometry, component: ComponentId) -> SeededMesh {
    let grid = &geom.grid;
    let (ni, nj) = (grid.num_i(), grid.num_j());

    let positions = (0..ni)
        .flat_map(|i| (0..nj).map(move |j| (i, j)))
        .map(|(i, j)| grid.point(i, j).position)
        .collect();
    let mut seed = MeshSeed::with_positions(positions);

    for i in 0..ni {
        for j in 0..nj {
            let flags = &mut seed.node_flags[wing_node(i, j, nj)];
            let span_end = i == 0 || i == ni - 1;
            if j == 0 && geom.lifting {
                flags.insert(NodeFlags::TRAILING_EDGE);
            }
            if j == nj - 1 {
                flags.insert(NodeFlags::LEADING_EDGE);
            }
            if span_end || (j == 0 && geom.lifting) {
                flags.insert(NodeFlags::BOUNDARY_EDGE);
            }
            if span_end && (j == 0 || j == nj - 1) {
                flags.insert(NodeFlags::BOUNDARY_CORNER);
            }
        }
    }

    for i in 0..ni - 1 {
        let airfoil = Some(grid.stations[i].airfoil);
        for j in 0..nj - 1 {
            let quad = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
            for corners in [[0, 1, 2], [0, 2, 3]] {
                let mut ij = corners.map(|k| quad[k]);
                let reference = mean(&ij.map(|(a, b)| grid.point(a, b).normal));
                let p = ij.map(|(a, b)| grid.point(a, b).position);
                if dot(area_vector(p[0], p[1], p[2]), reference) < 0.0 {
                    ij.swap(1, 2);
                }
                seed.triangles.push(SeedTriangle {
                    nodes: ij.map(|(a, b)| wing_node(a, b, nj)),
                    uv: ij.map(|(a, b)| grid.point(a, b).uv),
                    patch: PatchId(1),
                    component,
                    span_station: Some(i),
                    airfoil,
                });
            }
        }
    }

    let sharp = if geom.lifting {
        SharpNodes::Explicit((0..ni).map(|i| NodeId::new(wing_node(i, 0, nj))).collect())
    } else {
        SharpNodes::None
    };
    SeededMesh { seed, sharp }
}

/// Node numbering of a body whose closed cap rings hold a single node.
struct BodyNumbering {
    base: Vec<usize>,
    collapsed: Vec<bool>,
}

impl BodyNumbering {
    fn new(grid: &StationGrid, report: &FilterReport) -> (Self, Vec<[f64; 3]>) {
        let ni = grid.num_i();
        let mut base = Vec::with_capacity(ni);
        let mut collapsed = Vec::with_capacity(ni);
        let mut positions = Vec::new();
        for (i, station) in grid.stations.iter().enumerate() {
            let closed = (i == 0 && report.nose_closed) || (i == ni - 1 && report.tail_closed);
            base.push(positions.len());
            collapsed.push(closed);
            if closed {
                positions.push(station.points[0].position);
            } else {
                positions.extend(station.points.iter().map(|p| p.position));
            }
        }
        (BodyNumbering { base, collapsed }, positions)
    }

    fn node(&self, i: usize, j: usize) -> usize {
        if self.collapsed[i] { self.base[i] } else { self.base[i] + j }
    }
}

/// Triangulate a body of revolution; ring `j` runs around each axial station.
pub fn triangulate_body(
    geom: &FlatPlateGeometry,
    report: &FilterReport,
    component: ComponentId,
) -> SeededMesh {
    let grid = &geom.grid;
    let (ni, nj) = (grid.num_i(), grid.num_j());
    let (numbering, positions) = BodyNumbering::new(grid, report);
    let mut seed = MeshSeed::with_positions(positions);

    let centroids: Vec<[f64; 3]> = (0..ni)
        .map(|i| {
            if numbering.collapsed[i] {
                grid.point(i, 0).position
            } else {
                mean(&grid.stations[i].positions())
            }
        })
        .collect();

    let mut dropped = 0usize;
    for i in 0..ni - 1 {
        let axis = sub(centroids[i + 1], centroids[i]);
        for j in 0..nj - 1 {
            let quad = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
            let split = if j < nj / 2 {
                [[0, 1, 2], [0, 2, 3]]
            } else {
                [[0, 1, 3], [3, 1, 2]]
            };
            for corners in split {
                let mut ij = corners.map(|k| quad[k]);
                let nodes = ij.map(|(a, b)| numbering.node(a, b));
                if nodes[0] == nodes[1] || nodes[0] == nodes[2] || nodes[1] == nodes[2] {
                    dropped += 1;
                    continue;
                }
                let p = ij.map(|(a, b)| grid.point(a, b).position);
                let centroid = triangle_centroid(p[0], p[1], p[2]);
                let reference = radial_offset(centroid, centroids[i], axis);
                if dot(area_vector(p[0], p[1], p[2]), reference) < 0.0 {
                    ij.swap(1, 2);
                }
                seed.triangles.push(SeedTriangle {
                    nodes: ij.map(|(a, b)| numbering.node(a, b)),
                    uv: ij.map(|(a, b)| grid.point(a, b).uv),
                    patch: PatchId(1),
                    component,
                    span_station: Some(i),
                    airfoil: None,
                });
            }
        }
    }
    if dropped > 0 {
        log::debug!("{}: dropped {dropped} triangles collapsed onto cap apexes", geom.name);
    }

    SeededMesh {
        seed,
        sharp: SharpNodes::None,
    }
}

/// Offset of `p` from the axis through `origin` along `axis`, or from
/// `origin` itself when the axis or the offset vanishes.
fn radial_offset(p: [f64; 3], origin: [f64; 3], axis: [f64; 3]) -> [f64; 3] {
    let d = sub(p, origin);
    let Some(dir) = normalize(axis) else {
        return d;
    };
    let radial = sub(d, scale(dir, dot(d, dir)));
    if dot(radial, radial) > EPS * EPS { radial } else { d }
}

/// Raw triangles keep the exporter's winding.
pub fn triangulate_soup(soup: &TriangleSoup) -> SeededMesh {
    let tri = &soup.triangulation;
    let mut seed = MeshSeed::with_positions(tri.positions.clone());
    seed.triangles = tri
        .triangles
        .iter()
        .zip(&soup.patches.triangle_patches)
        .zip(&soup.corner_uv)
        .map(|((&nodes, &patch), &uv)| SeedTriangle {
            nodes,
            uv,
            patch,
            component: soup.patches.component_of(patch),
            span_station: None,
            airfoil: None,
        })
        .collect();

    let sharp = match &soup.sharp_nodes {
        Some(list) => SharpNodes::Explicit(list.iter().map(|&n| NodeId::new(n)).collect()),
        None => SharpNodes::Derived,
    };
    SeededMesh { seed, sharp }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::flat_plate::{GridPoint, Station, StationKind};
    use crate::topology::grid::MeshGrid;

    fn flat_wing(ni: usize, nj: usize, lifting: bool) -> FlatPlateGeometry {
        let stations = (0..ni)
            .map(|i| Station {
                points: (0..nj)
                    .map(|j| GridPoint {
                        position: [1.0 - j as f64 / (nj - 1) as f64, i as f64, 0.0],
                        normal: [0.0, 0.0, 1.0],
                        uv: [i as f64, j as f64],
                    })
                    .collect(),
                ..Station::default()
            })
            .collect();
        FlatPlateGeometry {
            name: "w".into(),
            grid: StationGrid {
                kind: StationKind::Wing,
                stations,
            },
            lifting,
            bounding_box: None,
            wetted_area: None,
            control_surfaces: Vec::new(),
        }
    }

    #[test]
    fn wing_triangles_face_the_camber_normal() {
        let seeded = triangulate_wing(&flat_wing(3, 4, true), ComponentId(1));
        assert_eq!(seeded.seed.triangles.len(), 2 * 2 * 3);
        let grid = MeshGrid::from_seed(seeded.seed).unwrap();
        assert!(grid.triangles().iter().all(|t| t.normal[2] > 0.99));
        let SharpNodes::Explicit(te) = seeded.sharp else {
            panic!("lifting wing lists its trailing edge");
        };
        assert_eq!(te, vec![NodeId::new(0), NodeId::new(4), NodeId::new(8)]);
        let corner = grid.node(NodeId::new(3)).flags;
        assert!(corner.contains(NodeFlags::LEADING_EDGE | NodeFlags::BOUNDARY_CORNER));
        assert!(grid.node(NodeId::new(4)).flags.contains(NodeFlags::TRAILING_EDGE));
    }

    #[test]
    fn non_lifting_wing_has_no_trailing_edge() {
        let seeded = triangulate_wing(&flat_wing(2, 2, false), ComponentId(1));
        assert!(matches!(seeded.sharp, SharpNodes::None));
        assert!(!seeded.seed.node_flags[0].contains(NodeFlags::TRAILING_EDGE));
    }

    #[test]
    fn radial_offset_ignores_axial_component() {
        let r = radial_offset([2.0, 0.0, 3.0], [0.0; 3], [1.0, 0.0, 0.0]);
        assert_eq!(r, [0.0, 0.0, 3.0]);
        let r = radial_offset([2.0, 0.0, 3.0], [0.0; 3], [0.0; 3]);
        assert_eq!(r, [2.0, 0.0, 3.0]);
    }
}
