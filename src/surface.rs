//! The assembled surface and the builder that runs the construction pipeline.
//!
//! [`SurfaceBuilder::build`] is the only way to obtain a [`Surface`]:
//! read → filter stations → triangulate → finish edges → classify sharp
//! edges → assemble wake chains → annotate upwind edges → agglomerate →
//! validate. Any stage failing aborts the build, so a `Surface` never holds a
//! partially built mesh.

use serde::{Deserialize, Serialize};

use crate::algs::agglomerate::{AgglomerationOptions, build_hierarchy, max_coarse_levels};
use crate::algs::degeneracy::{FilterOptions, FilterReport, filter_stations};
use crate::algs::sharp_edges::{ClassifierOptions, classify};
use crate::algs::triangulate::{SeededMesh, triangulate_body, triangulate_soup, triangulate_wing};
use crate::algs::upwind::annotate_upwind;
use crate::algs::wake_chains::assemble_chains;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::metrics::BoundingBox;
use crate::io::flat_plate::{ControlSurface, FlatPlateGeometry, StationKind};
use crate::io::{GeometryInput, GeometrySource};
use crate::mesh_error::WakeMeshError;
use crate::topology::adjacency::Adjacency;
use crate::topology::coarsen::GridLevel;
use crate::topology::entity::{
    BoundaryCondition, Edge, EdgeFlags, KuttaNode, Node, NodeFlags, PatchInfo, Triangle, WakeSheet,
};
use crate::topology::grid::MeshGrid;
use crate::topology::handle::{ComponentId, PatchId};

/// How the surface was described in its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceKind {
    Wing,
    Body,
    Triangulated,
}

/// Options for every stage of [`SurfaceBuilder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOptions {
    pub classifier: ClassifierOptions,
    pub filter: FilterOptions,
    pub agglomeration: AgglomerationOptions,
    /// Build coarse grid levels; when off only the finest level is stored.
    pub build_hierarchy: bool,
    /// Run the full invariant checks before returning.
    pub validate: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        SurfaceOptions {
            classifier: ClassifierOptions::default(),
            filter: FilterOptions::default(),
            agglomeration: AgglomerationOptions::default(),
            build_hierarchy: true,
            validate: true,
        }
    }
}

/// A finished surface mesh with its wake topology and grid hierarchy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Surface {
    name: String,
    kind: SurfaceKind,
    grid: MeshGrid,
    kutta_nodes: Vec<KuttaNode>,
    sheets: Vec<WakeSheet>,
    levels: Vec<GridLevel>,
    patches: Vec<PatchInfo>,
    control_surfaces: Vec<ControlSurface>,
    wetted_area: f64,
    bounding_box: Option<BoundingBox>,
    max_grid_levels: usize,
}

impl Surface {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// The finest-level mesh.
    pub fn grid(&self) -> &MeshGrid {
        &self.grid
    }

    pub fn nodes(&self) -> &[Node] {
        self.grid.nodes()
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.grid.triangles()
    }

    pub fn edges(&self) -> &[Edge] {
        self.grid.edges()
    }

    pub fn adjacency(&self) -> &Adjacency {
        self.grid.adjacency()
    }

    /// All Kutta nodes, sheet by sheet in chain order.
    pub fn kutta_nodes(&self) -> &[KuttaNode] {
        &self.kutta_nodes
    }

    pub fn sheets(&self) -> &[WakeSheet] {
        &self.sheets
    }

    /// The Kutta nodes of one sheet in chain order; empty for an unknown
    /// sheet id.
    pub fn sheet_nodes(&self, sheet: usize) -> impl Iterator<Item = &KuttaNode> + '_ {
        self.sheets
            .get(sheet)
            .into_iter()
            .flat_map(|s| s.kutta_nodes.iter())
            .map(move |&k| &self.kutta_nodes[k])
    }

    /// Grid levels, finest first.
    pub fn levels(&self) -> &[GridLevel] {
        &self.levels
    }

    pub fn patches(&self) -> &[PatchInfo] {
        &self.patches
    }

    pub fn control_surfaces(&self) -> &[ControlSurface] {
        &self.control_surfaces
    }

    pub fn wetted_area(&self) -> f64 {
        self.wetted_area
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounding_box
    }

    /// Upper bound on coarse levels implied by the triangle count.
    pub fn max_grid_levels(&self) -> usize {
        self.max_grid_levels
    }
}

/// Runs the construction pipeline for one geometry component.
#[derive(Clone, Debug, Default)]
pub struct SurfaceBuilder {
    options: SurfaceOptions,
}

impl SurfaceBuilder {
    pub fn new(options: SurfaceOptions) -> Self {
        SurfaceBuilder { options }
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn build(&self, source: &GeometrySource) -> Result<Surface, WakeMeshError> {
        let name = source.name().to_string();
        let opts = &self.options;

        let parts = match source.read()? {
            GeometryInput::Structured(mut geom) => {
                let report = filter_stations(&mut geom.grid, &opts.filter)?;
                structured_parts(geom, &report)
            }
            GeometryInput::Unstructured(soup) => SurfaceParts {
                kind: SurfaceKind::Triangulated,
                seeded: triangulate_soup(&soup),
                patches: soup.patches.patches,
                control_surfaces: Vec::new(),
                wetted_area: None,
                bounding_box: BoundingBox::from_points(&soup.triangulation.positions),
            },
        };
        let SurfaceParts {
            kind,
            seeded: SeededMesh { seed, sharp },
            patches,
            control_surfaces,
            wetted_area,
            bounding_box,
        } = parts;

        let mut grid = MeshGrid::from_seed(seed)?;
        tag_control_surfaces(&mut grid, &control_surfaces);
        let classification = classify(&mut grid, &sharp, &opts.classifier);
        let (kutta_nodes, sheets) = assemble_chains(&mut grid, &classification);
        annotate_upwind(&mut grid);

        let max_grid_levels = max_coarse_levels(grid.triangles().len());
        let levels = if opts.build_hierarchy {
            build_hierarchy(&grid, &opts.agglomeration)?
        } else {
            vec![GridLevel::finest(&grid)]
        };

        let surface = Surface {
            name,
            kind,
            wetted_area: wetted_area.unwrap_or_else(|| grid.wetted_area()),
            bounding_box,
            grid,
            kutta_nodes,
            sheets,
            levels,
            patches,
            control_surfaces,
            max_grid_levels,
        };
        if opts.validate {
            surface.validate_invariants()?;
        } else {
            surface.debug_assert_invariants();
        }

        log::info!(
            "Built surface {}: {} nodes, {} triangles, {} edges, {} Kutta nodes in {} sheets, {} grid levels",
            surface.name,
            surface.nodes().len(),
            surface.triangles().len(),
            surface.edges().len(),
            surface.kutta_nodes.len(),
            surface.sheets.len(),
            surface.levels.len()
        );
        Ok(surface)
    }
}

struct SurfaceParts {
    kind: SurfaceKind,
    seeded: SeededMesh,
    patches: Vec<PatchInfo>,
    control_surfaces: Vec<ControlSurface>,
    wetted_area: Option<f64>,
    bounding_box: Option<BoundingBox>,
}

/// Flat-plate components form a single patch named after the component.
fn structured_parts(geom: FlatPlateGeometry, report: &FilterReport) -> SurfaceParts {
    let component = ComponentId(1);
    let (kind, seeded) = match geom.grid.kind {
        StationKind::Wing => (SurfaceKind::Wing, triangulate_wing(&geom, component)),
        StationKind::Body => (SurfaceKind::Body, triangulate_body(&geom, report, component)),
    };
    let patches = vec![PatchInfo {
        id: PatchId(1),
        name: geom.name.clone(),
        boundary_condition: BoundaryCondition::Wall,
        component,
    }];
    SurfaceParts {
        kind,
        seeded,
        patches,
        wetted_area: geom.wetted_area,
        bounding_box: geom.bounding_box.or_else(|| geom.grid.bounding_box()),
        control_surfaces: geom.control_surfaces,
    }
}

/// First control surface whose parametric box holds the triangle's
/// parametric centroid.
fn tag_control_surfaces(grid: &mut MeshGrid, control_surfaces: &[ControlSurface]) {
    if control_surfaces.is_empty() {
        return;
    }
    let mut tagged = 0usize;
    for tri in grid.triangles_mut() {
        tri.control_surface = control_surfaces
            .iter()
            .position(|cs| cs.contains_uv(tri.uv_centroid));
        tagged += usize::from(tri.control_surface.is_some());
    }
    log::debug!(
        "Tagged {tagged} triangles with {} control surfaces",
        control_surfaces.len()
    );
}

impl DebugInvariants for Surface {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Surface");
    }

    fn validate_invariants(&self) -> Result<(), WakeMeshError> {
        self.grid.validate_invariants()?;
        check_chains(self)?;
        check_levels(self)
    }
}

/// Sheets partition the Kutta-node sequence and agree with the node records.
fn check_chains(surface: &Surface) -> Result<(), WakeMeshError> {
    let mut seen = vec![false; surface.kutta_nodes.len()];
    for (s, sheet) in surface.sheets.iter().enumerate() {
        if sheet.id != s {
            return Err(WakeMeshError::Topology(format!(
                "sheet at position {s} carries id {}",
                sheet.id
            )));
        }
        let mut previous = 0.0;
        for &k in &sheet.kutta_nodes {
            let Some(kutta) = surface.kutta_nodes.get(k) else {
                return Err(WakeMeshError::Topology(format!(
                    "sheet {s} references missing Kutta node {k}"
                )));
            };
            if std::mem::replace(&mut seen[k], true) {
                return Err(WakeMeshError::Topology(format!(
                    "Kutta node {k} belongs to more than one sheet"
                )));
            }
            let node = surface.grid.node(kutta.node);
            if kutta.sheet != s || node.kutta != Some(k) || !node.flags.contains(NodeFlags::KUTTA) {
                return Err(WakeMeshError::Topology(format!(
                    "Kutta node {k} disagrees with node {}",
                    kutta.node
                )));
            }
            if node.component != sheet.component {
                return Err(WakeMeshError::Topology(format!(
                    "sheet {s} crosses from component {} to {}",
                    sheet.component, node.component
                )));
            }
            if !(previous..=1.0).contains(&kutta.arc_fraction) {
                return Err(WakeMeshError::Topology(format!(
                    "arc fraction {} of Kutta node {k} is out of order",
                    kutta.arc_fraction
                )));
            }
            previous = kutta.arc_fraction;
        }
    }
    match seen.iter().position(|&s| !s) {
        Some(k) => Err(WakeMeshError::Topology(format!(
            "Kutta node {k} belongs to no sheet"
        ))),
        None => Ok(()),
    }
}

/// Coarse levels cover every triangle once and keep every marker edge
/// between two distinct cells.
fn check_levels(surface: &Surface) -> Result<(), WakeMeshError> {
    let triangles = surface.grid.triangles().len();
    for (l, level) in surface.levels.iter().enumerate() {
        let mut covered = vec![false; triangles];
        for t in level.cells.iter().flat_map(|c| c.triangles.iter()) {
            if std::mem::replace(&mut covered[t.index()], true) {
                return Err(WakeMeshError::Topology(format!(
                    "level {l} covers triangle {t} twice"
                )));
            }
        }
        if covered.iter().any(|&c| !c) {
            return Err(WakeMeshError::Topology(format!(
                "level {l} leaves triangles uncovered"
            )));
        }
        for edge in level.edges.iter().filter(|e| e.is_marker()) {
            if edge.right == Some(edge.left) {
                return Err(WakeMeshError::Topology(format!(
                    "level {l} buries a marker edge inside cell {}",
                    edge.left
                )));
            }
        }
        let markers: usize = level
            .edges
            .iter()
            .filter(|e| e.is_marker())
            .map(|e| e.fine_edges.len())
            .sum();
        let expected = surface
            .grid
            .edges()
            .iter()
            .filter(|e| e.flags.intersects(EdgeFlags::MARKERS))
            .count();
        if markers != expected {
            return Err(WakeMeshError::Topology(format!(
                "level {l} keeps {markers} of {expected} marker edges"
            )));
        }
    }
    Ok(())
}
