//! Flat-plate station reader for wings and bodies.
//!
//! # Supported layout
//! Comma-separated text as written by the vehicle-geometry exporter. Section
//! keywords are matched at the start of a line; anything between sections is
//! skipped.
//!
//! - `SURFACE_NODE,<NumI>,<NumJ>`, one header line, `NumI*NumJ` rows
//!   `x,y,z,u,v[,...]` (station-major).
//! - `PLATE,<NumI>,<NumJ>`, one header line, `NumI` station normals
//!   `nx,ny,nz`, one header line, `NumI*NumJ` rows
//!   `x,y,z,camber,_,Nx,Ny,Nz,u,_,v`. Wings only; bodies skip it.
//! - Optional `STICK_NODE`: one header line, `NumI` rows of at least 66 values.
//! - Optional `POINT`: one header line, one row whose 4th value is the wetted area.
//! - Optional `SUBSURF,<name>[,<typeName>,<type>,<fullName>]` blocks followed by
//!   `NODES,<N>` and `N` rows `u,w`.
//! - Optional `HINGELINE[,<N>]` followed by one `x1,y1,z1,x2,y2,z2` row per
//!   control surface.
//!
//! # Conventions
//! `i` runs over stations (spanwise for wings, axial for bodies) and `j` along
//! each station (trailing edge `j = 0` to leading edge for wings, around the
//! ring for bodies).

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::geometry::metrics::{BoundingBox, add, distance, normalize, scale, sub};
use crate::io::GeometryReader;
use crate::io::text::{LineCursor, comma_fields, parse_dims, parse_floats, parse_usize};
use crate::mesh_error::WakeMeshError;
use crate::topology::entity::AirfoilSection;

/// Stick-section columns (zero-based) holding the airfoil descriptors.
const STICK_TOC: usize = 12;
const STICK_TLOC: usize = 13;
const STICK_RADLE_TOP: usize = 64;
const STICK_RADLE_BOT: usize = 65;
const STICK_MIN_COLUMNS: usize = 66;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationKind {
    Wing,
    Body,
}

/// One sample point of a station.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub position: [f64; 3],
    /// Camber-surface normal; zero for bodies.
    pub normal: [f64; 3],
    pub uv: [f64; 2],
}

/// A spanwise (wing) or axial (body) station and its per-station data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub points: Vec<GridPoint>,
    pub plate_normal: [f64; 3],
    pub airfoil: AirfoilSection,
}

impl Station {
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Distance from the first (trailing edge) to the last (leading edge) point.
    pub fn chord(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => distance(a.position, b.position),
            _ => 0.0,
        }
    }
}

/// Structured station grid; every station has the same number of points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationGrid {
    pub kind: StationKind,
    pub stations: Vec<Station>,
}

impl StationGrid {
    pub fn num_i(&self) -> usize {
        self.stations.len()
    }

    pub fn num_j(&self) -> usize {
        self.stations.first().map_or(0, |s| s.points.len())
    }

    pub fn point(&self, i: usize, j: usize) -> &GridPoint {
        &self.stations[i].points[j]
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.stations
                .iter()
                .flat_map(|s| s.points.iter().map(|p| &p.position)),
        )
    }
}

/// Hinge axis of a control surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HingeLine {
    pub start: [f64; 3],
    pub end: [f64; 3],
    /// Unit vector from `start` to `end`.
    pub axis: [f64; 3],
}

/// A control surface outlined in the parametric `(u, w)` space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlSurface {
    pub name: String,
    pub short_name: String,
    pub type_name: Option<String>,
    pub kind: Option<i32>,
    pub uv_nodes: Vec<[f64; 2]>,
    pub uv_min: [f64; 2],
    pub uv_max: [f64; 2],
    pub hinge: Option<HingeLine>,
}

impl ControlSurface {
    /// Whether a parametric point lies inside the outline's bounding box.
    pub fn contains_uv(&self, uv: [f64; 2]) -> bool {
        (self.uv_min[0]..=self.uv_max[0]).contains(&uv[0])
            && (self.uv_min[1]..=self.uv_max[1]).contains(&uv[1])
    }
}

/// Everything read from one flat-plate component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatPlateGeometry {
    pub name: String,
    pub grid: StationGrid,
    /// Lifting wings shed a wake from their trailing edge.
    pub lifting: bool,
    /// Bounding box of the `SURFACE_NODE` wire frame.
    pub bounding_box: Option<BoundingBox>,
    pub wetted_area: Option<f64>,
    pub control_surfaces: Vec<ControlSurface>,
}

/// Reader for flat-plate wing or body components.
#[derive(Debug, Clone)]
pub struct FlatPlateReader {
    pub kind: StationKind,
    pub name: String,
}

impl FlatPlateReader {
    pub fn wing(name: impl Into<String>) -> Self {
        FlatPlateReader {
            kind: StationKind::Wing,
            name: name.into(),
        }
    }

    pub fn body(name: impl Into<String>) -> Self {
        FlatPlateReader {
            kind: StationKind::Body,
            name: name.into(),
        }
    }

    /// Parse an in-memory stream.
    pub fn parse(&self, text: &str) -> Result<FlatPlateGeometry, WakeMeshError> {
        let mut cur = LineCursor::new(text);

        let header = cur.require("SURFACE_NODE", "SURFACE_NODE section")?;
        let (ni, nj) = parse_dims(header, "SURFACE_NODE header")?;
        check_dims(ni, nj, "SURFACE_NODE")?;
        cur.next_line("SURFACE_NODE column header")?;
        let mut surface = Vec::with_capacity(ni);
        for _ in 0..ni {
            let mut points = Vec::with_capacity(nj);
            for _ in 0..nj {
                let v = parse_floats(cur.next_line("SURFACE_NODE rows")?, 5, "SURFACE_NODE row")?;
                points.push(GridPoint {
                    position: [v[0], v[1], v[2]],
                    normal: [0.0; 3],
                    uv: [v[3], v[4]],
                });
            }
            surface.push(Station {
                points,
                ..Station::default()
            });
        }
        let bounding_box = BoundingBox::from_points(
            surface
                .iter()
                .flat_map(|s| s.points.iter().map(|p| &p.position)),
        );

        let mut stations = match self.kind {
            StationKind::Body => surface,
            StationKind::Wing => read_plate(&mut cur, ni, nj)?,
        };

        let mut wetted_area = None;
        let mut control_surfaces: Vec<ControlSurface> = Vec::new();
        let mut last_subsurf: Option<&str> = None;

        while let Some(line) = cur.next_section(&["STICK_NODE", "POINT", "SUBSURF", "HINGELINE"]) {
            let keyword = line.trim_start();
            if keyword.starts_with("STICK_NODE") {
                read_stick(&mut cur, &mut stations)?;
            } else if keyword.starts_with("POINT") {
                cur.next_line("POINT column header")?;
                let v = parse_floats(cur.next_line("POINT row")?, 4, "POINT row")?;
                wetted_area = Some(v[3]);
            } else if keyword.starts_with("SUBSURF") {
                let duplicate = last_subsurf == Some(line.trim());
                last_subsurf = Some(line.trim());
                let block = read_subsurf(&mut cur, line)?;
                if duplicate {
                    log::warn!(
                        "{}: skipping second definition of control surface {}",
                        self.name,
                        block.short_name
                    );
                } else {
                    control_surfaces.push(block);
                }
            } else {
                read_hinges(&mut cur, line, &mut control_surfaces)?;
            }
        }

        let lifting = self.kind == StationKind::Wing
            && !self.name.to_ascii_uppercase().contains("NOWAKE");

        log::debug!(
            "{}: read {} x {} stations, {} control surfaces, lifting = {lifting}",
            self.name,
            stations.len(),
            stations.first().map_or(0, |s| s.points.len()),
            control_surfaces.len()
        );

        Ok(FlatPlateGeometry {
            name: self.name.clone(),
            grid: StationGrid {
                kind: self.kind,
                stations,
            },
            lifting,
            bounding_box,
            wetted_area,
            control_surfaces,
        })
    }
}

impl GeometryReader for FlatPlateReader {
    type Output = FlatPlateGeometry;

    fn read<R: Read>(&self, mut reader: R) -> Result<FlatPlateGeometry, WakeMeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        self.parse(&contents)
    }
}

fn check_dims(ni: usize, nj: usize, what: &str) -> Result<(), WakeMeshError> {
    if ni < 2 || nj < 2 {
        return Err(WakeMeshError::Format(format!(
            "{what}: need at least 2 x 2 points, got {ni} x {nj}"
        )));
    }
    Ok(())
}

/// Camber-offset plate points and their normals.
fn read_plate(
    cur: &mut LineCursor<'_>,
    surface_ni: usize,
    surface_nj: usize,
) -> Result<Vec<Station>, WakeMeshError> {
    let header = cur.require("PLATE", "PLATE section")?;
    let (ni, nj) = parse_dims(header, "PLATE header")?;
    check_dims(ni, nj, "PLATE")?;
    if ni != surface_ni {
        return Err(WakeMeshError::CountMismatch {
            what: "PLATE station count",
            declared: surface_ni,
            found: ni,
        });
    }
    if nj != surface_nj {
        return Err(WakeMeshError::Format(format!(
            "PLATE has {nj} chordwise points, SURFACE_NODE has {surface_nj}"
        )));
    }

    cur.next_line("PLATE normal header")?;
    let mut plate_normals = Vec::with_capacity(ni);
    for _ in 0..ni {
        let v = parse_floats(cur.next_line("PLATE normals")?, 3, "PLATE normal")?;
        plate_normals.push([v[0], v[1], v[2]]);
    }

    cur.next_line("PLATE column header")?;
    let mut stations = Vec::with_capacity(ni);
    for plate_normal in plate_normals {
        let mut points = Vec::with_capacity(nj);
        for _ in 0..nj {
            let v = parse_floats(cur.next_line("PLATE rows")?, 11, "PLATE row")?;
            let camber = v[3];
            let normal = [v[5], v[6], v[7]];
            points.push(GridPoint {
                position: add([v[0], v[1], v[2]], scale(normal, camber)),
                normal,
                uv: [v[8], v[10]],
            });
        }
        // the edge normals are unreliable; copy them from the first interior row
        points[0].normal = points[1].normal;
        points[nj - 1].normal = points[nj - 2].normal;
        stations.push(Station {
            points,
            plate_normal,
            airfoil: AirfoilSection::default(),
        });
    }
    Ok(stations)
}

fn read_stick(cur: &mut LineCursor<'_>, stations: &mut [Station]) -> Result<(), WakeMeshError> {
    cur.next_line("STICK_NODE column header")?;
    for station in stations.iter_mut() {
        let v = parse_floats(
            cur.next_line("STICK_NODE rows")?,
            STICK_MIN_COLUMNS,
            "STICK_NODE row",
        )?;
        station.airfoil = AirfoilSection {
            thickness_to_chord: v[STICK_TOC],
            max_thickness_location: v[STICK_TLOC],
            radius_to_chord: 0.5 * (v[STICK_RADLE_TOP] + v[STICK_RADLE_BOT]),
        };
    }
    Ok(())
}

fn read_subsurf(cur: &mut LineCursor<'_>, header: &str) -> Result<ControlSurface, WakeMeshError> {
    let fields: Vec<&str> = comma_fields(header).collect();
    let short_name = fields
        .get(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| WakeMeshError::Format(format!("SUBSURF without a name: `{header}`")))?
        .to_string();
    let (type_name, kind, name) = if fields.len() >= 5 {
        let kind = fields[3].parse::<i32>().map_err(|_| {
            WakeMeshError::Format(format!("SUBSURF: invalid type `{}`", fields[3]))
        })?;
        (Some(fields[2].to_string()), Some(kind), fields[4].to_string())
    } else {
        (None, None, short_name.clone())
    };

    let count_line = cur.next_line("SUBSURF node count")?;
    let count = comma_fields(count_line)
        .nth(1)
        .ok_or_else(|| WakeMeshError::Format(format!("SUBSURF: bad node count `{count_line}`")))
        .and_then(|raw| parse_usize(raw, "SUBSURF node count"))?;

    let mut uv_nodes = Vec::with_capacity(count);
    let mut uv_min = [f64::INFINITY; 2];
    let mut uv_max = [f64::NEG_INFINITY; 2];
    for _ in 0..count {
        let v = parse_floats(cur.next_line("SUBSURF nodes")?, 2, "SUBSURF node")?;
        let u = v[0];
        // upper-skin outlines fold onto the lower-skin parameterization
        let w = if v[1] > 2.0 { 4.0 - v[1] } else { v[1] };
        uv_min = [uv_min[0].min(u), uv_min[1].min(w)];
        uv_max = [uv_max[0].max(u), uv_max[1].max(w)];
        uv_nodes.push([u, w]);
    }

    Ok(ControlSurface {
        name,
        short_name,
        type_name,
        kind,
        uv_nodes,
        uv_min,
        uv_max,
        hinge: None,
    })
}

fn read_hinges(
    cur: &mut LineCursor<'_>,
    header: &str,
    control_surfaces: &mut [ControlSurface],
) -> Result<(), WakeMeshError> {
    if let Some(raw) = comma_fields(header).nth(1).filter(|s| !s.is_empty()) {
        let declared = parse_usize(raw, "HINGELINE count")?;
        if declared != control_surfaces.len() {
            return Err(WakeMeshError::CountMismatch {
                what: "HINGELINE",
                declared,
                found: control_surfaces.len(),
            });
        }
    }
    for cs in control_surfaces.iter_mut() {
        let v = parse_floats(cur.next_line("HINGELINE rows")?, 6, "HINGELINE row")?;
        let start = [v[0], v[1], v[2]];
        let end = [v[3], v[4], v[5]];
        let axis = normalize(sub(end, start)).ok_or_else(|| {
            WakeMeshError::InvalidGeometry(format!("zero-length hinge line for {}", cs.name))
        })?;
        cs.hinge = Some(HingeLine { start, end, axis });
    }
    Ok(())
}
