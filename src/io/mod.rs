//! Geometry readers and the single tagged ingestion entry point.
//!
//! Each input format has its own reader implementing [`GeometryReader`];
//! [`GeometrySource::read`] dispatches on the format variant and yields a
//! [`GeometryInput`] consumed by the shared mesh-building code.

pub mod flat_plate;
pub mod key;
pub(crate) mod text;
pub mod tri;

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::geometry::metrics::BoundingBox;
use crate::mesh_error::WakeMeshError;
use flat_plate::{FlatPlateGeometry, FlatPlateReader};
use key::{KeyFileReader, PatchTable, resolve_patches};
use tri::{TriReader, Triangulation};

/// Trait for readers turning a byte stream into parsed geometry.
pub trait GeometryReader {
    /// Parsed representation produced by the reader.
    type Output;

    /// Parse geometry from a reader.
    fn read<R: Read>(&self, reader: R) -> Result<Self::Output, WakeMeshError>;
}

/// One geometry component in one of the supported input formats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeometrySource {
    FlatPlateWing {
        name: String,
        text: String,
    },
    FlatPlateBody {
        name: String,
        text: String,
    },
    RawTriangulation {
        text: String,
        key: Option<String>,
        /// 1-based node indices of caller-identified sharp nodes.
        sharp_nodes: Option<Vec<usize>>,
    },
    ExtendedTriangulation {
        text: String,
        key: Option<String>,
    },
}

impl GeometrySource {
    /// Component name used in logs and on the finished surface.
    pub fn name(&self) -> &str {
        match self {
            GeometrySource::FlatPlateWing { name, .. } | GeometrySource::FlatPlateBody { name, .. } => {
                name
            }
            GeometrySource::RawTriangulation { .. } | GeometrySource::ExtendedTriangulation { .. } => {
                "Triangulation"
            }
        }
    }

    /// Parse the source into structured stations or a triangle soup.
    pub fn read(&self) -> Result<GeometryInput, WakeMeshError> {
        match self {
            GeometrySource::FlatPlateWing { name, text } => Ok(GeometryInput::Structured(
                FlatPlateReader::wing(name.as_str()).read(text.as_bytes())?,
            )),
            GeometrySource::FlatPlateBody { name, text } => Ok(GeometryInput::Structured(
                FlatPlateReader::body(name.as_str()).read(text.as_bytes())?,
            )),
            GeometrySource::RawTriangulation {
                text,
                key,
                sharp_nodes,
            } => {
                let tri = TriReader::plain().read(text.as_bytes())?;
                let sharp = match sharp_nodes {
                    Some(list) => Some(one_based_to_zero(list, tri.positions.len())?),
                    None => None,
                };
                TriangleSoup::new(tri, key.as_deref(), sharp).map(GeometryInput::Unstructured)
            }
            GeometrySource::ExtendedTriangulation { text, key } => {
                let tri = TriReader::extended().read(text.as_bytes())?;
                let sharp = (!tri.kutta_lists.is_empty()).then(|| tri.kutta_nodes());
                TriangleSoup::new(tri, key.as_deref(), sharp).map(GeometryInput::Unstructured)
            }
        }
    }
}

fn one_based_to_zero(list: &[usize], count: usize) -> Result<Vec<usize>, WakeMeshError> {
    list.iter()
        .map(|&raw| {
            if raw == 0 || raw > count {
                Err(WakeMeshError::NodeIndexOutOfRange { index: raw, count })
            } else {
                Ok(raw - 1)
            }
        })
        .collect()
}

/// Parsed geometry, ready for mesh construction.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryInput {
    Structured(FlatPlateGeometry),
    Unstructured(TriangleSoup),
}

/// A raw triangulation with resolved patches and parametric coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleSoup {
    pub triangulation: Triangulation,
    pub patches: PatchTable,
    /// Per-corner `(u, v)`, read or synthesized.
    pub corner_uv: Vec<[[f64; 2]; 3]>,
    /// Zero-based explicit sharp nodes, sorted and unique.
    pub sharp_nodes: Option<Vec<usize>>,
}

impl TriangleSoup {
    pub fn new(
        mut triangulation: Triangulation,
        key: Option<&str>,
        sharp_nodes: Option<Vec<usize>>,
    ) -> Result<Self, WakeMeshError> {
        let key = key.map(|k| KeyFileReader.parse(k)).transpose()?;
        let patches = resolve_patches(&triangulation.surface_ids, key.as_ref())?;
        let corner_uv = match triangulation.uv.take() {
            Some(uv) => uv,
            None => synthesize_uv(&triangulation, &patches),
        };
        let sharp_nodes = sharp_nodes.map(|mut list| {
            list.sort_unstable();
            list.dedup();
            list
        });
        log::debug!(
            "Resolved {} patches over {} triangles",
            patches.patches.len(),
            triangulation.triangles.len()
        );
        Ok(TriangleSoup {
            triangulation,
            patches,
            corner_uv,
            sharp_nodes,
        })
    }
}

/// Per-patch parametric coordinates for files that carry none: `u` runs
/// along y when the patch is wider in y than in z, otherwise along z.
fn synthesize_uv(tri: &Triangulation, patches: &PatchTable) -> Vec<[[f64; 2]; 3]> {
    let mut boxes: Vec<Option<BoundingBox>> = vec![None; patches.patches.len()];
    for (corners, patch) in tri.triangles.iter().zip(&patches.triangle_patches) {
        let slot = &mut boxes[patch.0 as usize - 1];
        for &n in corners {
            let p = tri.positions[n];
            *slot = Some(match slot.take() {
                Some(b) => b.including(p),
                None => BoundingBox { min: p, max: p },
            });
        }
    }

    tri.triangles
        .iter()
        .zip(&patches.triangle_patches)
        .map(|(corners, patch)| {
            let along_y = boxes[patch.0 as usize - 1]
                .as_ref()
                .is_some_and(|b| b.extent()[1] > b.extent()[2]);
            corners.map(|n| {
                let p = tri.positions[n];
                [if along_y { p[1] } else { p[2] }, 0.0]
            })
        })
        .collect()
}
