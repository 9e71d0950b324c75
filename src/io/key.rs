//! Surface-id key files and dense patch numbering.
//!
//! A key file maps the raw surface ids of a triangulation to names and
//! component ids:
//!
//! ```text
//! # comment lines start with '#'
//! <N>
//! id,name                     (component id = line ordinal)
//! id,compId,group,name        (component id = compId + 1)
//! ```

use std::collections::HashMap;
use std::io::Read;

use crate::io::GeometryReader;
use crate::io::text::{comma_fields, parse_usize};
use crate::mesh_error::WakeMeshError;
use crate::topology::entity::{BoundaryCondition, PatchInfo};
use crate::topology::handle::{ComponentId, PatchId};

#[derive(Clone, Debug, PartialEq)]
pub struct KeyEntry {
    pub surface_id: i64,
    pub name: String,
    pub component: ComponentId,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyFile {
    pub entries: Vec<KeyEntry>,
}

#[derive(Debug, Default, Clone)]
pub struct KeyFileReader;

impl KeyFileReader {
    pub fn parse(&self, text: &str) -> Result<KeyFile, WakeMeshError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        let declared = parse_usize(
            lines.next().ok_or(WakeMeshError::UnexpectedEof("key file count"))?,
            "key file count",
        )?;

        let mut entries = Vec::with_capacity(declared);
        for ordinal in 1..=declared {
            let line = lines.next().ok_or_else(|| {
                WakeMeshError::Format(format!(
                    "key file declares {declared} entries but ends after {}",
                    ordinal - 1
                ))
            })?;
            let fields: Vec<&str> = comma_fields(line).collect();
            let surface_id = fields[0]
                .parse::<i64>()
                .map_err(|_| WakeMeshError::Format(format!("key file: invalid id in `{line}`")))?;
            let (name, component) = match fields.len() {
                2 => (fields[1], one_based(ordinal - 1, "key file ordinal")?),
                n if n >= 4 => {
                    let comp = parse_usize(fields[1], "key file component")?;
                    (fields[3], one_based(comp, "key file component")?)
                }
                _ => {
                    return Err(WakeMeshError::Format(format!(
                        "key file: expected `id,name` or `id,compId,group,name`, got `{line}`"
                    )));
                }
            };
            entries.push(KeyEntry {
                surface_id,
                name: name.to_string(),
                component: ComponentId(component),
            });
        }
        Ok(KeyFile { entries })
    }
}

impl GeometryReader for KeyFileReader {
    type Output = KeyFile;

    fn read<R: Read>(&self, mut reader: R) -> Result<KeyFile, WakeMeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        self.parse(&contents)
    }
}

/// Dense patches resolved from raw surface ids.
#[derive(Clone, Debug, PartialEq)]
pub struct PatchTable {
    /// Patch of every triangle.
    pub triangle_patches: Vec<PatchId>,
    pub patches: Vec<PatchInfo>,
}

impl PatchTable {
    pub fn component_of(&self, patch: PatchId) -> ComponentId {
        self.patches[patch.0 as usize - 1].component
    }
}

/// `value + 1` as a 1-based `u32` id.
fn one_based(value: usize, what: &str) -> Result<u32, WakeMeshError> {
    u32::try_from(value)
        .ok()
        .and_then(|v| v.checked_add(1))
        .ok_or_else(|| WakeMeshError::Format(format!("{what} {value} does not fit a 32-bit id")))
}

/// Renumber raw surface ids densely in first-seen order and attach names and
/// components from the key file, if any.
///
/// Without a key, patch `k` is named `Surface_k` and is its own component.
pub fn resolve_patches(
    surface_ids: &[i64],
    key: Option<&KeyFile>,
) -> Result<PatchTable, WakeMeshError> {
    let mut dense: HashMap<i64, PatchId> = HashMap::new();
    let mut first_seen: Vec<(i64, PatchId)> = Vec::new();
    let mut triangle_patches = Vec::with_capacity(surface_ids.len());
    for &id in surface_ids {
        let patch = match dense.get(&id) {
            Some(&patch) => patch,
            None => {
                let patch = PatchId(one_based(first_seen.len(), "patch count")?);
                first_seen.push((id, patch));
                dense.insert(id, patch);
                patch
            }
        };
        triangle_patches.push(patch);
    }

    let patches = match key {
        None => first_seen
            .iter()
            .map(|&(_, patch)| PatchInfo {
                id: patch,
                name: format!("Surface_{}", patch.0),
                boundary_condition: BoundaryCondition::default(),
                component: ComponentId(patch.0),
            })
            .collect(),
        Some(key) => {
            let used = key
                .entries
                .iter()
                .filter(|e| dense.contains_key(&e.surface_id))
                .count();
            if used != first_seen.len() {
                return Err(WakeMeshError::CountMismatch {
                    what: "key file surfaces used by the triangulation",
                    declared: used,
                    found: first_seen.len(),
                });
            }
            first_seen
                .iter()
                .map(|&(id, patch)| {
                    let entry = key
                        .entries
                        .iter()
                        .find(|e| e.surface_id == id)
                        .ok_or(WakeMeshError::UnknownSurfaceId(id))?;
                    Ok(PatchInfo {
                        id: patch,
                        name: entry.name.clone(),
                        boundary_condition: BoundaryCondition::default(),
                        component: entry.component,
                    })
                })
                .collect::<Result<Vec<_>, WakeMeshError>>()?
        }
    };

    Ok(PatchTable {
        triangle_patches,
        patches,
    })
}
