//! Raw triangulation reader.
//!
//! # Supported format
//! Whitespace-separated tokens, node indices 1-based:
//!
//! ```text
//! <NumNodes> <NumTris>
//! x y z                      (NumNodes rows)
//! n1 n2 n3                   (NumTris rows)
//! surfaceId                  (NumTris rows)
//! ```
//!
//! The extended variant carries parametric coordinates and explicit Kutta
//! node lists:
//!
//! ```text
//! surfaceId u1 v1 u2 v2 u3 v3            (NumTris rows)
//! <NumLists>
//! <NumNodesInList> i1 i2 ...             (NumLists times)
//! ```

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::io::GeometryReader;
use crate::io::text::Tokens;
use crate::mesh_error::WakeMeshError;

/// Triangles with surface ids, converted to zero-based indices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Triangulation {
    pub positions: Vec<[f64; 3]>,
    pub triangles: Vec<[usize; 3]>,
    /// Raw surface id of every triangle as written in the file.
    pub surface_ids: Vec<i64>,
    /// Per-corner `(u, v)`; present only in the extended variant.
    pub uv: Option<Vec<[[f64; 2]; 3]>>,
    /// Zero-based explicit Kutta node lists.
    pub kutta_lists: Vec<Vec<usize>>,
}

impl Triangulation {
    /// All listed Kutta nodes, deduplicated and sorted.
    pub fn kutta_nodes(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self.kutta_lists.iter().flatten().copied().collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}

/// Reader for the plain and extended triangulation formats.
#[derive(Debug, Default, Clone)]
pub struct TriReader {
    pub extended: bool,
}

impl TriReader {
    pub fn plain() -> Self {
        TriReader { extended: false }
    }

    pub fn extended() -> Self {
        TriReader { extended: true }
    }

    fn node_index(raw: usize, count: usize) -> Result<usize, WakeMeshError> {
        if raw == 0 || raw > count {
            return Err(WakeMeshError::NodeIndexOutOfRange { index: raw, count });
        }
        Ok(raw - 1)
    }

    pub fn parse(&self, text: &str) -> Result<Triangulation, WakeMeshError> {
        let mut tok = Tokens::new(text);
        let num_nodes = tok.next_usize("node count")?;
        let num_tris = tok.next_usize("triangle count")?;

        let mut positions = Vec::with_capacity(num_nodes);
        for _ in 0..num_nodes {
            positions.push([
                tok.next_f64("node x")?,
                tok.next_f64("node y")?,
                tok.next_f64("node z")?,
            ]);
        }

        let mut triangles = Vec::with_capacity(num_tris);
        for t in 0..num_tris {
            let mut tri = [0usize; 3];
            for slot in &mut tri {
                *slot = Self::node_index(tok.next_usize("triangle node")?, num_nodes)?;
            }
            if tri[0] == tri[1] || tri[0] == tri[2] {
                return Err(WakeMeshError::DegenerateTriangle { tri: t, node: tri[0] });
            }
            if tri[1] == tri[2] {
                return Err(WakeMeshError::DegenerateTriangle { tri: t, node: tri[1] });
            }
            triangles.push(tri);
        }

        let mut surface_ids = Vec::with_capacity(num_tris);
        let mut uv = self.extended.then(|| Vec::with_capacity(num_tris));
        for _ in 0..num_tris {
            surface_ids.push(tok.next_i64("surface id")?);
            if let Some(uv) = uv.as_mut() {
                let mut corners = [[0.0; 2]; 3];
                for corner in &mut corners {
                    *corner = [tok.next_f64("corner u")?, tok.next_f64("corner v")?];
                }
                uv.push(corners);
            }
        }

        let mut kutta_lists = Vec::new();
        if self.extended && !tok.is_exhausted() {
            let num_lists = tok.next_usize("Kutta list count")?;
            for _ in 0..num_lists {
                let len = tok.next_usize("Kutta list length")?;
                let list = (0..len)
                    .map(|_| Self::node_index(tok.next_usize("Kutta node")?, num_nodes))
                    .collect::<Result<Vec<_>, _>>()?;
                kutta_lists.push(list);
            }
        }

        if !tok.is_exhausted() {
            log::warn!("Ignoring trailing data after the triangulation");
        }

        log::debug!(
            "Read triangulation: {num_nodes} nodes, {num_tris} triangles, {} Kutta lists",
            kutta_lists.len()
        );

        Ok(Triangulation {
            positions,
            triangles,
            surface_ids,
            uv,
            kutta_lists,
        })
    }
}

impl GeometryReader for TriReader {
    type Output = Triangulation;

    fn read<R: Read>(&self, mut reader: R) -> Result<Triangulation, WakeMeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        self.parse(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRIS: &str = "4 2\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n1 2 3\n1 3 4\n7\n3\n";

    #[test]
    fn reads_plain_file() {
        let tri = TriReader::plain().read(TWO_TRIS.as_bytes()).unwrap();
        assert_eq!(tri.positions.len(), 4);
        assert_eq!(tri.triangles, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(tri.surface_ids, vec![7, 3]);
        assert!(tri.uv.is_none());
        assert!(tri.kutta_lists.is_empty());
    }

    #[test]
    fn reads_extended_file_with_kutta_lists() {
        let text = "4 2\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n1 2 3\n1 3 4\n\
                    1 0 0 1 0 1 1\n1 0 0 1 1 0 1\n2\n2 2 3\n1 3\n";
        let tri = TriReader::extended().parse(text).unwrap();
        assert_eq!(tri.uv.as_ref().unwrap()[1], [[0.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        assert_eq!(tri.kutta_lists, vec![vec![1, 2], vec![2]]);
        assert_eq!(tri.kutta_nodes(), vec![1, 2]);
    }

    #[test]
    fn repeated_node_is_fatal() {
        let text = TWO_TRIS.replace("1 3 4", "1 3 3");
        let err = TriReader::plain().parse(&text).expect_err("degenerate");
        assert!(matches!(err, WakeMeshError::DegenerateTriangle { tri: 1, node: 2 }));
    }

    #[test]
    fn index_out_of_range() {
        let text = TWO_TRIS.replace("1 3 4", "1 3 5");
        let err = TriReader::plain().parse(&text).expect_err("range");
        assert!(matches!(
            err,
            WakeMeshError::NodeIndexOutOfRange { index: 5, count: 4 }
        ));
    }

    #[test]
    fn truncated_surface_ids() {
        let err = TriReader::plain()
            .parse("4 2\n0 0 0\n1 0 0\n1 1 0\n0 1 0\n1 2 3\n1 3 4\n7\n")
            .expect_err("truncated");
        assert!(matches!(err, WakeMeshError::UnexpectedEof("surface id")));
    }
}
