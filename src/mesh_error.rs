//! WakeMeshError: unified error type for wake-mesh public APIs
//!
//! Every stage of the surface pipeline returns this error instead of aborting,
//! so the caller owns the decision to terminate. A [`crate::surface::Surface`]
//! is only ever produced when all stages succeed.

use thiserror::Error;

/// Unified error type for wake-mesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WakeMeshError {
    /// Malformed input: unparsable number, unknown keyword layout, bad dimensions.
    #[error("Format error: {0}")]
    Format(String),
    /// The input stream ended inside a section.
    #[error("Format error: unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),
    /// Reading the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(String),
    /// Declared and discovered counts disagree (key file vs. triangulation, hinge lines vs. control surfaces).
    #[error("Configuration mismatch: {what} declares {declared} but {found} were found")]
    CountMismatch {
        what: &'static str,
        declared: usize,
        found: usize,
    },
    /// A surface id referenced by the geometry has no entry in the key file.
    #[error("Configuration mismatch: surface id {0} is not listed in the key file")]
    UnknownSurfaceId(i64),
    /// A triangle references the same node twice.
    #[error("Topology error: triangle {tri} repeats node {node}")]
    DegenerateTriangle { tri: usize, node: usize },
    /// A node index lies outside the node array.
    #[error("Topology error: node index {index} out of range (node count {count})")]
    NodeIndexOutOfRange { index: usize, count: usize },
    /// More than two triangles share one edge.
    #[error("Topology error: edge ({a}, {b}) is shared by {triangles} triangles")]
    NonManifoldEdge { a: usize, b: usize, triangles: usize },
    /// Any other topological inconsistency that cannot be repaired locally.
    #[error("Topology error: {0}")]
    Topology(String),
    /// Geometry that cannot be meshed (zero-length normals, collapsed stations).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl From<std::io::Error> for WakeMeshError {
    fn from(err: std::io::Error) -> Self {
        WakeMeshError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: WakeMeshError =
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into();
        assert!(matches!(err, WakeMeshError::Io(ref msg) if msg.contains("short read")));
    }

    #[test]
    fn count_mismatch_message_names_both_counts() {
        let err = WakeMeshError::CountMismatch {
            what: "key file",
            declared: 3,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "Configuration mismatch: key file declares 3 but 2 were found"
        );
    }
}
