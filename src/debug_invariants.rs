use crate::mesh_error::WakeMeshError;
use crate::topology::grid::MeshGrid;
use crate::topology::validation::{MeshValidationOptions, validate_mesh};

/// Structural self-checks for mesh containers.
pub trait DebugInvariants {
    /// Panic on a broken invariant, in debug builds or with `strict-invariants`.
    fn debug_assert_invariants(&self);
    /// Run every check and report the first violation.
    fn validate_invariants(&self) -> Result<(), WakeMeshError>;
}

/// Panics with `ctx` and the error when `$expr` fails and checks are enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

impl DebugInvariants for MeshGrid {
    fn debug_assert_invariants(&self) {
        debug_invariants!(self.validate_invariants(), "MeshGrid");
    }

    /// Orientation, incidence and flag consistency of the finest grid.
    fn validate_invariants(&self) -> Result<(), WakeMeshError> {
        validate_mesh(self, MeshValidationOptions::default())
    }
}
