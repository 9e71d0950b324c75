//! Strong index handles for mesh entities.
//!
//! Every node, triangle and edge of a surface mesh lives in a vector owned by
//! [`MeshGrid`](crate::topology::grid::MeshGrid). Adjacency is expressed with
//! these zero-based handles instead of references, so the whole mesh can be
//! shared read-only across threads and serialized as plain integers.
//!
//! This module provides:
//! - `NodeId`, `TriId` and `EdgeId`: `repr(transparent)` wrappers around `u32`.
//! - `PatchId` and `ComponentId`: 1-based identifiers carried over from the
//!   source files.
//! - `Debug` printing as `NodeId(3)` and `Display` printing the raw index.

use std::fmt;

macro_rules! index_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
        )]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a zero-based index.
            ///
            /// # Panics
            ///
            /// Panics if `index` does not fit in `u32`; meshes beyond four
            /// billion entities are not supported.
            #[inline]
            pub fn new(index: usize) -> Self {
                $name(u32::try_from(index).expect(concat!(stringify!($name), " index overflow")))
            }

            /// The index into the owning vector.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

index_handle!(
    /// Handle of a mesh node.
    NodeId
);
index_handle!(
    /// Handle of a triangle.
    TriId
);
index_handle!(
    /// Handle of a unique (undirected) mesh edge.
    EdgeId
);

/// Dense, 1-based surface patch id assigned in first-seen order.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PatchId(pub u32);

/// 1-based component id; wake chains never cross a component boundary.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct ComponentId(pub u32);

impl fmt::Display for PatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
