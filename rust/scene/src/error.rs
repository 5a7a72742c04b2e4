// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for scene graph operations.

use crate::keys::{MaterialKey, NodeKey};

/// Result type alias for scene operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying a scene.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A referenced node is not part of the scene.
    #[error("scene node not found: {0:?}")]
    NodeNotFound(NodeKey),

    /// A referenced material is not part of the scene.
    #[error("material not found: {0:?}")]
    MaterialNotFound(MaterialKey),

    /// The node carries no mesh data.
    #[error("scene node is not a mesh: {0:?}")]
    NotAMesh(NodeKey),

    /// Re-parenting would make a node its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { child: NodeKey, parent: NodeKey },

    /// The scene root cannot be re-parented or removed.
    #[error("the scene root cannot be moved or removed")]
    RootImmutable,

    /// A mesh needs at least one material slot.
    #[error("mesh must have at least one material")]
    EmptyMaterialSlots,

    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but only {vertex_count} vertices exist")]
    TriangleIndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    /// The camera's view-projection matrix cannot be inverted.
    #[error("camera projection is singular")]
    SingularProjection,
}
