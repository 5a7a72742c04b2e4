// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BimView Scene
//!
//! Scene graph and picking math for the BIM viewer engine.
//!
//! Nodes and materials live in slot maps inside a [`Scene`] and are addressed
//! by generational keys. Meshes reference materials by [`MaterialKey`], so a
//! material may be shared by many meshes and its key is its identity. The
//! crate also provides the geometric primitives the viewer engines build on:
//! bounding boxes, clipping planes, rays and a perspective [`Camera`].

pub mod bounds;
pub mod camera;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod keys;
pub mod material;
pub mod plane;
pub mod ray;
pub mod raycast;
pub mod renderer;
pub mod scene;
pub mod traversal;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, UnitQuaternion, Vector3};

pub use bounds::Aabb;
pub use camera::{world_up, Camera, OrbitControls, Viewport};
pub use error::{Error, Result};
pub use geometry::Geometry;
pub use hierarchy::Hierarchy;
pub use keys::{MaterialKey, NodeKey};
pub use material::{single_slot, Color, Material, MaterialRole, MaterialSlots, Side};
pub use plane::ClipPlane;
pub use ray::Ray;
pub use raycast::SceneHit;
pub use renderer::Renderer;
pub use scene::{Attributes, MeshData, Scene, SceneNode};
