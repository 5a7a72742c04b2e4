// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render materials shared between meshes.
//!
//! Materials are stored once in the scene and referenced from meshes by
//! [`MaterialKey`]. Mutating a material therefore affects every mesh that
//! holds its key; swapping a mesh's key affects only that mesh.

use smallvec::{smallvec, SmallVec};

use crate::keys::MaterialKey;
use crate::plane::ClipPlane;

/// Material keys assigned to a mesh, one per geometry group.
pub type MaterialSlots = SmallVec<[MaterialKey; 1]>;

/// Slots holding a single material.
pub fn single_slot(key: MaterialKey) -> MaterialSlots {
    smallvec![key]
}

/// Which faces a material renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// What a material is used for.
///
/// Substitution features flag the shared materials they create so that a
/// sweep over the scene can tell them apart from a model's own materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialRole {
    /// A material that came with the model.
    #[default]
    Standard,
    /// Selection highlight.
    Highlight,
    /// X-ray/ghost stand-in for de-emphasized geometry.
    Isolation,
}

/// Linear RGB color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    /// Creates a color from a `0xRRGGBB` value.
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as f32 / 255.0,
            g: ((hex >> 8) & 0xFF) as f32 / 255.0,
            b: (hex & 0xFF) as f32 / 255.0,
        }
    }
}

/// Surface material with the clipping and polygon-offset state the viewer
/// engines manipulate.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub role: MaterialRole,
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
    pub side: Side,
    pub depth_write: bool,
    /// Planes clipping this material; `None` when clipping was never set up.
    pub clipping_planes: Option<Vec<ClipPlane>>,
    pub clip_shadows: bool,
    pub polygon_offset: bool,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,
    /// Bumped on every change the renderer has to pick up.
    pub version: u32,
}

impl Material {
    /// Creates an opaque white front-sided material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: MaterialRole::Standard,
            color: Color::WHITE,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
            side: Side::Front,
            depth_write: true,
            clipping_planes: None,
            clip_shadows: false,
            polygon_offset: false,
            polygon_offset_factor: 0.0,
            polygon_offset_units: 0.0,
            version: 0,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the opacity; anything below 1 also turns on transparency.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_depth_write(mut self, depth_write: bool) -> Self {
        self.depth_write = depth_write;
        self
    }

    pub fn with_role(mut self, role: MaterialRole) -> Self {
        self.role = role;
        self
    }

    /// Marks the material as changed.
    #[inline]
    pub fn needs_update(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[inline]
    pub fn is_highlight(&self) -> bool {
        self.role == MaterialRole::Highlight
    }

    #[inline]
    pub fn is_isolation(&self) -> bool {
        self.role == MaterialRole::Isolation
    }
}
