// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Indexed triangle geometry in a mesh's local space.

use nalgebra::{Point3, Vector3};

use crate::bounds::Aabb;
use crate::error::{Error, Result};

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    positions: Vec<Point3<f64>>,
    triangles: Vec<[u32; 3]>,
    bounds: Aabb,
}

impl Geometry {
    /// Creates geometry, checking that every triangle references an existing vertex.
    pub fn new(positions: Vec<Point3<f64>>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        for (i, tri) in triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&idx| idx as usize >= positions.len()) {
                return Err(Error::TriangleIndexOutOfRange {
                    triangle: i,
                    index: bad,
                    vertex_count: positions.len(),
                });
            }
        }
        let bounds = Aabb::from_points(&positions);
        Ok(Self {
            positions,
            triangles,
            bounds,
        })
    }

    /// Axis-aligned box between `min` and `max`, wound counter-clockwise
    /// when seen from outside.
    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> Self {
        let positions: Vec<Point3<f64>> = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { min.x } else { max.x },
                    if i & 2 == 0 { min.y } else { max.y },
                    if i & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();
        let triangles = vec![
            [1, 3, 7], [1, 7, 5], // +X
            [0, 6, 2], [0, 4, 6], // -X
            [2, 6, 7], [2, 7, 3], // +Y
            [0, 1, 5], [0, 5, 4], // -Y
            [4, 5, 7], [4, 7, 6], // +Z
            [0, 2, 3], [0, 3, 1], // -Z
        ];
        let bounds = Aabb::from_points(&positions);
        Self {
            positions,
            triangles,
            bounds,
        }
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounds in local space, computed once at construction.
    pub fn local_bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// The three corners of triangle `index`.
    pub fn triangle(&self, index: usize) -> Option<[Point3<f64>; 3]> {
        let [a, b, c] = *self.triangles.get(index)?;
        Some([
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ])
    }

    /// Unnormalized face normal of triangle `index`, following the
    /// right-hand rule on its winding.
    pub fn face_normal(&self, index: usize) -> Option<Vector3<f64>> {
        let [v0, v1, v2] = self.triangle(index)?;
        Some((v1 - v0).cross(&(v2 - v0)))
    }
}
