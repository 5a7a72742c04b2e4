// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Perspective camera, orbit target and viewport-to-ray conversion.
//!
//! The camera follows the usual right-handed, Y-up convention: in its local
//! frame it looks down -Z with +Y up.

use nalgebra::{Isometry3, Matrix4, Perspective3, Point2, Point3, Translation3, UnitQuaternion, Vector3};

use crate::error::{Error, Result};
use crate::ray::Ray;

/// The model's vertical axis.
#[inline]
pub fn world_up() -> Vector3<f64> {
    Vector3::y()
}

/// Perspective camera with a quaternion orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
    /// Preferred up direction used by [`Camera::look_at`].
    pub up: Vector3<f64>,
    pub fov_y_degrees: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Camera {
    /// Creates a camera at the origin looking down -Z.
    pub fn perspective(fov_y_degrees: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self {
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            up: world_up(),
            fov_y_degrees,
            aspect,
            near,
            far,
        }
    }

    pub fn with_position(mut self, position: Point3<f64>) -> Self {
        self.position = position;
        self
    }

    /// Turns the camera toward `target`, keeping [`Camera::up`] as close to
    /// screen-up as possible. When the view is parallel to `up`, another
    /// axis stands in for it.
    pub fn look_at(&mut self, target: &Point3<f64>) {
        let back = self.position - target;
        if back.norm_squared() < 1e-24 {
            return;
        }
        let up = if back.cross(&self.up).norm_squared() <= 1e-12 * back.norm_squared() {
            fallback_up(&self.up)
        } else {
            self.up
        };
        self.orientation = UnitQuaternion::face_towards(&back, &up);
    }

    /// Unit vector the camera looks along.
    pub fn view_direction(&self) -> Vector3<f64> {
        self.orientation * -Vector3::z()
    }

    /// Unit vector pointing to the top of the screen.
    pub fn screen_up(&self) -> Vector3<f64> {
        self.orientation * Vector3::y()
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Matrix4<f64> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.orientation)
            .inverse()
            .to_homogeneous()
    }

    /// Camera-to-clip transform.
    pub fn projection_matrix(&self) -> Result<Matrix4<f64>> {
        if self.aspect.abs() <= f64::EPSILON || (self.far - self.near).abs() <= f64::EPSILON {
            return Err(Error::SingularProjection);
        }
        Ok(Perspective3::new(self.aspect, self.fov_y_degrees.to_radians(), self.near, self.far)
            .to_homogeneous())
    }

    /// Ray from the camera through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: &Point2<f64>) -> Result<Ray> {
        let view_projection = self.projection_matrix()? * self.view_matrix();
        let inverse = view_projection
            .try_inverse()
            .ok_or(Error::SingularProjection)?;
        let through = inverse.transform_point(&Point3::new(ndc.x, ndc.y, 0.5));
        Ray::new(self.position, through - self.position).ok_or(Error::SingularProjection)
    }
}

fn fallback_up(up: &Vector3<f64>) -> Vector3<f64> {
    if up.z.abs() < 0.9 {
        Vector3::z()
    } else {
        Vector3::x()
    }
}

/// Screen rectangle the scene is drawn into, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Converts a pixel position to normalized device coordinates
    /// (x left to right, y bottom to top, both in `[-1, 1]`).
    pub fn to_ndc(&self, x: f64, y: f64) -> Option<Point2<f64>> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Point2::new(
            (x - self.left) / self.width * 2.0 - 1.0,
            -((y - self.top) / self.height) * 2.0 + 1.0,
        ))
    }
}

/// Orbit controller state: the point the camera circles and looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f64>,
    pub enabled: bool,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}

impl OrbitControls {
    pub fn new(target: Point3<f64>) -> Self {
        Self {
            target,
            enabled: true,
        }
    }

    /// Points `camera` at the orbit target.
    pub fn update(&self, camera: &mut Camera) {
        camera.look_at(&self.target);
    }
}
