// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Clipping planes in Hessian normal form.

use nalgebra::{Point3, Vector3};

/// A plane `normal · p + constant = 0` with a unit-length normal.
///
/// When attached to a material, geometry on the positive side of the plane
/// (the side the normal points to) is clipped away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub normal: Vector3<f64>,
    pub constant: f64,
}

impl ClipPlane {
    /// Creates a plane from an already normalized normal and its constant.
    pub fn new(normal: Vector3<f64>, constant: f64) -> Self {
        Self { normal, constant }
    }

    /// Creates a plane through `point` with the given normal.
    ///
    /// The normal is normalized; returns `None` for a zero-length normal.
    pub fn from_normal_and_point(normal: &Vector3<f64>, point: &Point3<f64>) -> Option<Self> {
        let unit = normal.try_normalize(1e-12)?;
        Some(Self::from_unit_normal_and_point(&unit, point))
    }

    /// Creates a plane through `point`, trusting `normal` to be unit length.
    ///
    /// The normal is stored as given, so callers that keep their own copy of
    /// the normal see exactly the same vector on the plane.
    pub fn from_unit_normal_and_point(normal: &Vector3<f64>, point: &Point3<f64>) -> Self {
        Self {
            normal: *normal,
            constant: -normal.dot(&point.coords),
        }
    }

    /// Signed distance from `point` to the plane.
    #[inline]
    pub fn distance_to_point(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) + self.constant
    }

    /// The point of the plane closest to the origin.
    pub fn coplanar_point(&self) -> Point3<f64> {
        Point3::from(self.normal * -self.constant)
    }

    /// Whether `point` is removed by this plane.
    #[inline]
    pub fn clips(&self, point: &Point3<f64>) -> bool {
        self.distance_to_point(point) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plane_through_point() {
        let plane = ClipPlane::from_normal_and_point(
            &Vector3::new(0.0, 0.0, 2.0),
            &Point3::new(3.0, -1.0, 4.0),
        )
        .unwrap();

        assert_relative_eq!(plane.normal.z, 1.0);
        assert_relative_eq!(plane.constant, -4.0);
        assert_relative_eq!(plane.distance_to_point(&Point3::new(0.0, 0.0, 4.0)), 0.0);
        assert_relative_eq!(plane.distance_to_point(&Point3::new(0.0, 0.0, 6.0)), 2.0);
    }

    #[test]
    fn zero_normal_rejected() {
        assert!(ClipPlane::from_normal_and_point(&Vector3::zeros(), &Point3::origin()).is_none());
    }

    #[test]
    fn coplanar_point_lies_on_plane() {
        let plane = ClipPlane::from_normal_and_point(
            &Vector3::new(1.0, 1.0, 0.0),
            &Point3::new(2.0, 0.0, 5.0),
        )
        .unwrap();
        assert_relative_eq!(plane.distance_to_point(&plane.coplanar_point()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn positive_side_is_clipped() {
        let plane = ClipPlane::new(Vector3::y(), 0.0);
        assert!(plane.clips(&Point3::new(0.0, 1.0, 0.0)));
        assert!(!plane.clips(&Point3::new(0.0, -1.0, 0.0)));
    }
}
