// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rays and the primitive intersection tests used for picking.

use nalgebra::{Point3, Vector3};

use crate::bounds::Aabb;

/// A ray with a unit-length direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Creates a ray; the direction is normalized. Returns `None` for a
    /// zero-length direction.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let direction = direction.try_normalize(1e-15)?;
        Some(Self { origin, direction })
    }

    /// Evaluates the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Ray-box test using the slab method.
    ///
    /// Returns `(t_enter, t_exit)` with `t_enter` clamped to 0 when the origin
    /// is inside the box. Division by a zero direction component yields
    /// infinities, which the min/max chain handles.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<(f64, f64)> {
        if aabb.is_empty() {
            return None;
        }
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;

        for axis in 0..3 {
            let inv = 1.0 / self.direction[axis];
            let t1 = (aabb.min[axis] - self.origin[axis]) * inv;
            let t2 = (aabb.max[axis] - self.origin[axis]) * inv;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }

    /// Möller-Trumbore ray-triangle intersection, accepting hits on either
    /// side of the triangle.
    ///
    /// Returns the ray parameter of the hit.
    pub fn intersect_triangle(
        &self,
        v0: &Point3<f64>,
        v1: &Point3<f64>,
        v2: &Point3<f64>,
    ) -> Option<f64> {
        const EPSILON: f64 = 1e-12;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let h = self.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Ray parallel to the triangle plane
        if a.abs() < EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = self.origin - v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = f * self.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(&q);
        (t > EPSILON).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn ray_at() {
        let ray = Ray::new(Point3::origin(), Vector3::new(2.0, 0.0, 0.0)).unwrap();
        assert_relative_eq!(ray.at(5.0).x, 5.0);
    }

    #[test]
    fn zero_direction_rejected() {
        assert!(Ray::new(Point3::origin(), Vector3::zeros()).is_none());
    }

    #[test]
    fn slab_hit_and_miss() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), -Vector3::z()).unwrap();
        let (t0, t1) = ray.intersect_aabb(&unit_box()).unwrap();
        assert_relative_eq!(t0, 9.0);
        assert_relative_eq!(t1, 11.0);

        let away = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::z()).unwrap();
        assert!(away.intersect_aabb(&unit_box()).is_none());

        let beside = Ray::new(Point3::new(5.0, 0.0, 10.0), -Vector3::z()).unwrap();
        assert!(beside.intersect_aabb(&unit_box()).is_none());
    }

    #[test]
    fn slab_from_inside() {
        let ray = Ray::new(Point3::origin(), Vector3::x()).unwrap();
        let (t0, t1) = ray.intersect_aabb(&unit_box()).unwrap();
        assert_eq!(t0, 0.0);
        assert_relative_eq!(t1, 1.0);
    }

    #[test]
    fn triangle_hit_from_both_sides() {
        let v0 = Point3::new(-1.0, -1.0, 0.0);
        let v1 = Point3::new(1.0, -1.0, 0.0);
        let v2 = Point3::new(0.0, 1.0, 0.0);

        let front = Ray::new(Point3::new(0.0, 0.0, 3.0), -Vector3::z()).unwrap();
        assert_relative_eq!(front.intersect_triangle(&v0, &v1, &v2).unwrap(), 3.0);

        let back = Ray::new(Point3::new(0.0, 0.0, -2.0), Vector3::z()).unwrap();
        assert_relative_eq!(back.intersect_triangle(&v0, &v1, &v2).unwrap(), 2.0);
    }

    #[test]
    fn triangle_miss() {
        let v0 = Point3::new(-1.0, -1.0, 0.0);
        let v1 = Point3::new(1.0, -1.0, 0.0);
        let v2 = Point3::new(0.0, 1.0, 0.0);

        let outside = Ray::new(Point3::new(3.0, 0.0, 3.0), -Vector3::z()).unwrap();
        assert!(outside.intersect_triangle(&v0, &v1, &v2).is_none());

        let behind = Ray::new(Point3::new(0.0, 0.0, 3.0), Vector3::z()).unwrap();
        assert!(behind.intersect_triangle(&v0, &v1, &v2).is_none());

        let parallel = Ray::new(Point3::new(0.0, 0.0, 1.0), Vector3::x()).unwrap();
        assert!(parallel.intersect_triangle(&v0, &v1, &v2).is_none());
    }
}
