// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Nearest-hit ray casting against the visible meshes of a scene.

use nalgebra::{Point3, Vector3};

use crate::keys::NodeKey;
use crate::ray::Ray;
use crate::scene::Scene;
use crate::traversal::normal_matrix;

/// The nearest surface hit by a ray.
#[derive(Debug, Clone, Copy)]
pub struct SceneHit {
    /// Mesh node that was hit.
    pub node: NodeKey,
    /// Index of the hit triangle in the mesh geometry.
    pub triangle: usize,
    /// World-space distance from the ray origin.
    pub distance: f64,
    /// World-space hit point.
    pub point: Point3<f64>,
    /// Unit face normal in world space, following the triangle winding.
    pub face_normal: Vector3<f64>,
}

impl Scene {
    /// Casts `ray` (world space) against every visible mesh and returns the
    /// nearest hit.
    ///
    /// Each mesh is first tested against its world bounds; triangles are
    /// tested from both sides.
    pub fn raycast(&self, ray: &Ray) -> Option<SceneHit> {
        let mut best: Option<SceneHit> = None;

        for key in self.visible_mesh_nodes() {
            let Some(mesh) = self.node(key).and_then(|n| n.mesh()) else {
                continue;
            };
            let bounds = self.world_bounds(key);
            let Some((t_enter, _)) = ray.intersect_aabb(&bounds) else {
                continue;
            };
            if best.as_ref().is_some_and(|b| t_enter > b.distance) {
                continue;
            }

            let world = self.world_transform(key);
            let Some(normals) = normal_matrix(&world) else {
                continue; // collapsed transform, nothing to hit
            };

            for tri in 0..mesh.geometry.triangle_count() {
                let Some([a, b, c]) = mesh.geometry.triangle(tri) else {
                    continue;
                };
                let (a, b, c) = (
                    world.transform_point(&a),
                    world.transform_point(&b),
                    world.transform_point(&c),
                );
                let Some(t) = ray.intersect_triangle(&a, &b, &c) else {
                    continue;
                };
                if best.as_ref().is_some_and(|h| t >= h.distance) {
                    continue;
                }
                let Some(face_normal) = mesh
                    .geometry
                    .face_normal(tri)
                    .and_then(|n| (normals * n).try_normalize(1e-15))
                else {
                    continue;
                };
                best = Some(SceneHit {
                    node: key,
                    triangle: tri,
                    distance: t,
                    point: ray.at(t),
                    face_normal,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::material::Material;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Rotation3};

    fn scene_with_cubes() -> (Scene, NodeKey, NodeKey) {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::new("m"));
        let near = scene
            .add_mesh(
                scene.root(),
                "near",
                Geometry::cuboid(Point3::new(-1.0, -1.0, 2.0), Point3::new(1.0, 1.0, 3.0)),
                mat,
            )
            .unwrap();
        let far = scene
            .add_mesh(
                scene.root(),
                "far",
                Geometry::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)),
                mat,
            )
            .unwrap();
        (scene, near, far)
    }

    fn down_z() -> Ray {
        // Off the cube face diagonals so the hit is inside a single triangle
        Ray::new(Point3::new(0.1, 0.2, 10.0), -Vector3::z()).unwrap()
    }

    #[test]
    fn nearest_mesh_wins() {
        let (scene, near, _) = scene_with_cubes();
        let hit = scene.raycast(&down_z()).unwrap();
        assert_eq!(hit.node, near);
        assert_relative_eq!(hit.distance, 7.0);
        assert_relative_eq!(hit.point.z, 3.0);
        assert_relative_eq!(hit.face_normal.z, 1.0);
    }

    #[test]
    fn hidden_meshes_are_skipped() {
        let (mut scene, near, far) = scene_with_cubes();
        scene.set_visible(near, false).unwrap();
        let hit = scene.raycast(&down_z()).unwrap();
        assert_eq!(hit.node, far);
        assert_relative_eq!(hit.point.z, 1.0);
    }

    #[test]
    fn miss_returns_none() {
        let (scene, _, _) = scene_with_cubes();
        let ray = Ray::new(Point3::new(5.0, 5.0, 10.0), -Vector3::z()).unwrap();
        assert!(scene.raycast(&ray).is_none());
    }

    #[test]
    fn normal_follows_world_rotation() {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::new("m"));
        // Triangle in the local XY plane, normal +Z
        let geometry = Geometry::new(
            vec![
                Point3::new(-5.0, -5.0, 0.0),
                Point3::new(5.0, -5.0, 0.0),
                Point3::new(0.0, 5.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let mesh = scene.add_mesh(scene.root(), "slab", geometry, mat).unwrap();
        let rotation = Rotation3::from_axis_angle(&Vector3::x_axis(), -std::f64::consts::FRAC_PI_2);
        let world = Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)) * rotation.to_homogeneous();
        scene.set_transform(mesh, world).unwrap();

        let ray = Ray::new(Point3::new(0.0, 10.0, 0.0), -Vector3::y()).unwrap();
        let hit = scene.raycast(&ray).unwrap();
        assert_relative_eq!(hit.point.y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(hit.face_normal.y, 1.0, epsilon = 1e-9);
        assert_relative_eq!(hit.face_normal.z, 0.0, epsilon = 1e-9);
    }
}
