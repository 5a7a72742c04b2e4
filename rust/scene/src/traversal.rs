// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Walking the scene tree: ancestors, descendants, inherited visibility,
//! world transforms and world-space bounds.

use nalgebra::{Matrix3, Matrix4};

use crate::bounds::Aabb;
use crate::keys::NodeKey;
use crate::scene::Scene;

/// Iterator over the ancestors of a node, nearest first, ending at the root.
pub struct Ancestors<'a> {
    scene: &'a Scene,
    next: Option<NodeKey>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let current = self.next?;
        self.next = self.scene.parent(current);
        Some(current)
    }
}

impl Scene {
    /// Ancestors of `key`, nearest first. The node itself is not included.
    pub fn ancestors(&self, key: NodeKey) -> Ancestors<'_> {
        Ancestors {
            scene: self,
            next: self.parent(key),
        }
    }

    /// `key` and everything below it, in depth-first pre-order.
    pub fn descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.traverse(key, |k| out.push(k));
        out
    }

    /// Depth-first pre-order walk from `start`, children in insertion order.
    pub fn traverse(&self, start: NodeKey, mut visit: impl FnMut(NodeKey)) {
        if !self.nodes.contains_key(start) {
            return;
        }
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            visit(key);
            // Reverse so the first child is visited first
            stack.extend(self.children(key).iter().rev());
        }
    }

    /// Every mesh node in the scene, in traversal order.
    pub fn mesh_nodes(&self) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.traverse(self.root(), |k| {
            if self.nodes[k].is_mesh() {
                out.push(k);
            }
        });
        out
    }

    /// A node is visible only if it and all of its ancestors are.
    pub fn is_visible(&self, key: NodeKey) -> bool {
        match self.node(key) {
            Some(node) if node.visible => self
                .ancestors(key)
                .all(|a| self.nodes.get(a).is_some_and(|n| n.visible)),
            _ => false,
        }
    }

    /// Mesh nodes that are effectively visible.
    pub fn visible_mesh_nodes(&self) -> Vec<NodeKey> {
        let mut out = Vec::new();
        self.collect_visible(self.root(), &mut out);
        out
    }

    fn collect_visible(&self, key: NodeKey, out: &mut Vec<NodeKey>) {
        let Some(node) = self.node(key) else { return };
        if !node.visible {
            return;
        }
        if node.is_mesh() {
            out.push(key);
        }
        for &child in node.children() {
            self.collect_visible(child, out);
        }
    }

    /// Transform from the node's local space to world space.
    pub fn world_transform(&self, key: NodeKey) -> Matrix4<f64> {
        let mut matrix = match self.node(key) {
            Some(node) => node.transform,
            None => return Matrix4::identity(),
        };
        for ancestor in self.ancestors(key) {
            matrix = self.nodes[ancestor].transform * matrix;
        }
        matrix
    }

    /// World-space bounds of a mesh node's geometry; empty for groups.
    ///
    /// Every vertex is transformed, so the box is tight under rotation.
    pub fn world_bounds(&self, key: NodeKey) -> Aabb {
        let Some(mesh) = self.node(key).and_then(|n| n.mesh()) else {
            return Aabb::empty();
        };
        let world = self.world_transform(key);
        let mut aabb = Aabb::empty();
        for p in mesh.geometry.positions() {
            aabb.expand_by_point(&world.transform_point(p));
        }
        aabb
    }

    /// Union of the world bounds of all visible meshes.
    pub fn visible_bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for key in self.visible_mesh_nodes() {
            aabb.union(&self.world_bounds(key));
        }
        aabb
    }
}

/// Matrix that carries surface normals from local to world space: the
/// inverse transpose of the upper-left 3x3 block. `None` for singular
/// transforms.
pub fn normal_matrix(world: &Matrix4<f64>) -> Option<Matrix3<f64>> {
    let linear: Matrix3<f64> = world.fixed_view::<3, 3>(0, 0).into_owned();
    linear.try_inverse().map(|inv| inv.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::material::Material;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn cube() -> Geometry {
        Geometry::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn ancestors_nearest_first() {
        let mut scene = Scene::new();
        let a = scene.add_group(scene.root(), "a").unwrap();
        let b = scene.add_group(a, "b").unwrap();
        let c = scene.add_group(b, "c").unwrap();
        let chain: Vec<_> = scene.ancestors(c).collect();
        assert_eq!(chain, vec![b, a, scene.root()]);
    }

    #[test]
    fn traversal_is_preorder() {
        let mut scene = Scene::new();
        let a = scene.add_group(scene.root(), "a").unwrap();
        let a1 = scene.add_group(a, "a1").unwrap();
        let b = scene.add_group(scene.root(), "b").unwrap();
        assert_eq!(scene.descendants(scene.root()), vec![scene.root(), a, a1, b]);
    }

    #[test]
    fn visibility_is_inherited() {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::new("m"));
        let group = scene.add_group(scene.root(), "g").unwrap();
        let mesh = scene.add_mesh(group, "m", cube(), mat).unwrap();
        let other = scene.add_mesh(scene.root(), "o", cube(), mat).unwrap();

        assert!(scene.is_visible(mesh));
        scene.set_visible(group, false).unwrap();
        assert!(!scene.is_visible(mesh));
        assert_eq!(scene.visible_mesh_nodes(), vec![other]);
        assert_eq!(scene.mesh_nodes(), vec![mesh, other]);
    }

    #[test]
    fn world_transform_composes_parents() {
        let mut scene = Scene::new();
        let mat = scene.add_material(Material::new("m"));
        let group = scene.add_group(scene.root(), "g").unwrap();
        scene
            .set_transform(group, Matrix4::new_translation(&Vector3::new(10.0, 0.0, 0.0)))
            .unwrap();
        let mesh = scene.add_mesh(group, "m", cube(), mat).unwrap();
        scene
            .set_transform(mesh, Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0)))
            .unwrap();

        let bounds = scene.world_bounds(mesh);
        assert_relative_eq!(bounds.min.x, 8.0);
        assert_relative_eq!(bounds.max.x, 12.0);
        assert_relative_eq!(bounds.max.y, 1.0);
    }

    #[test]
    fn group_bounds_are_empty() {
        let mut scene = Scene::new();
        let group = scene.add_group(scene.root(), "g").unwrap();
        assert!(scene.world_bounds(group).is_empty());
        assert!(scene.visible_bounds().is_empty());
    }

    #[test]
    fn normal_matrix_undoes_nonuniform_scale() {
        let world = Matrix4::new_nonuniform_scaling(&Vector3::new(2.0, 1.0, 1.0));
        let nm = normal_matrix(&world).unwrap();
        // A 45° slanted surface keeps a normal perpendicular to the stretched surface
        let n = (nm * Vector3::new(1.0, 1.0, 0.0)).normalize();
        let tangent = world.transform_vector(&Vector3::new(1.0, -1.0, 0.0));
        assert_relative_eq!(n.dot(&tangent), 0.0, epsilon = 1e-12);

        assert!(normal_matrix(&Matrix4::zeros()).is_none());
    }
}
