// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![allow(dead_code)]

use bimview_scene::{
    Camera, Geometry, Material, MaterialKey, MaterialSlots, Matrix4, NodeKey, OrbitControls,
    Point3, Renderer, Scene, Vector3, Viewport,
};
use bimview_viewer::Viewer;
use smallvec::smallvec;

/// Keys of the test model.
///
/// ```text
/// Scene
/// ├── A1            mesh, id "A1", cube [-1, 1]^3
/// │   └── A1-sub    mesh, cube at x = 3
/// ├── B2            group at x = -5, id "B2"
/// │   ├── B2 part 1 mesh (shares "steel" with part 2)
/// │   └── B2 part 2 mesh
/// └── C3            mesh at z = -6 with two material slots
/// ```
pub struct Keys {
    pub a1: NodeKey,
    pub a1_sub: NodeKey,
    pub b2: NodeKey,
    pub b2_parts: [NodeKey; 2],
    pub c3: NodeKey,
    pub steel: MaterialKey,
}

pub fn unit_cube() -> Geometry {
    Geometry::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
}

pub fn model() -> (Scene, Keys) {
    let mut scene = Scene::new();
    let root = scene.root();

    let concrete = scene.add_material(Material::new("concrete"));
    let brick = scene.add_material(Material::new("brick"));
    let steel = scene.add_material(Material::new("steel"));
    let glass = scene.add_material(Material::new("glass").with_opacity(0.4));

    let a1 = scene.add_mesh(root, "A1", unit_cube(), concrete).unwrap();
    scene.set_attribute(a1, "id", "A1").unwrap();
    scene.set_attribute(a1, "type", "IfcWall").unwrap();

    let a1_sub = scene.add_mesh(a1, "A1-sub", unit_cube(), brick).unwrap();
    scene.set_attribute(a1_sub, "id", "A1-sub").unwrap();
    scene
        .set_transform(a1_sub, Matrix4::new_translation(&Vector3::new(3.0, 0.0, 0.0)))
        .unwrap();

    let b2 = scene.add_group(root, "B2").unwrap();
    scene
        .set_transform(b2, Matrix4::new_translation(&Vector3::new(-5.0, 0.0, 0.0)))
        .unwrap();
    let part1 = scene.add_mesh(b2, "B2 part 1", unit_cube(), steel).unwrap();
    let part2 = scene.add_mesh(b2, "B2 part 2", unit_cube(), steel).unwrap();
    scene
        .set_transform(part2, Matrix4::new_translation(&Vector3::new(0.0, 2.0, 0.0)))
        .unwrap();

    let slots: MaterialSlots = smallvec![concrete, glass];
    let c3 = scene
        .add_mesh_with_slots(root, "C3", unit_cube(), slots)
        .unwrap();
    scene
        .set_transform(c3, Matrix4::new_translation(&Vector3::new(0.0, 0.0, -6.0)))
        .unwrap();

    let keys = Keys {
        a1,
        a1_sub,
        b2,
        b2_parts: [part1, part2],
        c3,
        steel,
    };
    (scene, keys)
}

/// Camera on +Z looking at the origin.
pub fn camera() -> Camera {
    let mut camera =
        Camera::perspective(60.0, 1.0, 0.1, 1000.0).with_position(Point3::new(0.0, 0.0, 10.0));
    camera.look_at(&Point3::origin());
    camera
}

pub fn viewport() -> Viewport {
    Viewport::new(0.0, 0.0, 100.0, 100.0)
}

/// A viewer with the test model, camera, controls and renderer installed.
pub fn viewer() -> (Viewer, Keys) {
    let (scene, keys) = model();
    let mut viewer = Viewer::default();
    viewer.set_scene(scene);
    viewer.set_camera(camera());
    viewer.set_controls(OrbitControls::default());
    viewer.set_renderer(Renderer::new());
    (viewer, keys)
}

/// Material slots of every mesh, in traversal order.
pub fn assignments(scene: &Scene) -> Vec<(NodeKey, MaterialSlots)> {
    scene
        .mesh_nodes()
        .into_iter()
        .map(|mesh| (mesh, scene.mesh_materials(mesh).cloned().unwrap()))
        .collect()
}
