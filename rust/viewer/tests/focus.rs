// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use std::time::Duration;

use approx::assert_relative_eq;
use bimview_scene::{Aabb, Point3};
use bimview_viewer::{union_bounds, FocusResult, Viewer};
use common::viewer;

fn frame(ms: u64) -> Duration {
    Duration::from_secs(1_000) + Duration::from_millis(ms)
}

#[test]
fn union_box_equals_union_of_mesh_boxes() {
    let (mut viewer, keys) = viewer();
    let meshes = viewer.lookup(["A1", "B2"]);
    let scene = viewer.scene().unwrap();

    let union = union_bounds(scene, &meshes);
    let mut expected = Aabb::empty();
    for mesh in [keys.a1, keys.a1_sub, keys.b2_parts[0], keys.b2_parts[1]] {
        expected.union(&scene.world_bounds(mesh));
    }
    assert_eq!(union, expected);
    assert_eq!(union.min, Point3::new(-6.0, -1.0, -1.0));
    assert_eq!(union.max, Point3::new(4.0, 3.0, 1.0));
}

#[test]
fn focus_animates_to_the_framing_position() {
    let (mut viewer, _) = viewer();
    let start = viewer.camera().unwrap().position;

    let result = viewer.focus_on_elements(["B2"]);
    assert_eq!(result, FocusResult { found: true, count: 2 });
    assert!(viewer.is_focusing());
    // Nothing moves before the first frame
    assert_eq!(viewer.camera().unwrap().position, start);

    assert!(viewer.tick(frame(0)));
    assert_eq!(viewer.camera().unwrap().position, start);
    assert_eq!(viewer.controls().unwrap().target, Point3::origin());

    assert!(viewer.tick(frame(400)));
    let halfway = viewer.camera().unwrap().position;
    assert_ne!(halfway, start);

    assert!(!viewer.tick(frame(800)));
    assert!(!viewer.is_focusing());

    // B2 spans x in [-6, -4], y in [-1, 3]: center (-5, 1, 0), longest edge 4
    let target = viewer.controls().unwrap().target;
    assert_eq!(target, Point3::new(-5.0, 1.0, 0.0));
    let position = viewer.camera().unwrap().position;
    assert_relative_eq!(position.x, -5.0, epsilon = 1e-12);
    assert_relative_eq!(position.y, 1.0 + 8.0 * 0.3, epsilon = 1e-12);
    assert_relative_eq!(position.z, 8.0, epsilon = 1e-12);

    let look = (target - position).normalize();
    assert_relative_eq!(viewer.camera().unwrap().view_direction().dot(&look), 1.0, epsilon = 1e-9);
    assert!(!viewer.tick(frame(900)));
}

#[test]
fn new_request_replaces_the_running_one() {
    let (mut viewer, _) = viewer();
    viewer.focus_on_elements(["B2"]);
    viewer.tick(frame(0));
    viewer.tick(frame(200));

    assert!(viewer.focus_on_elements(["C3"]).found);
    // The replacement starts from wherever the camera is now
    assert!(viewer.tick(frame(300)));
    assert!(!viewer.tick(frame(300 + 800)));
    assert_eq!(viewer.controls().unwrap().target, Point3::new(0.0, 0.0, -6.0));
}

#[test]
fn unknown_ids_leave_the_camera_alone() {
    let (mut viewer, _) = viewer();
    let before = viewer.camera().unwrap().clone();
    assert_eq!(viewer.focus_on_elements(["nope"]), FocusResult::NOT_FOUND);
    assert_eq!(viewer.focus_on_elements(Vec::<String>::new()), FocusResult::NOT_FOUND);
    assert!(!viewer.is_focusing());
    assert!(!viewer.tick(frame(0)));
    assert_eq!(viewer.camera().unwrap(), &before);
}

#[test]
fn cancel_stops_where_the_camera_is() {
    let (mut viewer, _) = viewer();
    viewer.focus_on_elements(["A1"]);
    viewer.tick(frame(0));
    viewer.tick(frame(300));
    let mid = viewer.camera().unwrap().position;

    assert!(viewer.cancel_focus());
    assert!(!viewer.cancel_focus());
    assert!(!viewer.tick(frame(2_000)));
    assert_eq!(viewer.camera().unwrap().position, mid);
}

#[test]
fn focus_needs_camera_and_controls() {
    let (scene, _) = common::model();
    let mut viewer = Viewer::default();
    assert_eq!(viewer.focus_on_elements(["A1"]), FocusResult::NOT_FOUND);

    viewer.set_scene(scene);
    assert_eq!(viewer.focus_on_elements(["A1"]), FocusResult::NOT_FOUND);
    viewer.set_camera(common::camera());
    assert_eq!(viewer.focus_on_elements(["A1"]), FocusResult::NOT_FOUND);
}
