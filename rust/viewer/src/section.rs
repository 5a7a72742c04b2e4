// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Section plane picking and material clipping.
//!
//! The engine moves between three modes:
//!
//! ```text
//! Disabled --toggle--> Armed --pick--> Locked
//!    ^                  ^  |             |
//!    |                  |  +--shift-pick-+ (stays Armed)
//!    |                  +--enable_picking/shift-pick--+
//!    +----------------toggle (clears the plane)-------+
//! ```
//!
//! A pick derives a plane from the surface under the pointer. The plane
//! normal always faces the camera and the positive side of the plane is
//! clipped, so the half of the model nearer the viewer is cut away.

use bimview_scene::{
    world_up, Camera, ClipPlane, Hierarchy, NodeKey, OrbitControls, Point3, Scene, Vector3,
    Viewport,
};

use crate::config::ViewerConfig;
use crate::error::{Error, Result};
use crate::ledger::MaterialLedger;

/// Fallback label when neither the mesh nor its ancestors name it.
pub const DEFAULT_LABEL: &str = "Element";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SectionMode {
    #[default]
    Disabled,
    /// Picking enabled; a plane may or may not be active.
    Armed,
    /// Plane active, picking disabled.
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
        meta: false,
    };
}

/// A click in viewport pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub viewport: Viewport,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(x: f64, y: f64, viewport: Viewport) -> Self {
        Self {
            x,
            y,
            viewport,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// The active section plane.
///
/// `plane` is always the plane through `origin + normal * offset` with
/// normal `normal`; the fields are private so that nothing can break that.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionPlaneState {
    origin: Point3<f64>,
    normal: Vector3<f64>,
    offset: f64,
    plane: ClipPlane,
    source_label: String,
    locked: bool,
}

impl SectionPlaneState {
    /// `normal` must be unit length.
    pub fn new(
        origin: Point3<f64>,
        normal: Vector3<f64>,
        source_label: impl Into<String>,
        locked: bool,
    ) -> Self {
        Self {
            origin,
            normal,
            offset: 0.0,
            plane: ClipPlane::from_unit_normal_and_point(&normal, &origin),
            source_label: source_label.into(),
            locked,
        }
    }

    /// Offset-free anchor: the picked point pushed off the surface.
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn plane(&self) -> &ClipPlane {
        &self.plane
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Point the plane currently passes through.
    pub fn plane_origin(&self) -> Point3<f64> {
        self.origin + self.normal * self.offset
    }

    fn set_offset(&mut self, offset: f64) {
        self.offset = offset;
        self.plane = ClipPlane::from_unit_normal_and_point(&self.normal, &self.plane_origin());
    }
}

/// Result of a pointer pick.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// Section mode is off.
    Disabled,
    /// Plane is locked and the pick carried no override modifier.
    Locked,
    /// The ray hit nothing; state is unchanged.
    Miss,
    Picked { label: String, locked: bool },
}

impl PickOutcome {
    pub fn is_picked(&self) -> bool {
        matches!(self, PickOutcome::Picked { .. })
    }
}

/// Section action bound to a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SectionKey {
    Nudge(f64),
    ResetOffset,
    ClearPlane,
    ChangePlane,
}

/// Maps a key name (DOM `KeyboardEvent.key` style) to a section action.
/// Shift multiplies nudges by ten.
pub fn key_action(key: &str, modifiers: Modifiers, nudge_step: f64) -> Option<SectionKey> {
    let step = if modifiers.shift {
        nudge_step * 10.0
    } else {
        nudge_step
    };
    match key {
        "ArrowUp" | "]" => Some(SectionKey::Nudge(step)),
        "ArrowDown" | "[" => Some(SectionKey::Nudge(-step)),
        "0" => Some(SectionKey::ResetOffset),
        "Escape" => Some(SectionKey::ClearPlane),
        "c" | "C" => Some(SectionKey::ChangePlane),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionSettings {
    pub pick_epsilon: f64,
    pub nudge_step: f64,
    pub align_distance_factor: f64,
    pub label_attributes: Vec<String>,
    pub max_ancestor_depth: usize,
}

impl SectionSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            pick_epsilon: config.pick_epsilon,
            nudge_step: config.nudge_step,
            align_distance_factor: config.align_distance_factor,
            label_attributes: config.label_attributes.clone(),
            max_ancestor_depth: config.max_ancestor_depth,
        }
    }
}

impl Default for SectionSettings {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionEngine {
    mode: SectionMode,
    plane: Option<SectionPlaneState>,
    settings: SectionSettings,
}

impl SectionEngine {
    pub fn new(settings: SectionSettings) -> Self {
        Self {
            mode: SectionMode::Disabled,
            plane: None,
            settings,
        }
    }

    pub fn mode(&self) -> SectionMode {
        self.mode
    }

    pub fn settings(&self) -> &SectionSettings {
        &self.settings
    }

    pub fn state(&self) -> Option<&SectionPlaneState> {
        self.plane.as_ref()
    }

    pub fn active_plane(&self) -> Option<&ClipPlane> {
        self.plane.as_ref().map(|s| s.plane())
    }

    /// Turns section mode on (Armed) or off. Turning off clears any active
    /// plane from the scene's materials.
    pub fn toggle(&mut self, scene: Option<&mut Scene>, ledger: &mut MaterialLedger) -> SectionMode {
        match self.mode {
            SectionMode::Disabled => self.mode = SectionMode::Armed,
            SectionMode::Armed | SectionMode::Locked => {
                self.clear(scene, ledger);
                self.mode = SectionMode::Disabled;
            }
        }
        tracing::info!(mode = ?self.mode, "Section mode toggled");
        self.mode
    }

    /// Casts a ray through the pointer and, on a hit, replaces the active
    /// plane with one lying on the hit surface.
    pub fn pick(
        &mut self,
        scene: &mut Scene,
        ledger: &mut MaterialLedger,
        camera: &Camera,
        event: &PointerEvent,
    ) -> Result<PickOutcome> {
        let override_pick = event.modifiers.shift;
        match self.mode {
            SectionMode::Disabled => return Ok(PickOutcome::Disabled),
            SectionMode::Locked if !override_pick => return Ok(PickOutcome::Locked),
            _ => {}
        }

        let ndc = event
            .viewport
            .to_ndc(event.x, event.y)
            .ok_or(Error::EmptyViewport)?;
        let ray = camera.ray_from_ndc(&ndc)?;

        let Some(hit) = scene.raycast(&ray) else {
            tracing::debug!(x = event.x, y = event.y, "Section pick missed");
            return Ok(PickOutcome::Miss);
        };

        let mut normal = hit.face_normal;
        if normal.dot(&camera.view_direction()) > 0.0 {
            normal = -normal;
        }
        let origin = hit.point + normal * self.settings.pick_epsilon;
        let label = resolve_label(
            scene,
            hit.node,
            &self.settings.label_attributes,
            self.settings.max_ancestor_depth,
        );

        let locked = !override_pick;
        let state = SectionPlaneState::new(origin, normal, label.clone(), locked);
        let touched = apply_plane(scene, ledger, Some(state.plane()));
        self.plane = Some(state);
        self.mode = if locked {
            SectionMode::Locked
        } else {
            SectionMode::Armed
        };

        tracing::info!(
            label = %label,
            distance = hit.distance,
            locked,
            materials = touched,
            "Section plane picked"
        );
        Ok(PickOutcome::Picked { label, locked })
    }

    /// Moves the plane along its normal by `delta`. Returns the new offset.
    pub fn nudge(&mut self, delta: f64, scene: &mut Scene, ledger: &mut MaterialLedger) -> Result<f64> {
        let offset = self.plane.as_ref().ok_or(Error::NoActivePlane)?.offset() + delta;
        self.set_offset(offset, scene, ledger)
    }

    /// Places the plane at `offset` along its normal from the picked origin.
    pub fn set_offset(
        &mut self,
        offset: f64,
        scene: &mut Scene,
        ledger: &mut MaterialLedger,
    ) -> Result<f64> {
        let state = self.plane.as_mut().ok_or(Error::NoActivePlane)?;
        state.set_offset(offset);
        apply_plane(scene, ledger, Some(state.plane()));
        tracing::debug!(offset, constant = state.plane().constant, "Section offset changed");
        Ok(offset)
    }

    pub fn reset_offset(&mut self, scene: &mut Scene, ledger: &mut MaterialLedger) -> Result<f64> {
        self.set_offset(0.0, scene, ledger)
    }

    /// Drops the active plane and restores every material. A locked engine
    /// goes back to picking. Returns `false` if no plane was active.
    pub fn clear(&mut self, scene: Option<&mut Scene>, ledger: &mut MaterialLedger) -> bool {
        let had_plane = self.plane.take().is_some();
        if let Some(scene) = scene {
            apply_plane(scene, ledger, None);
        }
        if self.mode == SectionMode::Locked {
            self.mode = SectionMode::Armed;
        }
        if had_plane {
            tracing::info!("Section plane cleared");
        }
        had_plane
    }

    /// Locked -> Armed so the next click picks a new plane. The current
    /// plane stays until it is replaced.
    pub fn enable_picking(&mut self) -> bool {
        match self.mode {
            SectionMode::Disabled => false,
            SectionMode::Armed => true,
            SectionMode::Locked => {
                self.mode = SectionMode::Armed;
                if let Some(state) = self.plane.as_mut() {
                    state.locked = false;
                }
                true
            }
        }
    }

    /// Armed with a plane -> Locked.
    pub fn lock(&mut self) -> bool {
        match (self.mode, self.plane.as_mut()) {
            (SectionMode::Locked, _) => true,
            (SectionMode::Armed, Some(state)) => {
                state.locked = true;
                self.mode = SectionMode::Locked;
                true
            }
            _ => false,
        }
    }

    /// Re-applies the active plane, reaching materials added since it was
    /// last applied. Returns the number of materials touched.
    pub fn reapply(&self, scene: &mut Scene, ledger: &mut MaterialLedger) -> usize {
        match self.active_plane() {
            Some(plane) => apply_plane(scene, ledger, Some(plane)),
            None => 0,
        }
    }

    /// Places the camera on the plane normal at a distance scaled to the
    /// visible model, looking at the plane, and retargets the orbit there.
    pub fn align_camera(
        &self,
        scene: &Scene,
        camera: &mut Camera,
        controls: &mut OrbitControls,
    ) -> Result<()> {
        let state = self.plane.as_ref().ok_or(Error::NoActivePlane)?;
        let bounds = scene.visible_bounds();
        let radius = if bounds.is_empty() {
            1.0
        } else {
            bounds.bounding_sphere_radius().max(f64::EPSILON)
        };

        let origin = state.plane_origin();
        let normal = state.normal();
        camera.position = origin - normal * (self.settings.align_distance_factor * radius);
        camera.up = if normal.cross(&world_up()).norm_squared() <= 1e-12 {
            Vector3::z()
        } else {
            world_up()
        };
        camera.look_at(&origin);
        controls.target = origin;

        tracing::debug!(radius, "Camera aligned to section plane");
        Ok(())
    }
}

/// Applies `plane` to every material in the scene, or removes clipping when
/// `plane` is `None`. Returns the number of materials changed.
///
/// Each material's clipping state is captured in `ledger` before its first
/// change and written back when clipping is removed, so calling this with
/// `None` when no plane was ever applied changes nothing.
pub fn apply_plane(scene: &mut Scene, ledger: &mut MaterialLedger, plane: Option<&ClipPlane>) -> usize {
    let mut touched = 0;
    for (key, material) in scene.materials_mut() {
        match plane {
            Some(plane) => {
                ledger.capture(key, material);
                material.clipping_planes = Some(vec![*plane]);
                material.clip_shadows = true;
                material.polygon_offset = true;
                material.polygon_offset_factor = 1.0;
                material.polygon_offset_units = 1.0;
            }
            None => {
                // Materials without a snapshot were never clipped here.
                if !ledger.restore(key, material) {
                    continue;
                }
                material.clip_shadows = false;
            }
        }
        material.needs_update();
        touched += 1;
    }
    touched
}

/// Human-readable name for a picked mesh: the first label attribute found
/// on the mesh or its ancestors, else the mesh name.
pub fn resolve_label(
    scene: &Scene,
    mesh: NodeKey,
    label_attributes: &[String],
    max_ancestor_depth: usize,
) -> String {
    let chain = std::iter::once(mesh).chain(scene.bounded_ancestors(mesh, max_ancestor_depth));
    for key in chain {
        for attribute in label_attributes {
            if let Some(value) = Hierarchy::attribute(scene, key, attribute).map(str::trim) {
                if !value.is_empty() {
                    return value.to_string();
                }
            }
        }
    }
    Hierarchy::name(scene, mesh)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_LABEL)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bimview_scene::{Geometry, Material};

    fn cube_scene() -> (Scene, NodeKey) {
        let mut scene = Scene::new();
        let material = scene.add_material(Material::new("concrete"));
        let group = scene.add_group(scene.root(), "W-1").unwrap();
        scene.set_attribute(group, "type", "IfcWall").unwrap();
        let mesh = scene
            .add_mesh(
                group,
                "wall mesh",
                Geometry::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)),
                material,
            )
            .unwrap();
        (scene, mesh)
    }

    fn camera() -> Camera {
        let mut camera =
            Camera::perspective(60.0, 1.0, 0.1, 100.0).with_position(Point3::new(0.0, 0.0, 10.0));
        camera.look_at(&Point3::origin());
        camera
    }

    fn click() -> PointerEvent {
        PointerEvent::new(53.0, 46.0, Viewport::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn keys() {
        assert_eq!(key_action("ArrowUp", Modifiers::NONE, 0.05), Some(SectionKey::Nudge(0.05)));
        assert_eq!(key_action("[", Modifiers::NONE, 0.05), Some(SectionKey::Nudge(-0.05)));
        assert_eq!(key_action("ArrowUp", Modifiers::SHIFT, 0.05), Some(SectionKey::Nudge(0.05 * 10.0)));
        assert_eq!(key_action("Escape", Modifiers::NONE, 0.05), Some(SectionKey::ClearPlane));
        assert_eq!(key_action("x", Modifiers::NONE, 0.05), None);
    }

    #[test]
    fn pick_faces_camera_and_locks() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        let mut engine = SectionEngine::default();

        assert_eq!(
            engine.pick(&mut scene, &mut ledger, &camera(), &click()).unwrap(),
            PickOutcome::Disabled
        );

        engine.toggle(Some(&mut scene), &mut ledger);
        let outcome = engine.pick(&mut scene, &mut ledger, &camera(), &click()).unwrap();
        assert_eq!(
            outcome,
            PickOutcome::Picked {
                label: "IfcWall".into(),
                locked: true
            }
        );
        assert_eq!(engine.mode(), SectionMode::Locked);

        let state = engine.state().unwrap();
        assert_relative_eq!(state.normal().z, 1.0, epsilon = 1e-9);
        assert_relative_eq!(state.origin().z, 1.001, epsilon = 1e-9);
        assert_relative_eq!(state.plane().distance_to_point(&state.origin()), 0.0, epsilon = 1e-12);

        // Clicks are ignored while locked
        assert_eq!(
            engine.pick(&mut scene, &mut ledger, &camera(), &click()).unwrap(),
            PickOutcome::Locked
        );
    }

    #[test]
    fn shift_pick_stays_armed() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        let mut engine = SectionEngine::default();
        engine.toggle(Some(&mut scene), &mut ledger);

        let event = click().with_modifiers(Modifiers::SHIFT);
        let outcome = engine.pick(&mut scene, &mut ledger, &camera(), &event).unwrap();
        assert_eq!(outcome, PickOutcome::Picked { label: "IfcWall".into(), locked: false });
        assert_eq!(engine.mode(), SectionMode::Armed);
        assert!(engine.lock());
        assert_eq!(engine.mode(), SectionMode::Locked);
        assert!(engine.state().unwrap().is_locked());
    }

    #[test]
    fn miss_changes_nothing() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        let mut engine = SectionEngine::default();
        engine.toggle(Some(&mut scene), &mut ledger);

        let corner = PointerEvent::new(1.0, 1.0, Viewport::new(0.0, 0.0, 100.0, 100.0));
        let outcome = engine.pick(&mut scene, &mut ledger, &camera(), &corner).unwrap();
        assert_eq!(outcome, PickOutcome::Miss);
        assert_eq!(engine.mode(), SectionMode::Armed);
        assert!(engine.state().is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn offsets_and_clear() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        let mut engine = SectionEngine::default();
        engine.toggle(Some(&mut scene), &mut ledger);
        engine.pick(&mut scene, &mut ledger, &camera(), &click()).unwrap();
        let before = *engine.active_plane().unwrap();

        engine.nudge(0.25, &mut scene, &mut ledger).unwrap();
        assert_relative_eq!(engine.active_plane().unwrap().constant, before.constant - 0.25, epsilon = 1e-12);
        engine.nudge(-0.25, &mut scene, &mut ledger).unwrap();
        assert_relative_eq!(engine.state().unwrap().offset(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(engine.active_plane().unwrap().constant, before.constant, epsilon = 1e-12);

        engine.set_offset(-0.5, &mut scene, &mut ledger).unwrap();
        engine.reset_offset(&mut scene, &mut ledger).unwrap();
        assert_eq!(engine.state().unwrap().offset(), 0.0);

        assert!(engine.clear(Some(&mut scene), &mut ledger));
        assert_eq!(engine.mode(), SectionMode::Armed);
        assert!(!engine.clear(Some(&mut scene), &mut ledger));
        assert!(matches!(
            engine.nudge(0.1, &mut scene, &mut ledger),
            Err(Error::NoActivePlane)
        ));
    }

    #[test]
    fn apply_none_without_plane_is_noop() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        assert_eq!(apply_plane(&mut scene, &mut ledger, None), 0);
        let (_, material) = scene.materials().next().unwrap();
        assert_eq!(material.version, 0);
    }

    #[test]
    fn apply_none_leaves_uncaptured_clipping_alone() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        let authored = ClipPlane::new(Vector3::y(), -0.5);
        for (_, m) in scene.materials_mut() {
            m.clipping_planes = Some(vec![authored]);
        }
        assert_eq!(apply_plane(&mut scene, &mut ledger, None), 0);
        for (_, m) in scene.materials() {
            assert_eq!(m.clipping_planes, Some(vec![authored]));
            assert_eq!(m.version, 0);
        }
    }

    #[test]
    fn toggle_off_restores_materials() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        let mut engine = SectionEngine::default();
        engine.toggle(Some(&mut scene), &mut ledger);
        engine.pick(&mut scene, &mut ledger, &camera(), &click()).unwrap();
        assert!(scene.materials().all(|(_, m)| m.clipping_planes.is_some() && m.clip_shadows));

        assert_eq!(engine.toggle(Some(&mut scene), &mut ledger), SectionMode::Disabled);
        assert!(engine.state().is_none());
        assert!(ledger.is_empty());
        for (_, m) in scene.materials() {
            assert!(m.clipping_planes.is_none());
            assert!(!m.clip_shadows && !m.polygon_offset);
        }
    }

    #[test]
    fn align_camera_to_plane() {
        let (mut scene, _) = cube_scene();
        let mut ledger = MaterialLedger::new();
        let mut engine = SectionEngine::default();
        let mut cam = camera();
        let mut controls = OrbitControls::default();
        assert!(engine.align_camera(&scene, &mut cam, &mut controls).is_err());

        engine.toggle(Some(&mut scene), &mut ledger);
        engine.pick(&mut scene, &mut ledger, &camera(), &click()).unwrap();
        engine.align_camera(&scene, &mut cam, &mut controls).unwrap();

        let state = engine.state().unwrap();
        let radius = 3.0_f64.sqrt();
        assert_relative_eq!(cam.position.z, state.origin().z - 1.5 * radius, epsilon = 1e-9);
        assert_relative_eq!(controls.target.z, state.origin().z, epsilon = 1e-12);
        let toward = (state.origin() - cam.position).normalize();
        assert_relative_eq!(cam.view_direction().dot(&toward), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn label_falls_back_to_name() {
        let mut scene = Scene::new();
        let material = scene.add_material(Material::new("m"));
        let geometry = Geometry::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let named = scene.add_mesh(scene.root(), "Door 7", geometry.clone(), material).unwrap();
        let unnamed = scene.add_mesh(scene.root(), "", geometry, material).unwrap();
        let attrs = vec!["type".to_string()];
        assert_eq!(resolve_label(&scene, named, &attrs, 5), "Door 7");
        assert_eq!(resolve_label(&scene, unnamed, &attrs, 5), DEFAULT_LABEL);
    }
}
