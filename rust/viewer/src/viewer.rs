// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The viewer facade: one object owning the scene and every engine.
//!
//! Operations never fail outward. A missing scene, camera or controls, or
//! any engine error, is logged with `tracing::warn!` and reported as a
//! `false`/empty result while every engine stays consistent.

use std::time::Duration;

use bimview_scene::{Camera, NodeKey, OrbitControls, Renderer, Scene};
use rustc_hash::FxHashSet;

use crate::config::ViewerConfig;
use crate::error::{Error, Result};
use crate::focus::{AnimationStatus, FocusEngine, FocusResult, FocusSettings};
use crate::highlight::Highlighter;
use crate::identity::IdentityIndex;
use crate::isolation::{IsolationEngine, IsolationMode, IsolationState};
use crate::ledger::MaterialLedger;
use crate::section::{
    key_action, Modifiers, PickOutcome, PointerEvent, SectionEngine, SectionKey, SectionMode,
    SectionPlaneState, SectionSettings,
};

fn skipped(operation: &'static str, err: &Error) {
    tracing::warn!(operation, error = %err, "Viewer operation skipped");
}

pub struct Viewer {
    config: ViewerConfig,
    scene: Option<Scene>,
    camera: Option<Camera>,
    controls: Option<OrbitControls>,
    renderer: Option<Renderer>,
    index: IdentityIndex,
    ledger: MaterialLedger,
    section: SectionEngine,
    isolation: IsolationEngine,
    highlight: Highlighter,
    focus: FocusEngine,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            section: SectionEngine::new(SectionSettings::from_config(&config)),
            isolation: IsolationEngine::new(&config),
            highlight: Highlighter::new(config.highlight),
            focus: FocusEngine::new(FocusSettings::from_config(&config)),
            config,
            scene: None,
            camera: None,
            controls: None,
            renderer: None,
            index: IdentityIndex::new(),
            ledger: MaterialLedger::new(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    // --- Scene lifecycle ---

    /// Installs a new scene and indexes it. The previous scene, if any, is
    /// returned with every engine's changes undone.
    pub fn set_scene(&mut self, scene: Scene) -> Option<Scene> {
        let previous = self.take_scene();
        self.index = IdentityIndex::build(&scene, &self.config.id_policy());
        tracing::info!(
            meshes = self.index.meshes().len(),
            ids = self.index.len(),
            "Scene set"
        );
        self.scene = Some(scene);
        self.request_redraw();
        previous
    }

    /// Removes the scene after clearing highlight, isolation and clipping
    /// from it.
    pub fn take_scene(&mut self) -> Option<Scene> {
        let mut scene = self.scene.take()?;
        if let Err(err) = self.highlight.clear(&mut scene, &mut self.isolation) {
            skipped("take_scene", &err);
        }
        if let Err(err) = self.isolation.disable(&mut scene) {
            skipped("take_scene", &err);
        }
        self.section.clear(Some(&mut scene), &mut self.ledger);

        self.ledger.clear();
        self.isolation.reset_session();
        self.highlight.reset_session();
        self.focus.cancel();
        self.index = IdentityIndex::new();
        Some(scene)
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Structural edits made through this reference are picked up by the
    /// identity index on the next lookup.
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn set_controls(&mut self, controls: OrbitControls) {
        self.controls = Some(controls);
    }

    pub fn controls(&self) -> Option<&OrbitControls> {
        self.controls.as_ref()
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.controls.as_mut()
    }

    /// Installs the renderer with per-material clipping turned on.
    pub fn set_renderer(&mut self, mut renderer: Renderer) {
        renderer.local_clipping_enabled = true;
        self.renderer = Some(renderer);
    }

    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut Renderer> {
        self.renderer.as_mut()
    }

    pub fn index(&self) -> &IdentityIndex {
        &self.index
    }

    pub fn ledger(&self) -> &MaterialLedger {
        &self.ledger
    }

    /// Meshes of the given element ids.
    pub fn lookup<I, S>(&mut self, ids: I) -> FxHashSet<NodeKey>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.refresh_index();
        self.index.lookup(ids)
    }

    fn refresh_index(&mut self) {
        if let Some(scene) = self.scene.as_ref() {
            if self.index.is_stale(scene) {
                self.index = IdentityIndex::build(scene, &self.config.id_policy());
            }
        }
    }

    fn request_redraw(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.request_redraw();
        }
    }

    /// Re-applies an active section plane once new shared materials exist.
    fn clip_new_materials(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            self.section.reapply(scene, &mut self.ledger);
        }
    }

    // --- Section plane ---

    pub fn section_mode(&self) -> SectionMode {
        self.section.mode()
    }

    pub fn section_state(&self) -> Option<&SectionPlaneState> {
        self.section.state()
    }

    pub fn toggle_section_mode(&mut self) -> SectionMode {
        let mode = self.section.toggle(self.scene.as_mut(), &mut self.ledger);
        self.request_redraw();
        mode
    }

    pub fn handle_pick(&mut self, event: &PointerEvent) -> PickOutcome {
        if self.section.mode() == SectionMode::Disabled {
            return PickOutcome::Disabled;
        }
        let result = match (self.scene.as_mut(), self.camera.as_ref()) {
            (None, _) => Err(Error::MissingScene),
            (_, None) => Err(Error::MissingCamera),
            (Some(scene), Some(camera)) => self.section.pick(scene, &mut self.ledger, camera, event),
        };
        match result {
            Ok(outcome) => {
                if outcome.is_picked() {
                    self.request_redraw();
                }
                outcome
            }
            Err(err) => {
                skipped("handle_pick", &err);
                PickOutcome::Miss
            }
        }
    }

    /// Runs the section action bound to `key`. Returns `true` if the key
    /// was bound and its action took effect.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> bool {
        if self.section.mode() == SectionMode::Disabled {
            return false;
        }
        let Some(action) = key_action(key, modifiers, self.section.settings().nudge_step) else {
            return false;
        };
        match action {
            SectionKey::Nudge(delta) => self.nudge(delta).is_some(),
            SectionKey::ResetOffset => self.reset_offset().is_some(),
            SectionKey::ClearPlane => self.clear_plane(),
            SectionKey::ChangePlane => self.enable_picking(),
        }
    }

    /// Moves the plane by `delta` along its normal. Returns the new offset.
    pub fn nudge(&mut self, delta: f64) -> Option<f64> {
        self.change_offset("nudge", |section, scene, ledger| section.nudge(delta, scene, ledger))
    }

    pub fn set_section_offset(&mut self, offset: f64) -> Option<f64> {
        self.change_offset("set_section_offset", |section, scene, ledger| {
            section.set_offset(offset, scene, ledger)
        })
    }

    pub fn reset_offset(&mut self) -> Option<f64> {
        self.change_offset("reset_offset", |section, scene, ledger| {
            section.reset_offset(scene, ledger)
        })
    }

    fn change_offset(
        &mut self,
        operation: &'static str,
        change: impl FnOnce(&mut SectionEngine, &mut Scene, &mut MaterialLedger) -> Result<f64>,
    ) -> Option<f64> {
        let result = match self.scene.as_mut() {
            Some(scene) => change(&mut self.section, scene, &mut self.ledger),
            None => Err(Error::MissingScene),
        };
        match result {
            Ok(offset) => {
                self.request_redraw();
                Some(offset)
            }
            Err(err) => {
                skipped(operation, &err);
                None
            }
        }
    }

    /// Removes the plane from every material. Returns `false` if no plane
    /// was active, in which case nothing changes.
    pub fn clear_plane(&mut self) -> bool {
        let cleared = self.section.clear(self.scene.as_mut(), &mut self.ledger);
        if cleared {
            self.request_redraw();
        }
        cleared
    }

    /// Lets the next click pick a new plane.
    pub fn enable_picking(&mut self) -> bool {
        self.section.enable_picking()
    }

    pub fn lock_plane(&mut self) -> bool {
        self.section.lock()
    }

    pub fn align_camera_to_plane(&mut self) -> bool {
        let result = match (
            self.scene.as_ref(),
            self.camera.as_mut(),
            self.controls.as_mut(),
        ) {
            (None, _, _) => Err(Error::MissingScene),
            (_, None, _) => Err(Error::MissingCamera),
            (_, _, None) => Err(Error::MissingControls),
            (Some(scene), Some(camera), Some(controls)) => {
                self.section.align_camera(scene, camera, controls)
            }
        };
        match result {
            Ok(()) => {
                self.request_redraw();
                true
            }
            Err(err) => {
                skipped("align_camera_to_plane", &err);
                false
            }
        }
    }

    // --- Isolation ---

    pub fn xray_state(&self) -> Option<&IsolationState> {
        self.isolation.state()
    }

    pub fn enable_xray<I, S>(&mut self, ids: I, mode: IsolationMode) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.refresh_index();
        let result = match self.scene.as_mut() {
            Some(scene) => self.isolation.enable(scene, &self.index, ids, mode),
            None => Err(Error::MissingScene),
        };
        match result {
            Ok(report) => {
                if report.materials_created {
                    self.clip_new_materials();
                }
                self.request_redraw();
                true
            }
            Err(err) => {
                skipped("enable_xray", &err);
                false
            }
        }
    }

    pub fn disable_xray(&mut self) -> bool {
        let result = match self.scene.as_mut() {
            Some(scene) => self.isolation.disable(scene),
            None => Err(Error::MissingScene),
        };
        match result {
            Ok(_) => {
                self.request_redraw();
                true
            }
            Err(err) => {
                skipped("disable_xray", &err);
                false
            }
        }
    }

    /// Moves only the meshes whose selection changed. Returns `false`
    /// without touching anything while isolation is off.
    pub fn update_selection<I, S>(&mut self, ids: I, mode: Option<IsolationMode>) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.isolation.is_active() {
            tracing::debug!("Selection update ignored, isolation is off");
            return false;
        }
        self.refresh_index();
        let result = match self.scene.as_mut() {
            Some(scene) => self.isolation.update_selection(scene, &self.index, ids, mode),
            None => Err(Error::MissingScene),
        };
        match result {
            Ok(delta) => {
                if !delta.is_empty() {
                    self.request_redraw();
                }
                true
            }
            Err(err) => {
                skipped("update_selection", &err);
                false
            }
        }
    }

    // --- Highlight ---

    pub fn highlighted(&self) -> &FxHashSet<NodeKey> {
        self.highlight.meshes()
    }

    /// Highlights the meshes of `ids`, replacing the previous highlight.
    /// Returns the number of highlighted meshes.
    pub fn set_highlight<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.refresh_index();
        let result = match self.scene.as_mut() {
            Some(scene) => self.highlight.set(scene, &self.index, &mut self.isolation, ids),
            None => Err(Error::MissingScene),
        };
        match result {
            Ok(report) => {
                if report.material_created {
                    self.clip_new_materials();
                }
                self.request_redraw();
                report.count
            }
            Err(err) => {
                skipped("set_highlight", &err);
                0
            }
        }
    }

    /// Returns the number of meshes restored.
    pub fn clear_highlight(&mut self) -> usize {
        let result = match self.scene.as_mut() {
            Some(scene) => self.highlight.clear(scene, &mut self.isolation),
            None => Err(Error::MissingScene),
        };
        match result {
            Ok(restored) => {
                self.request_redraw();
                restored
            }
            Err(err) => {
                skipped("clear_highlight", &err);
                0
            }
        }
    }

    // --- Camera focus ---

    pub fn focus_on_elements<I, S>(&mut self, ids: I) -> FocusResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.refresh_index();
        let (scene, camera, controls) = match (
            self.scene.as_ref(),
            self.camera.as_ref(),
            self.controls.as_ref(),
        ) {
            (Some(scene), Some(camera), Some(controls)) => (scene, camera, controls),
            (None, _, _) => {
                skipped("focus_on_elements", &Error::MissingScene);
                return FocusResult::NOT_FOUND;
            }
            (_, None, _) => {
                skipped("focus_on_elements", &Error::MissingCamera);
                return FocusResult::NOT_FOUND;
            }
            (_, _, None) => {
                skipped("focus_on_elements", &Error::MissingControls);
                return FocusResult::NOT_FOUND;
            }
        };
        let result = self.focus.focus(scene, &self.index, camera, controls, ids);
        if result.found {
            self.request_redraw();
        }
        result
    }

    /// Advances the camera transition to `now`, a monotonic timestamp from
    /// the host's frame loop. Returns `true` while more frames are needed.
    pub fn tick(&mut self, now: Duration) -> bool {
        if !self.focus.is_animating() {
            return false;
        }
        let status = match (self.camera.as_mut(), self.controls.as_mut()) {
            (Some(camera), Some(controls)) => self.focus.tick(now, camera, controls),
            (camera, _) => {
                let err = if camera.is_none() {
                    Error::MissingCamera
                } else {
                    Error::MissingControls
                };
                skipped("tick", &err);
                self.focus.cancel();
                return false;
            }
        };
        match status {
            AnimationStatus::Idle => false,
            AnimationStatus::Running(_) => {
                self.request_redraw();
                true
            }
            AnimationStatus::Finished => {
                self.request_redraw();
                false
            }
        }
    }

    pub fn cancel_focus(&mut self) -> bool {
        self.focus.cancel()
    }

    pub fn is_focusing(&self) -> bool {
        self.focus.is_animating()
    }
}
