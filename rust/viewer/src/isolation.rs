// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! X-ray and ghost isolation.
//!
//! Every mesh outside the selection is dressed in one of two shared
//! translucent materials; selected meshes keep their own. The materials
//! are created once per scene and referenced by key from every isolated
//! mesh. What an isolated mesh wore before is kept in `originals` and put
//! back when the mesh is selected again or isolation is turned off.

use std::fmt;
use std::str::FromStr;

use bimview_scene::{
    Color, Material, MaterialKey, MaterialRole, MaterialSlots, NodeKey, Scene, Side,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::config::{MaterialStyle, ViewerConfig};
use crate::error::{Error, Result};
use crate::identity::IdentityIndex;

/// Look of isolated geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsolationMode {
    #[default]
    Wireframe,
    Ghost,
}

impl FromStr for IsolationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wireframe" | "xray" | "x-ray" => Ok(IsolationMode::Wireframe),
            "ghost" => Ok(IsolationMode::Ghost),
            other => Err(format!("unknown isolation mode: {other}")),
        }
    }
}

impl fmt::Display for IsolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IsolationMode::Wireframe => f.write_str("wireframe"),
            IsolationMode::Ghost => f.write_str("ghost"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SharedMaterials {
    wireframe: MaterialKey,
    ghost: MaterialKey,
}

impl SharedMaterials {
    fn key(&self, mode: IsolationMode) -> MaterialKey {
        match mode {
            IsolationMode::Wireframe => self.wireframe,
            IsolationMode::Ghost => self.ghost,
        }
    }
}

/// What isolation currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsolationState {
    mode: IsolationMode,
    selected_ids: FxHashSet<String>,
    selected_meshes: FxHashSet<NodeKey>,
    isolated_meshes: FxHashSet<NodeKey>,
}

impl IsolationState {
    pub fn mode(&self) -> IsolationMode {
        self.mode
    }

    pub fn selected_ids(&self) -> &FxHashSet<String> {
        &self.selected_ids
    }

    pub fn selected_meshes(&self) -> &FxHashSet<NodeKey> {
        &self.selected_meshes
    }

    pub fn isolated_meshes(&self) -> &FxHashSet<NodeKey> {
        &self.isolated_meshes
    }
}

/// Outcome of [`IsolationEngine::enable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsolationReport {
    pub selected: usize,
    pub isolated: usize,
    /// The shared materials were created by this call.
    pub materials_created: bool,
}

/// Outcome of [`IsolationEngine::update_selection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionDelta {
    /// Meshes that joined the selection and got their originals back.
    pub entered: usize,
    /// Meshes that left the selection and were isolated.
    pub left: usize,
    pub mode_changed: bool,
}

impl SelectionDelta {
    pub fn is_empty(&self) -> bool {
        self.entered == 0 && self.left == 0 && !self.mode_changed
    }
}

#[derive(Debug, Clone)]
pub struct IsolationEngine {
    wireframe_style: MaterialStyle,
    ghost_style: MaterialStyle,
    shared: Option<SharedMaterials>,
    state: Option<IsolationState>,
    originals: FxHashMap<NodeKey, MaterialSlots>,
}

impl Default for IsolationEngine {
    fn default() -> Self {
        Self::new(&ViewerConfig::default())
    }
}

impl IsolationEngine {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            wireframe_style: config.wireframe,
            ghost_style: config.ghost,
            shared: None,
            state: None,
            originals: FxHashMap::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&IsolationState> {
        self.state.as_ref()
    }

    /// Shared material for `mode`, once created.
    pub fn shared_material(&self, mode: IsolationMode) -> Option<MaterialKey> {
        self.shared.map(|s| s.key(mode))
    }

    /// True while `mesh` wears an isolation material and its original is
    /// held here.
    pub fn is_isolated(&self, mesh: NodeKey) -> bool {
        self.originals.contains_key(&mesh)
    }

    pub fn saved_original(&self, mesh: NodeKey) -> Option<&MaterialSlots> {
        self.originals.get(&mesh)
    }

    /// Changes what an isolated mesh gets back when it leaves isolation.
    /// Returns `false` if the mesh is not isolated.
    pub fn replace_saved(&mut self, mesh: NodeKey, slots: MaterialSlots) -> bool {
        match self.originals.get_mut(&mesh) {
            Some(saved) => {
                *saved = slots;
                true
            }
            None => false,
        }
    }

    /// Forgets everything tied to the current scene, including the shared
    /// materials, without touching any mesh.
    pub fn reset_session(&mut self) {
        self.shared = None;
        self.state = None;
        self.originals.clear();
    }

    /// Isolates every indexed mesh not matched by `ids` and gives matched
    /// meshes their own materials back. May be called while already
    /// active to start over with a new selection and mode.
    pub fn enable<I, S>(
        &mut self,
        scene: &mut Scene,
        index: &IdentityIndex,
        ids: I,
        mode: IsolationMode,
    ) -> Result<IsolationReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let materials_created = self.ensure_shared(scene);
        let selected_ids: FxHashSet<String> =
            ids.into_iter().map(|id| id.as_ref().trim().to_string()).collect();
        let selected_meshes = index.lookup(&selected_ids);

        let mut isolated_meshes = FxHashSet::default();
        for &mesh in index.meshes() {
            if !is_live_mesh(scene, mesh) {
                continue;
            }
            if selected_meshes.contains(&mesh) {
                self.reveal(scene, mesh)?;
            } else {
                self.isolate(scene, mesh, mode)?;
                isolated_meshes.insert(mesh);
            }
        }

        let report = IsolationReport {
            selected: selected_meshes.len(),
            isolated: isolated_meshes.len(),
            materials_created,
        };
        tracing::info!(
            mode = %mode,
            ids = selected_ids.len(),
            selected = report.selected,
            isolated = report.isolated,
            "Isolation enabled"
        );

        self.state = Some(IsolationState {
            mode,
            selected_ids,
            selected_meshes,
            isolated_meshes,
        });
        Ok(report)
    }

    /// Moves only the meshes whose selection changed. A mode change
    /// re-dresses the meshes that stay isolated.
    pub fn update_selection<I, S>(
        &mut self,
        scene: &mut Scene,
        index: &IdentityIndex,
        ids: I,
        mode: Option<IsolationMode>,
    ) -> Result<SelectionDelta>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(mut state) = self.state.take() else {
            return Err(Error::IsolationInactive);
        };
        let result = self.apply_selection(scene, index, &mut state, ids, mode);
        self.state = Some(state);
        result
    }

    fn apply_selection<I, S>(
        &mut self,
        scene: &mut Scene,
        index: &IdentityIndex,
        state: &mut IsolationState,
        ids: I,
        mode: Option<IsolationMode>,
    ) -> Result<SelectionDelta>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let selected_ids: FxHashSet<String> =
            ids.into_iter().map(|id| id.as_ref().trim().to_string()).collect();
        let selected_meshes = index.lookup(&selected_ids);
        let new_mode = mode.unwrap_or(state.mode);
        let mode_changed = new_mode != state.mode;

        let entered: Vec<NodeKey> = selected_meshes
            .difference(&state.selected_meshes)
            .copied()
            .collect();
        let left: Vec<NodeKey> = state
            .selected_meshes
            .difference(&selected_meshes)
            .copied()
            .collect();

        for &mesh in &entered {
            state.isolated_meshes.remove(&mesh);
            if is_live_mesh(scene, mesh) {
                self.reveal(scene, mesh)?;
            }
        }

        if mode_changed {
            self.ensure_shared(scene);
            for &mesh in &state.isolated_meshes {
                if is_live_mesh(scene, mesh) {
                    self.dress(scene, mesh, new_mode)?;
                }
            }
        }

        for &mesh in &left {
            if is_live_mesh(scene, mesh) {
                self.isolate(scene, mesh, new_mode)?;
                state.isolated_meshes.insert(mesh);
            }
        }

        state.mode = new_mode;
        state.selected_ids = selected_ids;
        state.selected_meshes = selected_meshes;

        let delta = SelectionDelta {
            entered: entered.len(),
            left: left.len(),
            mode_changed,
        };
        tracing::debug!(
            entered = delta.entered,
            left = delta.left,
            mode = %new_mode,
            mode_changed,
            "Isolation selection updated"
        );
        Ok(delta)
    }

    /// Puts every saved original back, then sweeps the scene for meshes
    /// still wearing an isolation material and restores their backups.
    /// Returns the number of meshes restored.
    pub fn disable(&mut self, scene: &mut Scene) -> Result<usize> {
        let mut restored = 0;
        for (mesh, original) in self.originals.drain() {
            if !is_live_mesh(scene, mesh) {
                continue;
            }
            scene.set_mesh_materials(mesh, original)?;
            restored += 1;
        }

        let mut swept = 0;
        for mesh in scene.mesh_nodes() {
            if scene.mesh_wears(mesh, Material::is_isolation) && scene.restore_backup(mesh)? {
                swept += 1;
            }
        }
        if swept > 0 {
            tracing::warn!(swept, "Restored isolated meshes missing from the saved set");
        }

        let was_active = self.state.take().is_some();
        if was_active {
            tracing::info!(restored = restored + swept, "Isolation disabled");
        }
        Ok(restored + swept)
    }

    fn ensure_shared(&mut self, scene: &mut Scene) -> bool {
        if self.shared.is_some() {
            return false;
        }
        let wireframe = scene.add_material(
            shared_material("isolation-wireframe", &self.wireframe_style).with_wireframe(true),
        );
        let ghost = scene.add_material(shared_material("isolation-ghost", &self.ghost_style));
        self.shared = Some(SharedMaterials { wireframe, ghost });
        tracing::debug!("Created shared isolation materials");
        true
    }

    /// Saves the mesh's current slots once and dresses it for `mode`.
    fn isolate(&mut self, scene: &mut Scene, mesh: NodeKey, mode: IsolationMode) -> Result<()> {
        if !self.originals.contains_key(&mesh) {
            if let Some(current) = scene.mesh_materials(mesh) {
                self.originals.insert(mesh, current.clone());
            }
        }
        self.dress(scene, mesh, mode)
    }

    fn dress(&self, scene: &mut Scene, mesh: NodeKey, mode: IsolationMode) -> Result<()> {
        let Some(shared) = self.shared else {
            return Ok(());
        };
        let len = scene.mesh_materials(mesh).map_or(1, |slots| slots.len().max(1));
        let slots: MaterialSlots = std::iter::repeat(shared.key(mode)).take(len).collect();
        scene.substitute_materials(mesh, slots)?;
        Ok(())
    }

    /// Gives a mesh its saved original back. A mesh wearing a highlight
    /// keeps it, and the original becomes its backup so clearing the
    /// highlight later lands on the mesh's own materials.
    fn reveal(&mut self, scene: &mut Scene, mesh: NodeKey) -> Result<()> {
        let Some(original) = self.originals.remove(&mesh) else {
            return Ok(());
        };
        if !scene.mesh_wears(mesh, Material::is_highlight) {
            scene.set_mesh_materials(mesh, original)?;
            return Ok(());
        }
        let original_is_highlight = original
            .iter()
            .any(|&key| scene.material(key).is_some_and(Material::is_highlight));
        if !original_is_highlight {
            scene.set_mesh_backup(mesh, original)?;
        }
        Ok(())
    }
}

fn shared_material(name: &str, style: &MaterialStyle) -> Material {
    Material::new(name)
        .with_role(MaterialRole::Isolation)
        .with_color(Color::from_hex(style.color))
        .with_opacity(style.opacity)
        .with_side(Side::Double)
        .with_depth_write(false)
}

fn is_live_mesh(scene: &Scene, mesh: NodeKey) -> bool {
    scene.node(mesh).is_some_and(|n| n.is_mesh())
}
