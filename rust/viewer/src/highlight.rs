// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection highlight.
//!
//! Highlighted meshes wear one shared highlight material. Isolation never
//! replaces it on a selected mesh; on an isolated mesh the highlight goes
//! into the isolation engine's saved original instead of the live slots.

use bimview_scene::{Color, Material, MaterialKey, MaterialRole, MaterialSlots, NodeKey, Scene};
use rustc_hash::FxHashSet;

use crate::config::MaterialStyle;
use crate::error::Result;
use crate::identity::IdentityIndex;
use crate::isolation::IsolationEngine;

/// Outcome of [`Highlighter::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightReport {
    /// Meshes highlighted after the call.
    pub count: usize,
    pub material_created: bool,
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    style: MaterialStyle,
    material: Option<MaterialKey>,
    meshes: FxHashSet<NodeKey>,
}

impl Highlighter {
    pub fn new(style: MaterialStyle) -> Self {
        Self {
            style,
            material: None,
            meshes: FxHashSet::default(),
        }
    }

    pub fn material(&self) -> Option<MaterialKey> {
        self.material
    }

    pub fn meshes(&self) -> &FxHashSet<NodeKey> {
        &self.meshes
    }

    pub fn is_highlighted(&self, mesh: NodeKey) -> bool {
        self.meshes.contains(&mesh)
    }

    /// Forgets the highlight material and meshes without touching the scene.
    pub fn reset_session(&mut self) {
        self.material = None;
        self.meshes.clear();
    }

    /// Highlights exactly the meshes of `ids`, un-highlighting the rest.
    pub fn set<I, S>(
        &mut self,
        scene: &mut Scene,
        index: &IdentityIndex,
        isolation: &mut IsolationEngine,
        ids: I,
    ) -> Result<HighlightReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted = index.lookup(ids);
        let stale: Vec<NodeKey> = self.meshes.difference(&wanted).copied().collect();
        for mesh in stale {
            self.unhighlight(scene, isolation, mesh)?;
            self.meshes.remove(&mesh);
        }

        let had_material = self.material.is_some();
        for mesh in wanted {
            if self.meshes.contains(&mesh) || !scene.node(mesh).is_some_and(|n| n.is_mesh()) {
                continue;
            }
            let key = self.ensure_material(scene);
            let len = scene.mesh_materials(mesh).map_or(1, |slots| slots.len().max(1));
            let slots: MaterialSlots = std::iter::repeat(key).take(len).collect();
            if isolation.is_isolated(mesh) {
                isolation.replace_saved(mesh, slots);
            } else {
                scene.substitute_materials(mesh, slots)?;
            }
            self.meshes.insert(mesh);
        }

        tracing::debug!(count = self.meshes.len(), "Highlight updated");
        Ok(HighlightReport {
            count: self.meshes.len(),
            material_created: !had_material && self.material.is_some(),
        })
    }

    /// Removes every highlight. Returns the number of meshes restored.
    pub fn clear(&mut self, scene: &mut Scene, isolation: &mut IsolationEngine) -> Result<usize> {
        let mut restored = 0;
        for mesh in std::mem::take(&mut self.meshes) {
            if self.unhighlight(scene, isolation, mesh)? {
                restored += 1;
            }
        }
        Ok(restored)
    }

    fn ensure_material(&mut self, scene: &mut Scene) -> MaterialKey {
        if let Some(key) = self.material {
            return key;
        }
        let key = scene.add_material(
            Material::new("highlight")
                .with_role(MaterialRole::Highlight)
                .with_color(Color::from_hex(self.style.color))
                .with_opacity(self.style.opacity),
        );
        self.material = Some(key);
        key
    }

    fn unhighlight(
        &self,
        scene: &mut Scene,
        isolation: &mut IsolationEngine,
        mesh: NodeKey,
    ) -> Result<bool> {
        let Some(backup) = scene.mesh_backup(mesh).cloned() else {
            return Ok(false);
        };
        if isolation.is_isolated(mesh) {
            return Ok(isolation.replace_saved(mesh, backup));
        }
        if !scene.mesh_wears(mesh, Material::is_highlight) {
            return Ok(false);
        }
        scene.set_mesh_materials(mesh, backup)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::identity::IdPolicy;
    use crate::isolation::IsolationMode;
    use bimview_scene::{Geometry, Point3};

    fn scene_with(ids: &[&str]) -> (Scene, Vec<NodeKey>) {
        let mut scene = Scene::new();
        let geometry = Geometry::cuboid(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        let mut meshes = Vec::new();
        for id in ids {
            let material = scene.add_material(Material::new(*id));
            meshes.push(scene.add_mesh(scene.root(), *id, geometry.clone(), material).unwrap());
        }
        (scene, meshes)
    }

    #[test]
    fn set_and_clear() {
        let (mut scene, meshes) = scene_with(&["A1", "B2"]);
        let index = IdentityIndex::build(&scene, &IdPolicy::default());
        let mut isolation = IsolationEngine::default();
        let mut highlighter = Highlighter::new(ViewerConfig::default().highlight);
        let original = scene.mesh_materials(meshes[0]).cloned().unwrap();

        let report = highlighter.set(&mut scene, &index, &mut isolation, ["A1"]).unwrap();
        assert_eq!(report, HighlightReport { count: 1, material_created: true });
        assert!(scene.mesh_wears(meshes[0], Material::is_highlight));

        // Moving the highlight restores the previous mesh
        highlighter.set(&mut scene, &index, &mut isolation, ["B2"]).unwrap();
        assert_eq!(scene.mesh_materials(meshes[0]).cloned().unwrap(), original);
        assert!(scene.mesh_wears(meshes[1], Material::is_highlight));

        assert_eq!(highlighter.clear(&mut scene, &mut isolation).unwrap(), 1);
        assert!(!scene.mesh_wears(meshes[1], Material::is_highlight));
        assert!(highlighter.meshes().is_empty());
    }

    #[test]
    fn isolation_keeps_selected_highlight() {
        let (mut scene, meshes) = scene_with(&["A1", "B2"]);
        let index = IdentityIndex::build(&scene, &IdPolicy::default());
        let mut isolation = IsolationEngine::default();
        let mut highlighter = Highlighter::new(ViewerConfig::default().highlight);

        highlighter.set(&mut scene, &index, &mut isolation, ["A1"]).unwrap();
        isolation.enable(&mut scene, &index, ["A1"], IsolationMode::Ghost).unwrap();
        assert!(scene.mesh_wears(meshes[0], Material::is_highlight));
        assert!(scene.mesh_wears(meshes[1], Material::is_isolation));
    }

    #[test]
    fn highlight_on_isolated_mesh_lands_after_disable() {
        let (mut scene, meshes) = scene_with(&["A1", "B2"]);
        let index = IdentityIndex::build(&scene, &IdPolicy::default());
        let mut isolation = IsolationEngine::default();
        let mut highlighter = Highlighter::new(ViewerConfig::default().highlight);
        let original = scene.mesh_materials(meshes[1]).cloned().unwrap();

        isolation.enable(&mut scene, &index, ["A1"], IsolationMode::Wireframe).unwrap();
        highlighter.set(&mut scene, &index, &mut isolation, ["B2"]).unwrap();
        assert!(scene.mesh_wears(meshes[1], Material::is_isolation));

        isolation.disable(&mut scene).unwrap();
        assert!(scene.mesh_wears(meshes[1], Material::is_highlight));

        highlighter.clear(&mut scene, &mut isolation).unwrap();
        assert_eq!(scene.mesh_materials(meshes[1]).cloned().unwrap(), original);
    }
}
