// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based scene graph storage.
//!
//! The [`Scene`] owns every node and every material. Nodes form a tree rooted
//! at [`Scene::root`] through parent keys (upward) and child lists
//! (downward). Mesh nodes reference materials by key, so one material can be
//! worn by any number of meshes and identity is the key itself.

use nalgebra::Matrix4;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::keys::{MaterialKey, NodeKey};
use crate::material::{Material, MaterialSlots};

/// Free-form string attributes attached to a node (element id, type, ...).
pub type Attributes = FxHashMap<String, String>;

/// Renderable part of a mesh node.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub geometry: Geometry,
    materials: MaterialSlots,
    /// The mesh's own materials, captured the first time any feature swaps them.
    backup: Option<MaterialSlots>,
}

impl MeshData {
    /// Materials currently assigned.
    pub fn materials(&self) -> &MaterialSlots {
        &self.materials
    }

    /// Materials the mesh wore before its first substitution, if any.
    pub fn backup(&self) -> Option<&MaterialSlots> {
        self.backup.as_ref()
    }
}

/// A node of the scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    name: String,
    attributes: Attributes,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    /// Transform relative to the parent.
    pub transform: Matrix4<f64>,
    /// Local visibility flag; see [`Scene::is_visible`] for the inherited value.
    pub visible: bool,
    mesh: Option<MeshData>,
}

impl SceneNode {
    fn new(name: String, parent: Option<NodeKey>, mesh: Option<MeshData>) -> Self {
        Self {
            name,
            attributes: Attributes::default(),
            parent,
            children: Vec::new(),
            transform: Matrix4::identity(),
            visible: true,
            mesh,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Value of attribute `key`, if set.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn mesh(&self) -> Option<&MeshData> {
        self.mesh.as_ref()
    }

    #[inline]
    pub fn is_mesh(&self) -> bool {
        self.mesh.is_some()
    }
}

/// The scene graph: nodes and the materials their meshes wear.
///
/// # Example
///
/// ```
/// use bimview_scene::{Geometry, Material, Point3, Scene};
///
/// let mut scene = Scene::new();
/// let concrete = scene.add_material(Material::new("concrete"));
/// let storey = scene.add_group(scene.root(), "Level 1").unwrap();
/// let wall = scene
///     .add_mesh(storey, "Wall", Geometry::cuboid(Point3::origin(), Point3::new(4.0, 3.0, 0.2)), concrete)
///     .unwrap();
///
/// assert_eq!(scene.parent(wall), Some(storey));
/// assert_eq!(scene.mesh_nodes(), vec![wall]);
/// ```
#[derive(Debug, Clone)]
pub struct Scene {
    pub(crate) nodes: SlotMap<NodeKey, SceneNode>,
    pub(crate) materials: SlotMap<MaterialKey, Material>,
    root: NodeKey,
    generation: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates a scene containing only its root group.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(SceneNode::new("Scene".to_string(), None, None));
        Self {
            nodes,
            materials: SlotMap::with_key(),
            root,
            generation: 0,
        }
    }

    /// The root group every other node descends from.
    #[inline]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Counter bumped on every change to structure, names or attributes.
    ///
    /// Derived indexes compare it to detect that they are stale. Material
    /// assignment, transforms and visibility do not bump it.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    // --- Node operations ---

    /// Adds an empty group under `parent`.
    pub fn add_group(&mut self, parent: NodeKey, name: impl Into<String>) -> Result<NodeKey> {
        self.insert_node(parent, SceneNode::new(name.into(), Some(parent), None))
    }

    /// Adds a mesh wearing a single material under `parent`.
    pub fn add_mesh(
        &mut self,
        parent: NodeKey,
        name: impl Into<String>,
        geometry: Geometry,
        material: MaterialKey,
    ) -> Result<NodeKey> {
        self.add_mesh_with_slots(parent, name, geometry, crate::material::single_slot(material))
    }

    /// Adds a mesh with one material per geometry group under `parent`.
    pub fn add_mesh_with_slots(
        &mut self,
        parent: NodeKey,
        name: impl Into<String>,
        geometry: Geometry,
        materials: MaterialSlots,
    ) -> Result<NodeKey> {
        self.check_slots(&materials)?;
        let mesh = MeshData {
            geometry,
            materials,
            backup: None,
        };
        self.insert_node(parent, SceneNode::new(name.into(), Some(parent), Some(mesh)))
    }

    fn insert_node(&mut self, parent: NodeKey, node: SceneNode) -> Result<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return Err(Error::NodeNotFound(parent));
        }
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        self.touch();
        Ok(key)
    }

    /// Returns the node for `key`, or `None` if not found.
    pub fn node(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Number of nodes including the root.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn set_name(&mut self, key: NodeKey, name: impl Into<String>) -> Result<()> {
        let node = self.nodes.get_mut(key).ok_or(Error::NodeNotFound(key))?;
        node.name = name.into();
        self.touch();
        Ok(())
    }

    /// Sets attribute `name` on a node, replacing any previous value.
    pub fn set_attribute(
        &mut self,
        key: NodeKey,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let node = self.nodes.get_mut(key).ok_or(Error::NodeNotFound(key))?;
        node.attributes.insert(name.into(), value.into());
        self.touch();
        Ok(())
    }

    pub fn set_transform(&mut self, key: NodeKey, transform: Matrix4<f64>) -> Result<()> {
        let node = self.nodes.get_mut(key).ok_or(Error::NodeNotFound(key))?;
        node.transform = transform;
        Ok(())
    }

    pub fn set_visible(&mut self, key: NodeKey, visible: bool) -> Result<()> {
        let node = self.nodes.get_mut(key).ok_or(Error::NodeNotFound(key))?;
        node.visible = visible;
        Ok(())
    }

    /// Moves `child` (with its subtree) under `parent`.
    pub fn attach(&mut self, child: NodeKey, parent: NodeKey) -> Result<()> {
        if child == self.root {
            return Err(Error::RootImmutable);
        }
        if !self.nodes.contains_key(child) {
            return Err(Error::NodeNotFound(child));
        }
        if !self.nodes.contains_key(parent) {
            return Err(Error::NodeNotFound(parent));
        }
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(Error::Cycle { child, parent });
        }

        if let Some(old) = self.nodes[child].parent {
            if let Some(old_parent) = self.nodes.get_mut(old) {
                old_parent.children.retain(|&c| c != child);
            }
        }
        self.nodes[parent].children.push(child);
        self.nodes[child].parent = Some(parent);
        self.touch();
        Ok(())
    }

    /// Removes a node and its whole subtree. Materials stay in the scene.
    pub fn remove(&mut self, key: NodeKey) -> Result<usize> {
        if key == self.root {
            return Err(Error::RootImmutable);
        }
        let parent = self.nodes.get(key).ok_or(Error::NodeNotFound(key))?.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|&c| c != key);
        }

        let doomed = self.descendants(key);
        for k in &doomed {
            self.nodes.remove(*k);
        }
        self.touch();
        Ok(doomed.len())
    }

    // --- Mesh material slots ---

    /// Materials currently worn by a mesh.
    pub fn mesh_materials(&self, key: NodeKey) -> Option<&MaterialSlots> {
        self.nodes.get(key)?.mesh.as_ref().map(|m| &m.materials)
    }

    /// Materials a mesh wore before its first substitution.
    pub fn mesh_backup(&self, key: NodeKey) -> Option<&MaterialSlots> {
        self.nodes.get(key)?.mesh.as_ref()?.backup.as_ref()
    }

    /// Assigns materials to a mesh without touching its backup.
    pub fn set_mesh_materials(&mut self, key: NodeKey, materials: MaterialSlots) -> Result<()> {
        self.check_slots(&materials)?;
        self.mesh_mut(key)?.materials = materials;
        Ok(())
    }

    /// Assigns stand-in materials to a mesh, first recording the mesh's own
    /// materials as its backup if none was recorded yet.
    pub fn substitute_materials(&mut self, key: NodeKey, materials: MaterialSlots) -> Result<()> {
        self.check_slots(&materials)?;
        let mesh = self.mesh_mut(key)?;
        if mesh.backup.is_none() {
            mesh.backup = Some(mesh.materials.clone());
        }
        mesh.materials = materials;
        Ok(())
    }

    /// Records the mesh's current materials as its backup unless one exists.
    pub fn ensure_backup(&mut self, key: NodeKey) -> Result<()> {
        let mesh = self.mesh_mut(key)?;
        if mesh.backup.is_none() {
            mesh.backup = Some(mesh.materials.clone());
        }
        Ok(())
    }

    /// Overwrites the mesh's backup with `materials`.
    pub fn set_mesh_backup(&mut self, key: NodeKey, materials: MaterialSlots) -> Result<()> {
        self.check_slots(&materials)?;
        self.mesh_mut(key)?.backup = Some(materials);
        Ok(())
    }

    /// Puts the backup materials back on the mesh. Returns `false` when the
    /// mesh was never substituted.
    pub fn restore_backup(&mut self, key: NodeKey) -> Result<bool> {
        let mesh = self.mesh_mut(key)?;
        match mesh.backup.clone() {
            Some(backup) => {
                mesh.materials = backup;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// True if any material the mesh currently wears satisfies `pred`.
    pub fn mesh_wears(&self, key: NodeKey, pred: impl Fn(&Material) -> bool) -> bool {
        self.mesh_materials(key).is_some_and(|slots| {
            slots
                .iter()
                .any(|&m| self.materials.get(m).is_some_and(&pred))
        })
    }

    fn mesh_mut(&mut self, key: NodeKey) -> Result<&mut MeshData> {
        self.nodes
            .get_mut(key)
            .ok_or(Error::NodeNotFound(key))?
            .mesh
            .as_mut()
            .ok_or(Error::NotAMesh(key))
    }

    fn check_slots(&self, materials: &MaterialSlots) -> Result<()> {
        if materials.is_empty() {
            return Err(Error::EmptyMaterialSlots);
        }
        match materials.iter().find(|&&m| !self.materials.contains_key(m)) {
            Some(&missing) => Err(Error::MaterialNotFound(missing)),
            None => Ok(()),
        }
    }

    // --- Material operations ---

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.materials.insert(material)
    }

    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Iterates over every material owned by the scene, worn or not.
    pub fn materials(&self) -> impl Iterator<Item = (MaterialKey, &Material)> {
        self.materials.iter()
    }

    /// Mutable iteration over every material owned by the scene.
    pub fn materials_mut(&mut self) -> impl Iterator<Item = (MaterialKey, &mut Material)> {
        self.materials.iter_mut()
    }
}
