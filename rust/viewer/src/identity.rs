// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element identifier to mesh index.
//!
//! Loaded models rarely tag every mesh with its element id. The id may sit
//! on the mesh itself, as an attribute or as the node name, or on a group a
//! few levels up. The index records, for every mesh, each id found on the
//! mesh or on its ancestors (up to a depth limit, never the scene root), so
//! that a lookup returns every mesh belonging to an element.

use bimview_scene::{Hierarchy, NodeKey, Scene};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Shape a node name must have to be taken as an element id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdShape {
    pub min_len: usize,
    pub max_len: usize,
    /// Characters allowed besides ASCII letters and digits.
    pub symbols: String,
}

impl Default for IdShape {
    fn default() -> Self {
        Self::permissive()
    }
}

impl IdShape {
    /// Short alphanumeric tokens with common separators, e.g. `A1`,
    /// `W-203`, `3fJk$9_x`.
    pub fn permissive() -> Self {
        Self {
            min_len: 1,
            max_len: 64,
            symbols: "_$-.:".into(),
        }
    }

    /// Compressed IFC GlobalId: exactly 22 characters of
    /// `[0-9A-Za-z_$]`.
    pub fn ifc_global_id() -> Self {
        Self {
            min_len: 22,
            max_len: 22,
            symbols: "_$".into(),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let len = candidate.chars().count();
        len >= self.min_len
            && len <= self.max_len
            && candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || self.symbols.contains(c))
    }
}

/// Where identifiers are looked for.
#[derive(Debug, Clone, PartialEq)]
pub struct IdPolicy {
    /// Attributes that hold an explicit id, checked in order.
    pub id_attributes: Vec<String>,
    /// Shape a node name must have to count as an id.
    pub shape: IdShape,
    /// Ancestors above a mesh that may carry its id.
    pub max_ancestor_depth: usize,
}

impl Default for IdPolicy {
    fn default() -> Self {
        Self {
            id_attributes: vec!["id".into(), "globalId".into(), "expressId".into()],
            shape: IdShape::permissive(),
            max_ancestor_depth: 5,
        }
    }
}

/// Identifiers carried by one node: non-empty id attributes, then the name
/// if it has the shape of an id.
pub fn node_identifiers<'a, H: Hierarchy>(
    tree: &'a H,
    key: H::Key,
    policy: &IdPolicy,
) -> SmallVec<[&'a str; 4]> {
    let mut out = SmallVec::new();
    for attribute in &policy.id_attributes {
        if let Some(value) = tree.attribute(key, attribute).map(str::trim) {
            if !value.is_empty() && !out.contains(&value) {
                out.push(value);
            }
        }
    }
    if let Some(name) = tree.name(key).map(str::trim) {
        if policy.shape.matches(name) && !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Every identifier a mesh answers to: its own, then those of its bounded
/// ancestors, nearest first, without duplicates.
pub fn element_candidates<'a, H: Hierarchy>(
    tree: &'a H,
    mesh: H::Key,
    policy: &IdPolicy,
) -> SmallVec<[&'a str; 4]> {
    let mut out = node_identifiers(tree, mesh, policy);
    for ancestor in tree.bounded_ancestors(mesh, policy.max_ancestor_depth) {
        for id in node_identifiers(tree, ancestor, policy) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
    }
    out
}

/// Lookup table from element id to the meshes that belong to it.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    by_id: FxHashMap<String, SmallVec<[NodeKey; 2]>>,
    meshes: Vec<NodeKey>,
    generation: Option<u64>,
}

impl IdentityIndex {
    /// An index over no scene; every lookup is empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks every mesh of `scene` once and records it under each of its
    /// candidate identifiers.
    pub fn build(scene: &Scene, policy: &IdPolicy) -> Self {
        let meshes = scene.mesh_nodes();
        let mut by_id: FxHashMap<String, SmallVec<[NodeKey; 2]>> = FxHashMap::default();

        for &mesh in &meshes {
            for id in element_candidates(scene, mesh, policy) {
                by_id.entry(id.to_string()).or_default().push(mesh);
            }
        }

        tracing::debug!(
            meshes = meshes.len(),
            ids = by_id.len(),
            max_depth = policy.max_ancestor_depth,
            "Built identity index"
        );

        Self {
            by_id,
            meshes,
            generation: Some(scene.generation()),
        }
    }

    /// Union of the meshes registered under any of `ids`. Unknown ids
    /// contribute nothing.
    pub fn lookup<I, S>(&self, ids: I) -> FxHashSet<NodeKey>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = FxHashSet::default();
        for id in ids {
            if let Some(meshes) = self.by_id.get(id.as_ref().trim()) {
                out.extend(meshes.iter().copied());
            }
        }
        out
    }

    /// Meshes registered under a single id.
    pub fn meshes_for(&self, id: &str) -> &[NodeKey] {
        self.by_id.get(id.trim()).map_or(&[], |m| m.as_slice())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id.trim())
    }

    /// Every mesh in the indexed scene, in traversal order.
    pub fn meshes(&self) -> &[NodeKey] {
        &self.meshes
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// True if `scene` changed structure since the index was built, or the
    /// index was never built.
    pub fn is_stale(&self, scene: &Scene) -> bool {
        self.generation != Some(scene.generation())
    }
}
