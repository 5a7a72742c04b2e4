// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capture-once ledger of material clipping state.
//!
//! Before a feature mutates a material it records the fields it is about to
//! change. A recorded snapshot is never overwritten; it is consumed when the
//! material is restored. Keyed by [`MaterialKey`], so a material shared by
//! many meshes is recorded once.

use bimview_scene::{ClipPlane, Material, MaterialKey};
use rustc_hash::FxHashMap;

/// Clipping and polygon-offset fields of a material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSnapshot {
    pub clipping_planes: Option<Vec<ClipPlane>>,
    pub polygon_offset: bool,
    pub polygon_offset_factor: f32,
    pub polygon_offset_units: f32,
}

impl MaterialSnapshot {
    pub fn of(material: &Material) -> Self {
        Self {
            clipping_planes: material.clipping_planes.clone(),
            polygon_offset: material.polygon_offset,
            polygon_offset_factor: material.polygon_offset_factor,
            polygon_offset_units: material.polygon_offset_units,
        }
    }

    /// Writes the recorded fields back verbatim.
    pub fn restore_into(&self, material: &mut Material) {
        material.clipping_planes = self.clipping_planes.clone();
        material.polygon_offset = self.polygon_offset;
        material.polygon_offset_factor = self.polygon_offset_factor;
        material.polygon_offset_units = self.polygon_offset_units;
    }
}

#[derive(Debug, Default)]
pub struct MaterialLedger {
    snapshots: FxHashMap<MaterialKey, MaterialSnapshot>,
}

impl MaterialLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `material` unless a snapshot for `key` already exists.
    /// Returns `true` if a new snapshot was taken.
    pub fn capture(&mut self, key: MaterialKey, material: &Material) -> bool {
        if self.snapshots.contains_key(&key) {
            return false;
        }
        self.snapshots.insert(key, MaterialSnapshot::of(material));
        true
    }

    /// Restores and forgets the snapshot for `key`. Returns `false` if none
    /// was recorded.
    pub fn restore(&mut self, key: MaterialKey, material: &mut Material) -> bool {
        match self.snapshots.remove(&key) {
            Some(snapshot) => {
                snapshot.restore_into(material);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self, key: MaterialKey) -> Option<&MaterialSnapshot> {
        self.snapshots.get(&key)
    }

    pub fn contains(&self, key: MaterialKey) -> bool {
        self.snapshots.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Forgets every snapshot without restoring anything.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
