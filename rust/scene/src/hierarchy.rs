// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only view of a node tree for identifier and label resolution.

use crate::keys::NodeKey;
use crate::scene::Scene;

/// What identifier and label lookups need from a tree: a node's name, its
/// attributes and its parent.
pub trait Hierarchy {
    type Key: Copy + Eq;

    fn name(&self, key: Self::Key) -> Option<&str>;

    fn attribute(&self, key: Self::Key, attribute: &str) -> Option<&str>;

    /// Parent of `key`; `None` for the root.
    fn parent(&self, key: Self::Key) -> Option<Self::Key>;

    /// Up to `max_depth` ancestors of `key`, nearest first, never including
    /// the root itself.
    fn bounded_ancestors(&self, key: Self::Key, max_depth: usize) -> Vec<Self::Key> {
        let mut out = Vec::new();
        let mut current = self.parent(key);
        while let Some(k) = current {
            if out.len() == max_depth {
                break;
            }
            let next = self.parent(k);
            if next.is_none() {
                break; // k is the root
            }
            out.push(k);
            current = next;
        }
        out
    }
}

impl Hierarchy for Scene {
    type Key = NodeKey;

    fn name(&self, key: NodeKey) -> Option<&str> {
        self.node(key).map(|n| n.name())
    }

    fn attribute(&self, key: NodeKey, attribute: &str) -> Option<&str> {
        self.node(key).and_then(|n| n.attribute(attribute))
    }

    fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        Scene::parent(self, key)
    }
}
