// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based scene storage.
//!
//! Keys are created by `slotmap::SlotMap` and stay valid while other nodes
//! or materials are removed (generational indices). A [`MaterialKey`] is also
//! the identity of a material: two meshes share a material exactly when they
//! hold the same key.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a scene node (group or mesh).
    pub struct NodeKey;

    /// Key for a material stored in the scene.
    pub struct MaterialKey;
}
