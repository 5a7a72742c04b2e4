// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BimView Viewer
//!
//! Interactive scene manipulation for BIM models: section planes picked
//! from the surface under the pointer, x-ray/ghost isolation of element
//! sets, selection highlight and eased camera framing.
//!
//! All engines resolve element ids through one [`IdentityIndex`] and share
//! one [`MaterialLedger`], so clipping, isolation and highlight can be
//! layered and undone in any order. The [`Viewer`] facade owns the scene
//! and the engines and is driven by the host's event and frame loop.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bimview_viewer::{IsolationMode, Viewer, ViewerConfig};
//!
//! let mut viewer = Viewer::new(ViewerConfig::from_env());
//! viewer.set_scene(scene);
//! viewer.set_camera(camera);
//! viewer.set_controls(controls);
//!
//! viewer.enable_xray(["A1"], IsolationMode::Ghost);
//! let result = viewer.focus_on_elements(["A1"]);
//! while viewer.tick(frame_time()) {}
//! ```

pub mod config;
pub mod error;
pub mod focus;
pub mod highlight;
pub mod identity;
pub mod isolation;
pub mod ledger;
pub mod section;
pub mod viewer;

pub use config::{MaterialStyle, ViewerConfig};
pub use error::{Error, Result};
pub use focus::{
    ease_in_out_cubic, plan_focus, union_bounds, AnimationStatus, CameraAnimation, FocusEngine,
    FocusPlan, FocusResult, FocusSettings,
};
pub use highlight::{HighlightReport, Highlighter};
pub use identity::{element_candidates, node_identifiers, IdPolicy, IdShape, IdentityIndex};
pub use isolation::{IsolationEngine, IsolationMode, IsolationReport, IsolationState, SelectionDelta};
pub use ledger::{MaterialLedger, MaterialSnapshot};
pub use section::{
    apply_plane, key_action, resolve_label, Modifiers, PickOutcome, PointerEvent, SectionEngine,
    SectionKey, SectionMode, SectionPlaneState, SectionSettings,
};
pub use viewer::Viewer;
