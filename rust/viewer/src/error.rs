// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the viewer engines.
///
/// None of these are fatal: the [`crate::Viewer`] facade logs them and
/// reports a flag to its caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no scene has been set")]
    MissingScene,

    #[error("no camera has been set")]
    MissingCamera,

    #[error("no orbit controls have been set")]
    MissingControls,

    #[error("no section plane is active")]
    NoActivePlane,

    #[error("x-ray isolation is not active")]
    IsolationInactive,

    #[error("pointer is outside a zero-sized viewport")]
    EmptyViewport,

    #[error("scene error: {0}")]
    Scene(#[from] bimview_scene::Error),
}
