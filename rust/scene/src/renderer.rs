// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Renderer-side switches the engines depend on.

/// Handle to the host renderer's settings.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    /// Per-material clipping planes are honored only when this is on.
    pub local_clipping_enabled: bool,
    redraw_requested: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the host to draw another frame.
    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    /// Returns and clears the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }
}
