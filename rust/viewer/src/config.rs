// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration, with defaults and environment overrides.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::identity::{IdPolicy, IdShape};

/// Color and opacity of a shared stand-in material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialStyle {
    /// `0xRRGGBB`
    pub color: u32,
    pub opacity: f32,
}

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// How many ancestors above a mesh may carry its element id.
    pub max_ancestor_depth: usize,
    /// Attributes holding an explicit element id, checked in order.
    pub id_attributes: Vec<String>,
    /// Attributes naming an element for section labels, checked in order.
    pub label_attributes: Vec<String>,
    /// Which node names count as element ids.
    pub id_shape: IdShape,
    /// Distance the section plane is pushed off the picked surface.
    pub pick_epsilon: f64,
    /// Offset change per keyboard nudge.
    pub nudge_step: f64,
    /// Camera distance from the plane, in model bounding-sphere radii.
    pub align_distance_factor: f64,
    pub focus_duration_ms: u64,
    /// Camera distance in multiples of the focused box's longest edge.
    pub focus_distance_factor: f64,
    /// Closest the camera gets when framing small elements.
    pub focus_min_distance: f64,
    /// Above this |up| component the current view direction is replaced.
    pub vertical_threshold: f64,
    /// Minimum camera height above the focus center, in distances.
    pub elevation_factor: f64,
    /// Oblique direction used instead of a near-vertical one.
    pub default_view_direction: [f64; 3],
    pub wireframe: MaterialStyle,
    pub ghost: MaterialStyle,
    pub highlight: MaterialStyle,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: 5,
            id_attributes: vec!["id".into(), "globalId".into(), "expressId".into()],
            label_attributes: vec!["type".into(), "name".into()],
            id_shape: IdShape::permissive(),
            pick_epsilon: 0.001,
            nudge_step: 0.05,
            align_distance_factor: 1.5,
            focus_duration_ms: 800,
            focus_distance_factor: 2.0,
            focus_min_distance: 5.0,
            vertical_threshold: 0.95,
            elevation_factor: 0.3,
            default_view_direction: [1.0, 0.6, 1.0],
            wireframe: MaterialStyle {
                color: 0x2c3e50,
                opacity: 0.08,
            },
            ghost: MaterialStyle {
                color: 0x888888,
                opacity: 0.15,
            },
            highlight: MaterialStyle {
                color: 0xff9800,
                opacity: 1.0,
            },
        }
    }
}

impl ViewerConfig {
    /// Defaults overridden by `BIMVIEW_*` environment variables.
    ///
    /// Unset or unparsable variables keep their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_ancestor_depth: env_or("BIMVIEW_MAX_ANCESTOR_DEPTH", defaults.max_ancestor_depth),
            id_attributes: env_list("BIMVIEW_ID_ATTRIBUTES").unwrap_or(defaults.id_attributes),
            label_attributes: env_list("BIMVIEW_LABEL_ATTRIBUTES")
                .unwrap_or(defaults.label_attributes),
            pick_epsilon: env_or("BIMVIEW_PICK_EPSILON", defaults.pick_epsilon),
            nudge_step: env_or("BIMVIEW_NUDGE_STEP", defaults.nudge_step),
            focus_duration_ms: env_or("BIMVIEW_FOCUS_DURATION_MS", defaults.focus_duration_ms),
            focus_min_distance: env_or("BIMVIEW_FOCUS_MIN_DISTANCE", defaults.focus_min_distance),
            ..defaults
        }
    }

    pub fn focus_duration(&self) -> Duration {
        Duration::from_millis(self.focus_duration_ms)
    }

    /// Identifier resolution settings for the identity index.
    pub fn id_policy(&self) -> IdPolicy {
        IdPolicy {
            id_attributes: self.id_attributes.clone(),
            shape: self.id_shape.clone(),
            max_ancestor_depth: self.max_ancestor_depth,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_list(name: &str) -> Option<Vec<String>> {
    let list: Vec<String> = std::env::var(name)
        .ok()?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!list.is_empty()).then_some(list)
}
