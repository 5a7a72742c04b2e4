// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Camera framing of element sets with an eased transition.
//!
//! The animation is a small state machine advanced by the host's frame
//! loop through [`FocusEngine::tick`]. A new focus request replaces any
//! animation in flight.

use std::time::Duration;

use bimview_scene::{Aabb, Camera, NodeKey, OrbitControls, Point3, Scene, Vector3};

use crate::config::ViewerConfig;
use crate::identity::IdentityIndex;

/// Cubic ease-in-out on `[0, 1]`; input outside the range is clamped.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Exact at both ends: `t = 0` yields `a`, `t = 1` yields `b`.
#[inline]
fn lerp(a: &Point3<f64>, b: &Point3<f64>, t: f64) -> Point3<f64> {
    Point3::from(a.coords * (1.0 - t) + b.coords * t)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusSettings {
    pub distance_factor: f64,
    pub min_distance: f64,
    pub vertical_threshold: f64,
    pub elevation_factor: f64,
    pub default_direction: Vector3<f64>,
    pub duration: Duration,
}

impl FocusSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        let [x, y, z] = config.default_view_direction;
        Self {
            distance_factor: config.focus_distance_factor,
            min_distance: config.focus_min_distance,
            vertical_threshold: config.vertical_threshold,
            elevation_factor: config.elevation_factor,
            default_direction: Vector3::new(x, y, z),
            duration: config.focus_duration(),
        }
    }
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self::from_config(&ViewerConfig::default())
    }
}

/// `found` is false when no mesh matched or the matches have no extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusResult {
    pub found: bool,
    pub count: usize,
}

impl FocusResult {
    pub const NOT_FOUND: FocusResult = FocusResult {
        found: false,
        count: 0,
    };
}

/// Where the camera should end up to frame a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusPlan {
    pub bounds: Aabb,
    pub position: Point3<f64>,
    pub target: Point3<f64>,
    pub distance: f64,
}

/// Frames `bounds` keeping the current viewing direction, unless it is
/// nearly vertical. Returns `None` for an empty or non-finite box.
pub fn plan_focus(
    bounds: &Aabb,
    camera_position: &Point3<f64>,
    orbit_target: &Point3<f64>,
    settings: &FocusSettings,
) -> Option<FocusPlan> {
    if bounds.is_empty() || !bounds.min.coords.iter().chain(bounds.max.coords.iter()).all(|v| v.is_finite()) {
        return None;
    }

    let center = bounds.center();
    let distance = (bounds.max_dimension() * settings.distance_factor).max(settings.min_distance);

    let fallback = settings
        .default_direction
        .try_normalize(1e-12)
        .unwrap_or_else(|| Vector3::new(1.0, 0.6, 1.0).normalize());
    let direction = match (camera_position - orbit_target).try_normalize(1e-12) {
        Some(d) if d.y.abs() <= settings.vertical_threshold => d,
        _ => fallback,
    };

    let mut position = center + direction * distance;
    let min_height = center.y + distance * settings.elevation_factor;
    if position.y < min_height {
        position.y = min_height;
    }

    Some(FocusPlan {
        bounds: *bounds,
        position,
        target: center,
        distance,
    })
}

/// Union of the world bounds of `meshes`.
pub fn union_bounds<'a>(scene: &Scene, meshes: impl IntoIterator<Item = &'a NodeKey>) -> Aabb {
    let mut aabb = Aabb::empty();
    for &mesh in meshes {
        aabb.union(&scene.world_bounds(mesh));
    }
    aabb
}

/// One camera transition.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraAnimation {
    pub start_position: Point3<f64>,
    pub end_position: Point3<f64>,
    pub start_target: Point3<f64>,
    pub end_target: Point3<f64>,
    /// Latched on the first tick.
    pub started_at: Option<Duration>,
    pub duration: Duration,
    id: u64,
}

impl CameraAnimation {
    /// Request number; a later request always has a larger id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Linear progress at `now`, latching the start time on first use.
    pub fn progress_at(&mut self, now: Duration) -> f64 {
        let start = *self.started_at.get_or_insert(now);
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(start).as_secs_f64();
        (elapsed / self.duration.as_secs_f64()).min(1.0)
    }

    /// Camera position and orbit target at eased progress `t`.
    pub fn sample(&self, t: f64) -> (Point3<f64>, Point3<f64>) {
        (
            lerp(&self.start_position, &self.end_position, t),
            lerp(&self.start_target, &self.end_target, t),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationStatus {
    Idle,
    /// Linear progress after this tick.
    Running(f64),
    Finished,
}

#[derive(Debug, Clone, Default)]
pub struct FocusEngine {
    settings: FocusSettings,
    animation: Option<CameraAnimation>,
    requests: u64,
}

impl FocusEngine {
    pub fn new(settings: FocusSettings) -> Self {
        Self {
            settings,
            animation: None,
            requests: 0,
        }
    }

    pub fn settings(&self) -> &FocusSettings {
        &self.settings
    }

    pub fn animation(&self) -> Option<&CameraAnimation> {
        self.animation.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Starts a transition framing the meshes of `ids`. Replaces any
    /// transition in flight; on no match the camera is left alone.
    pub fn focus<I, S>(
        &mut self,
        scene: &Scene,
        index: &IdentityIndex,
        camera: &Camera,
        controls: &OrbitControls,
        ids: I,
    ) -> FocusResult
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let meshes = index.lookup(ids);
        if meshes.is_empty() {
            tracing::warn!("Focus request matched no meshes");
            return FocusResult::NOT_FOUND;
        }

        let bounds = union_bounds(scene, &meshes);
        let Some(plan) = plan_focus(&bounds, &camera.position, &controls.target, &self.settings)
        else {
            tracing::warn!(meshes = meshes.len(), "Focus target has no extent");
            return FocusResult::NOT_FOUND;
        };

        self.requests += 1;
        self.animation = Some(CameraAnimation {
            start_position: camera.position,
            end_position: plan.position,
            start_target: controls.target,
            end_target: plan.target,
            started_at: None,
            duration: self.settings.duration,
            id: self.requests,
        });

        tracing::info!(
            meshes = meshes.len(),
            distance = plan.distance,
            request = self.requests,
            "Camera focus started"
        );
        FocusResult {
            found: true,
            count: meshes.len(),
        }
    }

    /// Advances the transition to `now` (a monotonic timestamp) and moves
    /// the camera and orbit target.
    pub fn tick(
        &mut self,
        now: Duration,
        camera: &mut Camera,
        controls: &mut OrbitControls,
    ) -> AnimationStatus {
        let Some(animation) = self.animation.as_mut() else {
            return AnimationStatus::Idle;
        };
        let progress = animation.progress_at(now);
        let (position, target) = animation.sample(ease_in_out_cubic(progress));
        camera.position = position;
        controls.target = target;
        controls.update(camera);

        if progress >= 1.0 {
            tracing::debug!(request = animation.id, "Camera focus finished");
            self.animation = None;
            AnimationStatus::Finished
        } else {
            AnimationStatus::Running(progress)
        }
    }

    /// Drops the transition in flight, leaving the camera where it is.
    pub fn cancel(&mut self) -> bool {
        self.animation.take().is_some()
    }
}
