use cgmath::InnerSpace;
use tracing::{debug, trace};

use crate::config::OrbitConfig;
use crate::host::{FrameHandle, SceneHost, Stopwatch};
use crate::interaction::InteractionState;
use crate::math::{ORIGIN, Vec3, clamp_length, perpendicular, rotate_around_axis, within};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimatorState {
    Idle,
    Animating(FrameHandle),
}

#[derive(Debug)]
pub struct OrbitAnimator {
    interaction: InteractionState,
    axis: Vec3,
    rate_rad_per_sec: f64,
    min_distance: f64,
    max_distance: f64,
    state: AnimatorState,
}

impl OrbitAnimator {
    pub(crate) fn new(interaction: InteractionState, config: &OrbitConfig) -> Self {
        Self {
            interaction,
            axis: config.rotation_axis(),
            rate_rad_per_sec: config.angular_rate_rad_per_sec(),
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            state: AnimatorState::Idle,
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, AnimatorState::Animating(_))
    }

    pub fn start<H: SceneHost + ?Sized>(&mut self, host: &mut H, stopwatch: &mut dyn Stopwatch) {
        if self.is_animating() {
            return;
        }
        if self.step(host, stopwatch) {
            debug!("orbit animation started");
        }
    }

    pub fn resume<H: SceneHost + ?Sized>(&mut self, host: &mut H, stopwatch: &mut dyn Stopwatch) {
        if self.is_animating() {
            return;
        }
        // Idle time is not rotation time.
        let _ = stopwatch.elapsed_ms_since_last_sample();
        self.start(host, stopwatch);
    }

    pub fn on_frame<H: SceneHost + ?Sized>(&mut self, host: &mut H, stopwatch: &mut dyn Stopwatch) {
        self.state = AnimatorState::Idle;
        if !self.step(host, stopwatch) {
            debug!("orbit animation halted by user interaction");
        }
    }

    pub fn stop<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        if let AnimatorState::Animating(handle) = self.state {
            host.cancel_frame(handle);
            self.state = AnimatorState::Idle;
            debug!(frame = handle.0, "orbit animation stopped");
        }
    }

    pub fn on_camera_changed<H: SceneHost + ?Sized>(&mut self, host: &mut H) -> bool {
        let position = host.camera_position();
        let distance = position.magnitude();
        if within(distance, self.min_distance, self.max_distance) {
            return false;
        }
        let clamped = clamp_length(
            position,
            self.min_distance,
            self.max_distance,
            perpendicular(self.axis),
        );
        debug!(from = distance, to = clamped.magnitude(), "camera distance clamped");
        host.set_camera_view(clamped, ORIGIN);
        true
    }

    fn step<H: SceneHost + ?Sized>(&mut self, host: &mut H, stopwatch: &mut dyn Stopwatch) -> bool {
        if self.interaction.is_interacting() {
            return false;
        }
        let dt = stopwatch.elapsed_ms_since_last_sample() * 0.001;
        self.rotate(host, dt);
        let handle = host.request_frame();
        self.state = AnimatorState::Animating(handle);
        trace!(dt, frame = handle.0, "orbit frame");
        true
    }

    fn rotate<H: SceneHost + ?Sized>(&self, host: &mut H, dt: f64) {
        let position = host.camera_position();
        let rotated = rotate_around_axis(position, ORIGIN, self.axis, self.rate_rad_per_sec * dt);
        let target = host.camera_target();
        host.set_camera_view(rotated, target);
    }
}
