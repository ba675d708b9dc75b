use std::time::{Duration, Instant};

use crate::math::Vec3;
use crate::setup::{Bounds, NavigationLocks, Projection, ViewFace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

pub trait TimerScheduler {
    fn schedule_timeout(&mut self, delay: Duration) -> TimerHandle;
    fn cancel_timeout(&mut self, handle: TimerHandle);
}

pub trait SceneHost: FrameScheduler + TimerScheduler {
    fn camera_position(&self) -> Vec3;
    fn camera_target(&self) -> Vec3;
    fn set_camera_view(&mut self, position: Vec3, target: Vec3);
    fn subscribe_camera_changed(&mut self);
    fn unsubscribe_camera_changed(&mut self);

    fn lock_navigation(&mut self, locks: NavigationLocks);
    fn fit_bounds(&mut self, bounds: Bounds, immediate: bool);
    fn set_view_face(&mut self, face: ViewFace);
    fn set_projection(&mut self, projection: Projection);
    fn capture_home_view(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputKind {
    Scroll,
    Press,
    Release,
}

impl InputKind {
    pub const ALL: [InputKind; 3] = [InputKind::Scroll, InputKind::Press, InputKind::Release];
}

pub trait InputSource {
    fn subscribe(&mut self, kind: InputKind);
    fn unsubscribe(&mut self, kind: InputKind);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Scroll,
    Press,
    Release,
}

impl InputEvent {
    pub fn kind(self) -> InputKind {
        match self {
            InputEvent::Scroll => InputKind::Scroll,
            InputEvent::Press => InputKind::Press,
            InputEvent::Release => InputKind::Release,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EventResult {
    pub handled: bool,
}

impl EventResult {
    pub const HANDLED: Self = Self { handled: true };
    pub const PASS: Self = Self { handled: false };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostEvent {
    Frame(FrameHandle),
    Timer(TimerHandle),
    CameraChanged,
    Input(InputEvent),
    SceneReady,
    FirstFrameSettled,
}

// Every call consumes the interval since the previous call.
pub trait Stopwatch {
    fn elapsed_ms_since_last_sample(&mut self) -> f64;
}

#[derive(Clone, Debug)]
pub struct MonotonicStopwatch {
    last: Instant,
}

impl MonotonicStopwatch {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for MonotonicStopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch for MonotonicStopwatch {
    fn elapsed_ms_since_last_sample(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        elapsed.as_secs_f64() * 1000.0
    }
}
