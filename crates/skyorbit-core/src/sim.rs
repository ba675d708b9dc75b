use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;

use skyorbit_base::Result;
use tracing::trace;

use crate::config::OrbitConfig;
use crate::controller::OrbitController;
use crate::host::{
    EventResult, FrameHandle, FrameScheduler, HostEvent, InputEvent, InputKind, InputSource,
    SceneHost, Stopwatch, TimerHandle, TimerScheduler,
};
use crate::math::{ORIGIN, Vec3};
use crate::setup::{Bounds, NavigationLocks, Projection, ViewFace};

const MAX_CAMERA_NOTIFICATIONS: usize = 8;

#[derive(Clone, Debug, Default)]
pub struct SimClock(Rc<Cell<f64>>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.0.get()
    }

    pub fn advance(&self, ms: f64) {
        self.0.set(self.0.get() + ms.max(0.0));
    }

    fn advance_to(&self, now_ms: f64) {
        self.0.set(now_ms.max(self.0.get()));
    }
}

#[derive(Clone, Debug)]
pub struct SimStopwatch {
    clock: SimClock,
    last: f64,
}

impl SimStopwatch {
    pub fn new(clock: SimClock) -> Self {
        let last = clock.now_ms();
        Self { clock, last }
    }
}

impl Stopwatch for SimStopwatch {
    fn elapsed_ms_since_last_sample(&mut self) -> f64 {
        let now = self.clock.now_ms();
        let elapsed = now - self.last;
        self.last = now;
        elapsed
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetupCall {
    Lock(NavigationLocks),
    Fit(Bounds, bool),
    Face(ViewFace),
    Projection(Projection),
}

#[derive(Debug)]
pub struct SimHost {
    clock: SimClock,
    position: Vec3,
    target: Vec3,
    camera_subscribed: bool,
    camera_changed: bool,
    next_handle: u64,
    frames: Vec<FrameHandle>,
    timers: Vec<(TimerHandle, f64)>,
    setup_calls: Vec<SetupCall>,
    home_view: Option<(Vec3, Vec3)>,
    home_view_captures: usize,
}

impl SimHost {
    pub fn new(clock: SimClock, position: Vec3) -> Self {
        Self {
            clock,
            position,
            target: ORIGIN,
            camera_subscribed: false,
            camera_changed: false,
            next_handle: 0,
            frames: Vec::new(),
            timers: Vec::new(),
            setup_calls: Vec::new(),
            home_view: None,
            home_view_captures: 0,
        }
    }

    pub fn is_camera_subscribed(&self) -> bool {
        self.camera_subscribed
    }

    pub fn pending_frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn timer_due(&self, handle: TimerHandle) -> Option<f64> {
        self.timers
            .iter()
            .find(|(pending, _)| *pending == handle)
            .map(|(_, due)| *due)
    }

    pub fn next_timer_due(&self) -> Option<f64> {
        self.timers.iter().map(|(_, due)| *due).reduce(f64::min)
    }

    pub fn take_due_frames(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.frames)
    }

    pub fn take_due_timers(&mut self) -> Vec<TimerHandle> {
        let now = self.clock.now_ms();
        let mut due: Vec<(TimerHandle, f64)> = Vec::new();
        self.timers.retain(|&(handle, at)| {
            if at <= now {
                due.push((handle, at));
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        due.into_iter().map(|(handle, _)| handle).collect()
    }

    pub fn take_camera_changed(&mut self) -> bool {
        std::mem::replace(&mut self.camera_changed, false)
    }

    pub fn setup_calls(&self) -> &[SetupCall] {
        &self.setup_calls
    }

    pub fn home_view(&self) -> Option<(Vec3, Vec3)> {
        self.home_view
    }

    pub fn home_view_captures(&self) -> usize {
        self.home_view_captures
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl FrameScheduler for SimHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|pending| *pending != handle);
    }
}

impl TimerScheduler for SimHost {
    fn schedule_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_handle());
        let due = self.clock.now_ms() + delay.as_secs_f64() * 1000.0;
        self.timers.push((handle, due));
        handle
    }

    fn cancel_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|(pending, _)| *pending != handle);
    }
}

impl SceneHost for SimHost {
    fn camera_position(&self) -> Vec3 {
        self.position
    }

    fn camera_target(&self) -> Vec3 {
        self.target
    }

    fn set_camera_view(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
        if self.camera_subscribed {
            self.camera_changed = true;
        }
    }

    fn subscribe_camera_changed(&mut self) {
        self.camera_subscribed = true;
    }

    fn unsubscribe_camera_changed(&mut self) {
        self.camera_subscribed = false;
        self.camera_changed = false;
    }

    fn lock_navigation(&mut self, locks: NavigationLocks) {
        self.setup_calls.push(SetupCall::Lock(locks));
    }

    fn fit_bounds(&mut self, bounds: Bounds, immediate: bool) {
        self.setup_calls.push(SetupCall::Fit(bounds, immediate));
    }

    fn set_view_face(&mut self, face: ViewFace) {
        self.setup_calls.push(SetupCall::Face(face));
    }

    fn set_projection(&mut self, projection: Projection) {
        self.setup_calls.push(SetupCall::Projection(projection));
    }

    fn capture_home_view(&mut self) {
        self.home_view = Some((self.position, self.target));
        self.home_view_captures += 1;
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimInput {
    subscribed: HashSet<InputKind>,
}

impl SimInput {
    pub fn is_subscribed(&self, kind: InputKind) -> bool {
        self.subscribed.contains(&kind)
    }
}

impl InputSource for SimInput {
    fn subscribe(&mut self, kind: InputKind) {
        self.subscribed.insert(kind);
    }

    fn unsubscribe(&mut self, kind: InputKind) {
        self.subscribed.remove(&kind);
    }
}

#[derive(Debug)]
pub struct Simulation {
    clock: SimClock,
    host: SimHost,
    input: SimInput,
    controller: OrbitController,
    frame_interval_ms: f64,
    next_frame_at: f64,
    delivered: Vec<(f64, HostEvent)>,
}

impl Simulation {
    pub fn new(config: OrbitConfig, position: Vec3, frame_interval_ms: f64) -> Result<Self> {
        let clock = SimClock::new();
        let controller = OrbitController::new(config, Box::new(SimStopwatch::new(clock.clone())))?;
        let frame_interval_ms = if frame_interval_ms.is_finite() && frame_interval_ms > 0.0 {
            frame_interval_ms
        } else {
            1000.0 / 60.0
        };
        Ok(Self {
            host: SimHost::new(clock.clone(), position),
            input: SimInput::default(),
            controller,
            frame_interval_ms,
            next_frame_at: frame_interval_ms,
            delivered: Vec::new(),
            clock,
        })
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn host(&self) -> &SimHost {
        &self.host
    }

    pub fn input_source(&self) -> &SimInput {
        &self.input
    }

    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    pub fn camera_position(&self) -> Vec3 {
        self.host.camera_position()
    }

    pub fn delivered(&self) -> &[(f64, HostEvent)] {
        &self.delivered
    }

    pub fn timers_fired(&self) -> Vec<f64> {
        self.delivered
            .iter()
            .filter(|(_, event)| matches!(event, HostEvent::Timer(_)))
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn load(&mut self) {
        self.controller.load(&mut self.host, &mut self.input);
    }

    pub fn scene_ready(&mut self) {
        self.deliver(HostEvent::SceneReady);
        self.flush_camera_changes();
    }

    pub fn first_frame_settled(&mut self) {
        self.deliver(HostEvent::FirstFrameSettled);
    }

    pub fn input(&mut self, event: InputEvent) -> EventResult {
        if !self.input.is_subscribed(event.kind()) {
            return EventResult::PASS;
        }
        self.deliver(HostEvent::Input(event))
    }

    pub fn drag_camera_to(&mut self, position: Vec3) {
        let target = self.host.camera_target();
        self.host.set_camera_view(position, target);
        self.flush_camera_changes();
    }

    pub fn advance(&mut self, ms: f64) {
        let end = self.clock.now_ms() + ms.max(0.0);
        loop {
            let timer_due = self.host.next_timer_due().filter(|due| *due <= end);
            let frame_due = Some(self.next_frame_at).filter(|at| *at <= end);
            match (timer_due, frame_due) {
                (Some(timer), Some(frame)) if timer <= frame => self.fire_timers(timer),
                (Some(timer), None) => self.fire_timers(timer),
                (_, Some(frame)) => self.fire_frame(frame),
                (None, None) => break,
            }
        }
        self.clock.advance_to(end);
    }

    pub fn unload(&mut self) {
        self.controller.unload(&mut self.host, &mut self.input);
    }

    fn fire_timers(&mut self, at: f64) {
        self.clock.advance_to(at);
        for handle in self.host.take_due_timers() {
            self.deliver(HostEvent::Timer(handle));
            self.flush_camera_changes();
        }
    }

    fn fire_frame(&mut self, at: f64) {
        self.clock.advance_to(at);
        self.next_frame_at = at + self.frame_interval_ms;
        for handle in self.host.take_due_frames() {
            self.deliver(HostEvent::Frame(handle));
        }
        self.flush_camera_changes();
    }

    fn flush_camera_changes(&mut self) {
        for _ in 0..MAX_CAMERA_NOTIFICATIONS {
            if !self.host.take_camera_changed() {
                break;
            }
            self.deliver(HostEvent::CameraChanged);
        }
    }

    fn deliver(&mut self, event: HostEvent) -> EventResult {
        let at = self.clock.now_ms();
        trace!(at, ?event, "deliver");
        self.delivered.push((at, event));
        self.controller.dispatch(&mut self.host, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_registrations_never_fire() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 300.0));
        let frame = host.request_frame();
        let timer = host.schedule_timeout(Duration::from_millis(10));
        host.cancel_frame(frame);
        host.cancel_timeout(timer);

        clock.advance(20.0);
        assert!(host.take_due_frames().is_empty());
        assert!(host.take_due_timers().is_empty());
    }

    #[test]
    fn timers_come_due_in_order() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 300.0));
        let late = host.schedule_timeout(Duration::from_millis(30));
        let early = host.schedule_timeout(Duration::from_millis(10));
        let never = host.schedule_timeout(Duration::from_millis(100));

        clock.advance(50.0);
        assert_eq!(host.take_due_timers(), vec![early, late]);
        assert_eq!(host.timer_due(never), Some(100.0));
    }

    #[test]
    fn camera_notifications_need_subscription() {
        let mut host = SimHost::new(SimClock::new(), Vec3::new(0.0, 0.0, 300.0));
        host.set_camera_view(Vec3::new(0.0, 0.0, 200.0), ORIGIN);
        assert!(!host.take_camera_changed());

        host.subscribe_camera_changed();
        host.set_camera_view(Vec3::new(0.0, 0.0, 250.0), ORIGIN);
        assert!(host.take_camera_changed());
        assert!(!host.take_camera_changed());
    }

    #[test]
    fn stopwatch_consumes_each_interval() {
        let clock = SimClock::new();
        let mut stopwatch = SimStopwatch::new(clock.clone());
        clock.advance(16.0);
        assert_eq!(stopwatch.elapsed_ms_since_last_sample(), 16.0);
        assert_eq!(stopwatch.elapsed_ms_since_last_sample(), 0.0);
    }

    #[test]
    fn clock_never_runs_backwards() {
        let clock = SimClock::new();
        clock.advance(10.0);
        clock.advance_to(5.0);
        assert_eq!(clock.now_ms(), 10.0);
    }

    #[test]
    fn input_is_ignored_until_loaded() -> Result<()> {
        let mut sim = Simulation::new(OrbitConfig::default(), Vec3::new(0.0, 0.0, 500.0), 16.0)?;
        assert_eq!(sim.input(InputEvent::Press), EventResult::PASS);
        assert!(sim.delivered().is_empty());
        Ok(())
    }
}
