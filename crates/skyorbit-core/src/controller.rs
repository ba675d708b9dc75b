use skyorbit_base::{Guid, Result};
use tracing::{debug, info, info_span};

use crate::animator::{AnimatorState, OrbitAnimator};
use crate::config::OrbitConfig;
use crate::host::{
    EventResult, HostEvent, InputEvent, InputKind, InputSource, SceneHost, Stopwatch, TimerHandle,
};
use crate::interaction::{InteractionState, InteractionTracker};
use crate::setup::ViewSetup;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Unloaded,
    Loaded,
    Running,
}

pub struct OrbitController {
    id: Guid,
    config: OrbitConfig,
    interaction: InteractionState,
    tracker: InteractionTracker,
    animator: OrbitAnimator,
    setup: ViewSetup,
    stopwatch: Box<dyn Stopwatch>,
    lifecycle: Lifecycle,
}

impl std::fmt::Debug for OrbitController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrbitController")
            .field("id", &self.id)
            .field("lifecycle", &self.lifecycle)
            .field("interacting", &self.interaction.is_interacting())
            .field("animator", &self.animator.state())
            .field("pending_resume", &self.tracker.pending_resume())
            .finish()
    }
}

impl OrbitController {
    pub fn new(config: OrbitConfig, stopwatch: Box<dyn Stopwatch>) -> Result<Self> {
        config.validate()?;
        let interaction = InteractionState::new();
        let tracker = InteractionTracker::new(interaction.clone(), config.resume_delay());
        let animator = OrbitAnimator::new(interaction.clone(), &config);
        let setup = ViewSetup::new(config.setup.clone());
        Ok(Self {
            id: Guid::new(),
            config,
            interaction,
            tracker,
            animator,
            setup,
            stopwatch,
            lifecycle: Lifecycle::Unloaded,
        })
    }

    pub fn id(&self) -> Guid {
        self.id
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_interacting(&self) -> bool {
        self.interaction.is_interacting()
    }

    pub fn animator_state(&self) -> AnimatorState {
        self.animator.state()
    }

    pub fn pending_resume(&self) -> Option<TimerHandle> {
        self.tracker.pending_resume()
    }

    pub fn is_home_captured(&self) -> bool {
        self.setup.is_home_captured()
    }

    pub fn load<H, I>(&mut self, host: &mut H, input: &mut I)
    where
        H: SceneHost + ?Sized,
        I: InputSource + ?Sized,
    {
        let _span = info_span!("orbit", id = %self.id).entered();
        if self.lifecycle != Lifecycle::Unloaded {
            return;
        }
        self.tracker.reset();
        host.subscribe_camera_changed();
        for kind in InputKind::ALL {
            input.subscribe(kind);
        }
        self.lifecycle = Lifecycle::Loaded;
        info!("orbit controller loaded");
    }

    pub fn on_scene_ready<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        let _span = info_span!("orbit", id = %self.id).entered();
        if self.lifecycle != Lifecycle::Loaded {
            return;
        }
        self.setup.configure(host);
        self.lifecycle = Lifecycle::Running;
        self.animator.resume(host, &mut *self.stopwatch);
        info!("scene ready, idle orbit running");
    }

    pub fn on_first_frame_settled<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        let _span = info_span!("orbit", id = %self.id).entered();
        if self.lifecycle == Lifecycle::Running {
            self.setup.capture_home(host);
        }
    }

    pub fn handle_input<H: SceneHost + ?Sized>(&mut self, host: &mut H, event: InputEvent) -> EventResult {
        if self.lifecycle != Lifecycle::Running {
            return EventResult::PASS;
        }
        self.tracker.handle(host, event)
    }

    pub fn on_frame<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        self.animator.on_frame(host, &mut *self.stopwatch);
    }

    pub fn on_timer<H: SceneHost + ?Sized>(&mut self, host: &mut H, handle: TimerHandle) {
        if self.tracker.on_resume_timer(handle) {
            self.animator.resume(host, &mut *self.stopwatch);
        }
    }

    pub fn on_camera_changed<H: SceneHost + ?Sized>(&mut self, host: &mut H) {
        if self.lifecycle != Lifecycle::Unloaded {
            self.animator.on_camera_changed(host);
        }
    }

    pub fn dispatch<H: SceneHost + ?Sized>(&mut self, host: &mut H, event: HostEvent) -> EventResult {
        match event {
            HostEvent::Frame(_) => self.on_frame(host),
            HostEvent::Timer(handle) => self.on_timer(host, handle),
            HostEvent::CameraChanged => self.on_camera_changed(host),
            HostEvent::Input(input) => return self.handle_input(host, input),
            HostEvent::SceneReady => self.on_scene_ready(host),
            HostEvent::FirstFrameSettled => self.on_first_frame_settled(host),
        }
        EventResult::PASS
    }

    pub fn unload<H, I>(&mut self, host: &mut H, input: &mut I)
    where
        H: SceneHost + ?Sized,
        I: InputSource + ?Sized,
    {
        let _span = info_span!("orbit", id = %self.id).entered();
        if self.lifecycle == Lifecycle::Unloaded {
            return;
        }
        self.animator.stop(host);
        self.tracker.cancel(host);
        self.tracker.halt();
        host.unsubscribe_camera_changed();
        for kind in InputKind::ALL {
            input.unsubscribe(kind);
        }
        self.lifecycle = Lifecycle::Unloaded;
        debug!(interacting = self.interaction.is_interacting(), "pending callbacks cancelled");
        info!("orbit controller unloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::sim::{SimClock, SimHost, SimInput, SimStopwatch};
    use skyorbit_base::Error;

    fn controller(clock: &SimClock) -> OrbitController {
        OrbitController::new(OrbitConfig::default(), Box::new(SimStopwatch::new(clock.clone())))
            .expect("default config is valid")
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        let config = OrbitConfig {
            resume_delay_ms: 0,
            ..OrbitConfig::default()
        };
        let result = OrbitController::new(config, Box::new(SimStopwatch::new(SimClock::new())));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_rotation_axis_fails_at_construction() {
        let config = OrbitConfig {
            rotation_axis: [0.0, 0.0, 0.0],
            ..OrbitConfig::default()
        };
        let result = OrbitController::new(config, Box::new(SimStopwatch::new(SimClock::new())));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn load_subscribes_and_waits_for_scene() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let mut input = SimInput::default();
        let mut controller = controller(&clock);

        controller.load(&mut host, &mut input);
        assert_eq!(controller.lifecycle(), Lifecycle::Loaded);
        assert!(host.is_camera_subscribed());
        assert!(InputKind::ALL.iter().all(|kind| input.is_subscribed(*kind)));
        assert_eq!(controller.animator_state(), AnimatorState::Idle);
        assert_eq!(
            controller.handle_input(&mut host, InputEvent::Press),
            EventResult::PASS
        );
        assert!(!controller.is_interacting());
    }

    #[test]
    fn scene_ready_configures_and_starts() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let mut input = SimInput::default();
        let mut controller = controller(&clock);

        controller.load(&mut host, &mut input);
        clock.advance(2000.0);
        controller.on_scene_ready(&mut host);

        assert_eq!(controller.lifecycle(), Lifecycle::Running);
        assert!(matches!(controller.animator_state(), AnimatorState::Animating(_)));
        assert_eq!(host.setup_calls().len(), 4);
        // Loading time is not rotation time.
        assert_eq!(host.camera_position(), Vec3::new(0.0, 0.0, 500.0));
    }

    #[test]
    fn home_view_is_captured_once_after_setup() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let mut input = SimInput::default();
        let mut controller = controller(&clock);

        controller.load(&mut host, &mut input);
        controller.on_first_frame_settled(&mut host);
        assert!(!controller.is_home_captured());

        controller.on_scene_ready(&mut host);
        controller.on_first_frame_settled(&mut host);
        controller.on_first_frame_settled(&mut host);
        assert!(controller.is_home_captured());
        assert_eq!(host.home_view_captures(), 1);
    }

    #[test]
    fn resume_timer_restarts_animation() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let mut input = SimInput::default();
        let mut controller = controller(&clock);
        controller.load(&mut host, &mut input);
        controller.on_scene_ready(&mut host);

        controller.handle_input(&mut host, InputEvent::Scroll);
        let frames = host.take_due_frames();
        for frame in frames {
            controller.dispatch(&mut host, HostEvent::Frame(frame));
        }
        assert_eq!(controller.animator_state(), AnimatorState::Idle);

        clock.advance(3500.0);
        for timer in host.take_due_timers() {
            controller.dispatch(&mut host, HostEvent::Timer(timer));
        }
        assert!(!controller.is_interacting());
        assert!(matches!(controller.animator_state(), AnimatorState::Animating(_)));
        // The quiet period was consumed by the resume, not rotated through.
        assert_eq!(host.camera_position(), Vec3::new(0.0, 0.0, 500.0));
    }

    #[test]
    fn unload_cancels_everything() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let mut input = SimInput::default();
        let mut controller = controller(&clock);
        controller.load(&mut host, &mut input);
        controller.on_scene_ready(&mut host);
        controller.handle_input(&mut host, InputEvent::Release);
        assert_eq!(host.pending_timer_count(), 1);
        assert_eq!(host.pending_frame_count(), 1);

        controller.unload(&mut host, &mut input);
        controller.unload(&mut host, &mut input);

        assert_eq!(controller.lifecycle(), Lifecycle::Unloaded);
        assert_eq!(controller.animator_state(), AnimatorState::Idle);
        assert_eq!(controller.pending_resume(), None);
        assert!(controller.is_interacting());
        assert_eq!(host.pending_timer_count(), 0);
        assert_eq!(host.pending_frame_count(), 0);
        assert!(!host.is_camera_subscribed());
        assert!(InputKind::ALL.iter().all(|kind| !input.is_subscribed(*kind)));
    }

    #[test]
    fn reload_after_unload_orbits_again() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let mut input = SimInput::default();
        let mut controller = controller(&clock);
        controller.load(&mut host, &mut input);
        controller.on_scene_ready(&mut host);
        controller.unload(&mut host, &mut input);

        controller.load(&mut host, &mut input);
        controller.on_scene_ready(&mut host);
        assert!(!controller.is_interacting());
        assert!(matches!(controller.animator_state(), AnimatorState::Animating(_)));
        assert_eq!(host.setup_calls().len(), 4);
    }

    #[test]
    fn dispatch_reports_input_suppression() {
        let clock = SimClock::new();
        let mut host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let mut input = SimInput::default();
        let mut controller = controller(&clock);
        controller.load(&mut host, &mut input);
        controller.on_scene_ready(&mut host);

        let result = controller.dispatch(&mut host, HostEvent::Input(InputEvent::Press));
        assert!(result.handled);
        assert!(!controller.dispatch(&mut host, HostEvent::CameraChanged).handled);
    }
}
