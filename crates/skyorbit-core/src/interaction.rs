use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use crate::host::{EventResult, InputEvent, TimerHandle, TimerScheduler};

#[derive(Clone, Debug, Default)]
pub struct InteractionState(Rc<Cell<bool>>);

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_interacting(&self) -> bool {
        self.0.get()
    }

    fn set(&self, interacting: bool) {
        self.0.set(interacting);
    }
}

#[derive(Debug)]
pub struct InteractionTracker {
    state: InteractionState,
    resume_delay: Duration,
    pending_resume: Option<TimerHandle>,
}

impl InteractionTracker {
    pub(crate) fn new(state: InteractionState, resume_delay: Duration) -> Self {
        Self {
            state,
            resume_delay,
            pending_resume: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn pending_resume(&self) -> Option<TimerHandle> {
        self.pending_resume
    }

    pub fn handle<T: TimerScheduler + ?Sized>(&mut self, timers: &mut T, event: InputEvent) -> EventResult {
        match event {
            InputEvent::Scroll => self.on_scroll(timers),
            InputEvent::Press => self.on_press(timers),
            InputEvent::Release => self.on_release(timers),
        }
    }

    pub fn on_scroll<T: TimerScheduler + ?Sized>(&mut self, timers: &mut T) -> EventResult {
        self.arm_resume(timers);
        self.state.set(true);
        debug!("scroll: orbit suppressed");
        EventResult::HANDLED
    }

    pub fn on_press<T: TimerScheduler + ?Sized>(&mut self, timers: &mut T) -> EventResult {
        self.cancel(timers);
        self.state.set(true);
        debug!("press: orbit suppressed");
        EventResult::HANDLED
    }

    pub fn on_release<T: TimerScheduler + ?Sized>(&mut self, timers: &mut T) -> EventResult {
        self.arm_resume(timers);
        self.state.set(false);
        debug!("release: resume armed");
        EventResult::HANDLED
    }

    pub fn on_resume_timer(&mut self, handle: TimerHandle) -> bool {
        if self.pending_resume != Some(handle) {
            return false;
        }
        self.pending_resume = None;
        self.state.set(false);
        debug!(timer = handle.0, "resume timer fired");
        true
    }

    pub fn cancel<T: TimerScheduler + ?Sized>(&mut self, timers: &mut T) {
        if let Some(handle) = self.pending_resume.take() {
            timers.cancel_timeout(handle);
        }
    }

    pub fn halt(&mut self) {
        self.state.set(true);
    }

    pub fn reset(&mut self) {
        self.state.set(false);
    }

    fn arm_resume<T: TimerScheduler + ?Sized>(&mut self, timers: &mut T) {
        self.cancel(timers);
        let handle = timers.schedule_timeout(self.resume_delay);
        self.pending_resume = Some(handle);
        debug!(timer = handle.0, delay_ms = self.resume_delay.as_millis() as u64, "resume timer armed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimClock, SimHost};
    use crate::math::Vec3;

    fn fixture() -> (SimClock, SimHost, InteractionTracker) {
        let clock = SimClock::new();
        let host = SimHost::new(clock.clone(), Vec3::new(0.0, 0.0, 500.0));
        let tracker = InteractionTracker::new(InteractionState::new(), Duration::from_millis(3500));
        (clock, host, tracker)
    }

    #[test]
    fn press_suppresses_without_timer() {
        let (_, mut host, mut tracker) = fixture();
        let result = tracker.on_press(&mut host);
        assert_eq!(result, EventResult::HANDLED);
        assert!(tracker.state().is_interacting());
        assert_eq!(tracker.pending_resume(), None);
        assert_eq!(host.pending_timer_count(), 0);
    }

    #[test]
    fn scroll_suppresses_and_arms_resume() {
        let (_, mut host, mut tracker) = fixture();
        assert!(tracker.on_scroll(&mut host).handled);
        assert!(tracker.state().is_interacting());
        assert!(tracker.pending_resume().is_some());
        assert_eq!(host.pending_timer_count(), 1);
    }

    #[test]
    fn release_clears_flag_immediately_and_arms_resume() {
        let (_, mut host, mut tracker) = fixture();
        tracker.on_press(&mut host);
        assert!(tracker.on_release(&mut host).handled);
        assert!(!tracker.state().is_interacting());
        assert_eq!(host.pending_timer_count(), 1);
    }

    #[test]
    fn any_sequence_keeps_at_most_one_timer() {
        let (clock, mut host, mut tracker) = fixture();
        let events = [
            InputEvent::Scroll,
            InputEvent::Scroll,
            InputEvent::Press,
            InputEvent::Release,
            InputEvent::Release,
            InputEvent::Scroll,
            InputEvent::Press,
            InputEvent::Scroll,
            InputEvent::Release,
        ];
        for event in events {
            clock.advance(40.0);
            tracker.handle(&mut host, event);
            assert!(host.pending_timer_count() <= 1);
            assert_eq!(host.pending_timer_count(), usize::from(tracker.pending_resume().is_some()));
        }
    }

    #[test]
    fn press_cancels_pending_resume() {
        let (_, mut host, mut tracker) = fixture();
        tracker.on_scroll(&mut host);
        tracker.on_press(&mut host);
        assert_eq!(host.pending_timer_count(), 0);
        assert!(tracker.state().is_interacting());
    }

    #[test]
    fn resume_timer_clears_flag() {
        let (clock, mut host, mut tracker) = fixture();
        tracker.on_scroll(&mut host);
        let handle = tracker.pending_resume().expect("timer armed");

        clock.advance(3500.0);
        assert!(tracker.on_resume_timer(handle));
        assert!(!tracker.state().is_interacting());
        assert_eq!(tracker.pending_resume(), None);
    }

    #[test]
    fn superseded_timer_does_not_resume() {
        let (_, mut host, mut tracker) = fixture();
        tracker.on_scroll(&mut host);
        let stale = tracker.pending_resume().expect("timer armed");
        tracker.on_scroll(&mut host);

        assert!(!tracker.on_resume_timer(stale));
        assert!(tracker.state().is_interacting());
    }

    #[test]
    fn halt_marks_interacting_until_reset() {
        let (_, _, mut tracker) = fixture();
        tracker.halt();
        assert!(tracker.state().is_interacting());
        tracker.reset();
        assert!(!tracker.state().is_interacting());
    }
}
