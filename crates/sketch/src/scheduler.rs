//! Animation loop lifecycle and frame pacing.
//!
//! The loop never reschedules itself recursively. Each fired tick asks the
//! [`FrameRequester`] for exactly one more, and [`AnimationLoop::teardown`]
//! drops the outstanding [`LoopHandle`] so a tick already queued by the
//! windowing system is ignored when it arrives.

use std::time::{Duration, Instant};

use crate::error::{FrameError, SketchError};
use crate::session::{FrameRenderer, SessionState};
use crate::surface::{self, DrawingSurface};

/// Asks the host to deliver one more animation tick.
pub trait FrameRequester {
    fn request_frame(&mut self);
}

/// Identifies the single scheduled tick a loop is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub resized: bool,
    pub drew: bool,
}

#[derive(Debug)]
pub struct AnimationLoop<R> {
    requester: R,
    state: LoopState,
    pending: Option<LoopHandle>,
    next_id: u64,
}

impl<R: FrameRequester> AnimationLoop<R> {
    /// Mounts the loop and schedules its first tick.
    pub fn start(requester: R) -> Self {
        let mut this = Self {
            requester,
            state: LoopState::Running,
            pending: None,
            next_id: 0,
        };
        this.schedule();
        this
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pending(&self) -> Option<LoopHandle> {
        self.pending
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }

    pub fn requester_mut(&mut self) -> &mut R {
        &mut self.requester
    }

    fn schedule(&mut self) {
        self.next_id += 1;
        self.pending = Some(LoopHandle(self.next_id));
        self.requester.request_frame();
    }

    /// Runs one scheduled tick: sync the surface, draw if the pointer state
    /// asks for it, then schedule the next tick.
    ///
    /// Ticks delivered while stopped, or without a pending handle, do nothing.
    /// A fatal frame error stops the loop and is returned.
    pub fn tick<T>(
        &mut self,
        session: &mut SessionState,
        target: &mut T,
        time: f32,
    ) -> Result<TickOutcome, SketchError>
    where
        T: DrawingSurface + FrameRenderer + ?Sized,
    {
        if self.state == LoopState::Stopped || self.pending.take().is_none() {
            tracing::trace!("ignoring tick without a pending handle");
            return Ok(TickOutcome::default());
        }

        let mut outcome = TickOutcome {
            resized: surface::sync(target),
            drew: false,
        };
        session.dimensions = target.backing_size();

        if session.input.state().wants_draw() {
            let frame = session.frame_inputs(time);
            match target.draw_frame(&frame) {
                Ok(()) => {
                    session.input.mark_consumed();
                    outcome.drew = true;
                }
                Err(err @ FrameError::Recoverable(_)) => {
                    tracing::warn!(error = %err, "frame skipped; retrying next tick");
                }
                Err(err @ FrameError::Fatal(_)) => {
                    tracing::error!(error = %err, "stopping animation loop");
                    self.state = LoopState::Stopped;
                    return Err(err.into());
                }
            }
        }

        self.schedule();
        Ok(outcome)
    }

    /// Cancels the pending tick. The loop cannot be restarted.
    pub fn teardown(&mut self) {
        if let Some(handle) = self.pending.take() {
            tracing::debug!(handle = handle.0, "cancelled pending tick");
        }
        self.state = LoopState::Stopped;
    }
}

/// Spaces redraw requests to a target frame rate.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FramePacer {
    /// `None`, a non-positive rate, or one whose interval overflows
    /// `Duration` leaves frames uncapped.
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .and_then(|fps| Duration::try_from_secs_f32(1.0 / fps).ok());
        Self {
            interval,
            last_frame: None,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
            _ => true,
        }
    }

    /// When the next frame becomes due, if pacing applies at all.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.last_frame?.checked_add(self.interval?)
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{PixelPosition, PointerEvent};
    use crate::session::FrameInputs;
    use crate::surface::tests::FakeSurface;
    use crate::types::{Ndc, SurfaceDimensions};

    #[derive(Debug, Default)]
    struct CountingRequester {
        requests: usize,
    }

    impl FrameRequester for CountingRequester {
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }

    #[derive(Debug)]
    struct FakeTarget {
        surface: FakeSurface,
        frames: Vec<FrameInputs>,
        failures: Vec<FrameError>,
    }

    impl FakeTarget {
        fn new(display: (u32, u32), backing: (u32, u32)) -> Self {
            Self {
                surface: FakeSurface::new(display, backing),
                frames: Vec::new(),
                failures: Vec::new(),
            }
        }
    }

    impl DrawingSurface for FakeTarget {
        fn display_size(&self) -> SurfaceDimensions {
            self.surface.display_size()
        }

        fn backing_size(&self) -> SurfaceDimensions {
            self.surface.backing_size()
        }

        fn resize_backing(&mut self, size: SurfaceDimensions) {
            self.surface.resize_backing(size);
        }
    }

    impl FrameRenderer for FakeTarget {
        fn draw_frame(&mut self, frame: &FrameInputs) -> Result<(), FrameError> {
            if let Some(err) = self.failures.pop() {
                return Err(err);
            }
            self.frames.push(*frame);
            Ok(())
        }
    }

    fn session() -> SessionState {
        SessionState::new(SurfaceDimensions::new(800, 600), Some(3))
    }

    fn press_at(session: &mut SessionState, x: f32, y: f32) {
        session.dispatch(PointerEvent::Press(Some(PixelPosition::new(x, y))), &mut ());
    }

    fn move_to(session: &mut SessionState, x: f32, y: f32) {
        session.dispatch(PointerEvent::Move(PixelPosition::new(x, y)), &mut ());
    }

    #[test]
    fn start_schedules_first_tick() {
        let animation = AnimationLoop::start(CountingRequester::default());
        assert_eq!(animation.state(), LoopState::Running);
        assert!(animation.pending().is_some());
        assert_eq!(animation.requester().requests, 1);
    }

    #[test]
    fn idle_tick_reschedules_without_drawing() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((800, 600), (800, 600));

        let outcome = animation.tick(&mut session, &mut target, 0.0).unwrap();
        assert_eq!(outcome, TickOutcome::default());
        assert!(target.frames.is_empty());
        assert_eq!(animation.requester().requests, 2);
    }

    #[test]
    fn held_still_pointer_draws_once() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((800, 600), (800, 600));

        press_at(&mut session, 100.0, 100.0);
        move_to(&mut session, 120.0, 100.0);
        assert!(animation.tick(&mut session, &mut target, 0.0).unwrap().drew);
        assert!(!animation.tick(&mut session, &mut target, 0.0).unwrap().drew);
        assert_eq!(target.frames.len(), 1);

        move_to(&mut session, 140.0, 100.0);
        assert!(animation.tick(&mut session, &mut target, 0.0).unwrap().drew);
        assert_eq!(target.frames.len(), 2);
    }

    #[test]
    fn press_forces_one_draw_after_consumed_state() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((800, 600), (800, 600));

        session.dispatch(PointerEvent::Press(None), &mut ());
        animation.tick(&mut session, &mut target, 0.0).unwrap();
        session.dispatch(PointerEvent::Release, &mut ());
        animation.tick(&mut session, &mut target, 0.0).unwrap();
        assert_eq!(target.frames.len(), 1);

        session.dispatch(PointerEvent::Press(None), &mut ());
        animation.tick(&mut session, &mut target, 0.0).unwrap();
        animation.tick(&mut session, &mut target, 0.0).unwrap();
        assert_eq!(target.frames.len(), 2);
    }

    #[test]
    fn press_then_move_feeds_both_cursors() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((800, 600), (800, 600));

        press_at(&mut session, 0.0, 600.0);
        move_to(&mut session, 800.0, 0.0);
        animation.tick(&mut session, &mut target, 5.0).unwrap();

        let frame = target.frames.last().expect("one frame drawn");
        assert_eq!(frame.cursor_ndc, Ndc::new(1.0, 1.0));
        assert_eq!(frame.old_cursor_ndc, Ndc::new(-1.0, -1.0));
        assert_eq!(frame.dimensions, SurfaceDimensions::new(800, 600));
        assert_eq!(frame.time, 5.0);
    }

    #[test]
    fn tick_resizes_before_drawing() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((1024, 768), (800, 600));

        session.dispatch(PointerEvent::Press(None), &mut ());
        let outcome = animation.tick(&mut session, &mut target, 0.0).unwrap();
        assert!(outcome.resized);
        assert_eq!(target.backing_size(), SurfaceDimensions::new(1024, 768));
        assert_eq!(session.dimensions, SurfaceDimensions::new(1024, 768));
        assert_eq!(
            target.frames[0].dimensions,
            SurfaceDimensions::new(1024, 768)
        );
    }

    #[test]
    fn teardown_cancels_pending_tick() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((800, 600), (800, 600));

        session.dispatch(PointerEvent::Press(None), &mut ());
        animation.teardown();
        assert_eq!(animation.state(), LoopState::Stopped);
        assert!(animation.pending().is_none());

        for _ in 0..3 {
            animation.tick(&mut session, &mut target, 0.0).unwrap();
        }
        assert!(target.frames.is_empty());
        assert_eq!(animation.requester().requests, 1);
    }

    #[test]
    fn recoverable_error_retries_next_tick() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((800, 600), (800, 600));
        target
            .failures
            .push(FrameError::Recoverable("outdated".into()));

        session.dispatch(PointerEvent::Press(None), &mut ());
        assert!(!animation.tick(&mut session, &mut target, 0.0).unwrap().drew);
        assert_eq!(animation.state(), LoopState::Running);
        assert!(animation.tick(&mut session, &mut target, 0.0).unwrap().drew);
        assert_eq!(target.frames.len(), 1);
    }

    #[test]
    fn fatal_error_stops_loop() {
        let mut animation = AnimationLoop::start(CountingRequester::default());
        let mut session = session();
        let mut target = FakeTarget::new((800, 600), (800, 600));
        target.failures.push(FrameError::Fatal("device lost".into()));

        session.dispatch(PointerEvent::Press(None), &mut ());
        let err = animation
            .tick(&mut session, &mut target, 0.0)
            .expect_err("fatal frame error");
        assert!(matches!(err, SketchError::Frame(FrameError::Fatal(_))));
        assert_eq!(animation.state(), LoopState::Stopped);
        assert!(animation.pending().is_none());

        move_to(&mut session, 10.0, 10.0);
        animation.tick(&mut session, &mut target, 0.0).unwrap();
        assert!(target.frames.is_empty());
    }

    #[test]
    fn pacer_waits_for_interval() {
        let mut pacer = FramePacer::new(Some(4.0));
        let start = Instant::now();
        assert!(pacer.ready_for_frame(start));
        assert_eq!(pacer.next_deadline(), None);

        pacer.mark_rendered(start);
        assert!(!pacer.ready_for_frame(start + Duration::from_millis(5)));
        assert!(pacer.ready_for_frame(start + Duration::from_millis(250)));
        assert_eq!(pacer.next_deadline(), Some(start + Duration::from_millis(250)));
    }

    #[test]
    fn uncapped_pacer_is_always_ready() {
        for fps in [None, Some(0.0), Some(-1.0)] {
            let mut pacer = FramePacer::new(fps);
            let now = Instant::now();
            pacer.mark_rendered(now);
            assert!(pacer.ready_for_frame(now));
            assert_eq!(pacer.next_deadline(), None);
        }
    }

    #[test]
    fn vanishing_rate_does_not_overflow() {
        let mut pacer = FramePacer::new(Some(1e-30));
        let now = Instant::now();
        assert!(pacer.ready_for_frame(now));
        pacer.mark_rendered(now);
        assert!(pacer.ready_for_frame(now));
        assert_eq!(pacer.next_deadline(), None);

        let mut slow = FramePacer::new(Some(1e-9));
        slow.mark_rendered(now);
        assert!(!slow.ready_for_frame(now + Duration::from_secs(3600)));
    }
}
