//! Pointer state for the drawing surface.
//!
//! Raw pointer events arrive through [`InputTracker::dispatch`]; the animation
//! loop only reads the resulting [`PointerState`] and flips the debounce flag
//! after a draw consumed it.

use crate::types::{Ndc, SurfaceDimensions};

/// A pixel position relative to the surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPosition {
    pub x: f32,
    pub y: f32,
}

impl PixelPosition {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Toolkit-independent pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Enter,
    Leave,
    Move(PixelPosition),
    /// Primary button down, optionally at a known position.
    Press(Option<PixelPosition>),
    Release,
}

/// Host hooks the tracker drives while the pointer hovers the surface.
pub trait SelectionHost {
    /// Enables or disables text/drag selection on the host surface.
    fn set_selection_enabled(&mut self, enabled: bool);
}

impl SelectionHost for () {
    fn set_selection_enabled(&mut self, _enabled: bool) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub inside_surface: bool,
    pub pressed: bool,
    pub debounced: bool,
    pub current_ndc: Ndc,
    /// Value of `current_ndc` before the latest update; absent at the start of a stroke.
    pub previous_ndc: Option<Ndc>,
    pub current_pixel: PixelPosition,
}

impl PointerState {
    /// Previous position, or the current one when the stroke has just begun.
    pub fn previous_or_current(&self) -> Ndc {
        self.previous_ndc.unwrap_or(self.current_ndc)
    }

    /// True when the next tick must issue a draw.
    pub fn wants_draw(&self) -> bool {
        self.pressed && !self.debounced
    }
}

#[derive(Debug, Clone)]
pub struct InputTracker {
    state: PointerState,
    // Set until the first move and on every enter: the next move starts a
    // stroke instead of extending one.
    awaiting_anchor: bool,
}

impl Default for InputTracker {
    fn default() -> Self {
        Self {
            state: PointerState::default(),
            awaiting_anchor: true,
        }
    }
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    /// Routes a raw event to the matching transition.
    pub fn dispatch<H>(&mut self, event: PointerEvent, surface: SurfaceDimensions, host: &mut H)
    where
        H: SelectionHost + ?Sized,
    {
        match event {
            PointerEvent::Enter => self.on_enter(host),
            PointerEvent::Leave => self.on_leave(host),
            PointerEvent::Move(position) => {
                self.on_move(position.x, position.y, surface.width, surface.height)
            }
            PointerEvent::Press(position) => self.on_press(position, surface),
            PointerEvent::Release => self.on_release(),
        }
    }

    pub fn on_enter<H>(&mut self, host: &mut H)
    where
        H: SelectionHost + ?Sized,
    {
        self.state.inside_surface = true;
        self.state.previous_ndc = None;
        self.awaiting_anchor = true;
        host.set_selection_enabled(false);
    }

    pub fn on_leave<H>(&mut self, host: &mut H)
    where
        H: SelectionHost + ?Sized,
    {
        self.state.inside_surface = false;
        host.set_selection_enabled(true);
    }

    /// Starts a stroke. A known press position becomes the stroke's anchor.
    pub fn on_press(&mut self, position: Option<PixelPosition>, surface: SurfaceDimensions) {
        self.state.pressed = true;
        self.state.debounced = false;
        if let Some(position) = position {
            self.state.current_pixel = position;
            self.state.current_ndc = Ndc::from_pixel(position.x, position.y, surface);
            self.state.previous_ndc = None;
            self.awaiting_anchor = false;
        }
    }

    pub fn on_release(&mut self) {
        self.state.pressed = false;
    }

    pub fn on_move(&mut self, pixel_x: f32, pixel_y: f32, surface_width: u32, surface_height: u32) {
        let surface = SurfaceDimensions::new(surface_width, surface_height);
        self.state.previous_ndc = if std::mem::take(&mut self.awaiting_anchor) {
            None
        } else {
            Some(self.state.current_ndc)
        };
        self.state.current_pixel = PixelPosition::new(pixel_x, pixel_y);
        self.state.current_ndc = Ndc::from_pixel(pixel_x, pixel_y, surface);
        self.state.debounced = false;
    }

    /// Records that a draw consumed the current segment.
    pub fn mark_consumed(&mut self) {
        self.state.debounced = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: SurfaceDimensions = SurfaceDimensions::new(800, 600);

    #[derive(Default)]
    struct RecordingHost {
        calls: Vec<bool>,
    }

    impl SelectionHost for RecordingHost {
        fn set_selection_enabled(&mut self, enabled: bool) {
            self.calls.push(enabled);
        }
    }

    fn moved(tracker: &mut InputTracker, x: f32, y: f32) {
        tracker.dispatch(PointerEvent::Move(PixelPosition::new(x, y)), SURFACE, &mut ());
    }

    #[test]
    fn previous_lags_by_one_move() {
        let mut tracker = InputTracker::new();
        tracker.dispatch(PointerEvent::Press(None), SURFACE, &mut ());
        let path = [(10.0, 20.0), (400.0, 300.0), (800.0, 0.0), (55.5, 590.0)];
        let mut last = None;
        for (x, y) in path {
            moved(&mut tracker, x, y);
            if let Some(expected) = last {
                assert_eq!(tracker.state().previous_ndc, Some(expected));
            }
            last = Some(Ndc::from_pixel(x, y, SURFACE));
            assert_eq!(tracker.state().current_ndc, last.unwrap());
        }
    }

    #[test]
    fn previous_is_absent_until_first_move() {
        let mut tracker = InputTracker::new();
        assert_eq!(tracker.state().previous_ndc, None);
        moved(&mut tracker, 200.0, 150.0);
        assert_eq!(tracker.state().previous_ndc, None);
        moved(&mut tracker, 600.0, 450.0);
        assert_eq!(
            tracker.state().previous_ndc,
            Some(Ndc::from_pixel(200.0, 150.0, SURFACE))
        );
    }

    #[test]
    fn move_flips_vertical_axis() {
        let mut tracker = InputTracker::new();
        tracker.on_move(800.0, 0.0, 800, 600);
        assert_eq!(tracker.state().current_ndc, Ndc::new(1.0, 1.0));
        tracker.on_move(0.0, 600.0, 800, 600);
        assert_eq!(tracker.state().current_ndc, Ndc::new(-1.0, -1.0));
        assert_eq!(tracker.state().current_pixel, PixelPosition::new(0.0, 600.0));
    }

    #[test]
    fn entering_starts_a_fresh_stroke() {
        let mut tracker = InputTracker::new();
        let mut host = RecordingHost::default();
        tracker.dispatch(PointerEvent::Enter, SURFACE, &mut host);
        moved(&mut tracker, 100.0, 100.0);
        tracker.dispatch(PointerEvent::Leave, SURFACE, &mut host);
        tracker.dispatch(PointerEvent::Enter, SURFACE, &mut host);
        moved(&mut tracker, 700.0, 500.0);

        let state = tracker.state();
        assert_eq!(state.previous_ndc, None);
        assert_eq!(state.previous_or_current(), state.current_ndc);
        assert_eq!(host.calls, vec![false, true, false]);

        moved(&mut tracker, 710.0, 510.0);
        assert_eq!(
            tracker.state().previous_ndc,
            Some(Ndc::from_pixel(700.0, 500.0, SURFACE))
        );
    }

    #[test]
    fn press_clears_debounce_and_anchors_stroke() {
        let mut tracker = InputTracker::new();
        moved(&mut tracker, 10.0, 10.0);
        tracker.mark_consumed();
        assert!(tracker.state().debounced);

        tracker.dispatch(
            PointerEvent::Press(Some(PixelPosition::new(0.0, 600.0))),
            SURFACE,
            &mut (),
        );
        let state = tracker.state();
        assert!(state.wants_draw());
        assert_eq!(state.current_ndc, Ndc::new(-1.0, -1.0));
        assert_eq!(state.previous_ndc, None);
    }

    #[test]
    fn release_stops_drawing_but_keeps_position() {
        let mut tracker = InputTracker::new();
        tracker.dispatch(PointerEvent::Press(None), SURFACE, &mut ());
        moved(&mut tracker, 400.0, 300.0);
        tracker.dispatch(PointerEvent::Release, SURFACE, &mut ());
        assert!(!tracker.state().pressed);
        assert!(!tracker.state().wants_draw());
        assert_eq!(tracker.state().current_ndc, Ndc::new(0.0, 0.0));
    }

    #[test]
    fn move_clears_debounce() {
        let mut tracker = InputTracker::new();
        tracker.dispatch(PointerEvent::Press(None), SURFACE, &mut ());
        tracker.mark_consumed();
        assert!(!tracker.state().wants_draw());
        moved(&mut tracker, 1.0, 1.0);
        assert!(tracker.state().wants_draw());
    }
}
