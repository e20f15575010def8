use chrono::{Local, Timelike};
use rand::prelude::*;

use crate::error::FrameError;
use crate::input::{InputTracker, PointerEvent, SelectionHost};
use crate::types::{Ndc, StrokeColor, SurfaceDimensions};

/// Everything one draw call needs, resolved before the renderer runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInputs {
    pub dimensions: SurfaceDimensions,
    pub cursor_ndc: Ndc,
    /// Previous cursor position, already falling back to `cursor_ndc`.
    pub old_cursor_ndc: Ndc,
    pub color: StrokeColor,
    /// Seconds since local midnight.
    pub time: f32,
}

/// Issues the trail draw call for one frame.
pub trait FrameRenderer {
    fn draw_frame(&mut self, frame: &FrameInputs) -> Result<(), FrameError>;
}

/// Source of per-draw stroke colours.
#[derive(Debug, Clone)]
pub struct StrokePalette {
    rng: StdRng,
}

impl StrokePalette {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Samples each channel uniformly from `[0, 1)`.
    pub fn next_color(&mut self) -> StrokeColor {
        StrokeColor::new(self.rng.gen(), self.rng.gen(), self.rng.gen())
    }
}

/// Mutable state of one mounted sketch.
#[derive(Debug)]
pub struct SessionState {
    pub input: InputTracker,
    /// Viewport of the most recent tick.
    pub dimensions: SurfaceDimensions,
    pub palette: StrokePalette,
}

impl SessionState {
    pub fn new(dimensions: SurfaceDimensions, color_seed: Option<u64>) -> Self {
        Self {
            input: InputTracker::new(),
            dimensions,
            palette: StrokePalette::new(color_seed),
        }
    }

    /// Forwards a pointer event using the current viewport for normalisation.
    pub fn dispatch<H>(&mut self, event: PointerEvent, host: &mut H)
    where
        H: SelectionHost + ?Sized,
    {
        self.input.dispatch(event, self.dimensions, host);
    }

    /// Snapshots the pointer and samples a fresh colour for the next draw.
    pub fn frame_inputs(&mut self, time: f32) -> FrameInputs {
        let pointer = self.input.state();
        FrameInputs {
            dimensions: self.dimensions,
            cursor_ndc: pointer.current_ndc,
            old_cursor_ndc: pointer.previous_or_current(),
            color: self.palette.next_color(),
            time,
        }
    }
}

/// Local wall-clock time in seconds since midnight.
pub fn wall_clock_seconds() -> f32 {
    let now = Local::now();
    now.num_seconds_from_midnight() as f32 + now.nanosecond() as f32 / 1_000_000_000.0
}
