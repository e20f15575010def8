//! Pointer-driven glowing line trail rendered with `wgpu`.
//!
//! Dragging the primary pointer across the window draws the segment between
//! the previous and current pointer positions as a soft glow whose colour is
//! resampled on every draw. The overall flow is:
//!
//! ```text
//!   winit events ──▶ SessionState::dispatch ──▶ InputTracker (PointerState)
//!                                                     │
//!   request_redraw ◀── AnimationLoop::tick ◀──────────┘
//!                          │ surface::sync ─▶ DrawingSurface::resize_backing
//!                          └ pressed && !debounced
//!                               ─▶ FrameRenderer::draw_frame ─▶ drawing buffer ─▶ blit ─▶ present
//! ```
//!
//! The animation loop, input tracker and sizing pass are plain state machines
//! over traits, so they run without a GPU. `gpu::GpuState` is the only
//! implementation that touches the device.

mod compile;
mod error;
mod gpu;
mod input;
mod scheduler;
mod session;
mod shader;
mod surface;
mod types;
mod window;

use anyhow::Result;

pub use compile::{attribute_location, compile_stage, UniformLocations};
pub use error::{FrameError, ShaderStage, SketchError};
pub use input::{InputTracker, PixelPosition, PointerEvent, PointerState, SelectionHost};
pub use scheduler::{AnimationLoop, FramePacer, FrameRequester, LoopHandle, LoopState, TickOutcome};
pub use session::{wall_clock_seconds, FrameInputs, FrameRenderer, SessionState, StrokePalette};
pub use shader::{
    distance_point_to_segment, shade, smoothstep, ShadeInputs, FRAGMENT_SHADER_GLSL,
    VERTEX_SHADER_GLSL,
};
pub use surface::{sync as sync_surface, DrawingSurface};
pub use types::{ContextOptions, Ndc, SketchConfig, StrokeColor, SurfaceDimensions};
pub use window::{ContextUnavailableHandler, CONTEXT_UNAVAILABLE_MESSAGE};

/// Entry point that mounts the trail in a desktop window.
pub struct Sketch {
    config: SketchConfig,
    on_context_unavailable: Option<ContextUnavailableHandler>,
}

impl Sketch {
    pub fn new(config: SketchConfig) -> Self {
        Self {
            config,
            on_context_unavailable: None,
        }
    }

    /// Replaces the default fallback, which retitles the window with
    /// [`CONTEXT_UNAVAILABLE_MESSAGE`] and logs the cause at `error`.
    ///
    /// The title is the only notice the default shows; the window contents
    /// stay blank. Install a handler here to present the failure differently.
    pub fn with_context_unavailable<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&winit::window::Window, &SketchError) + 'static,
    {
        self.on_context_unavailable = Some(Box::new(handler));
        self
    }

    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    /// Blocks until the window is closed or rendering fails.
    ///
    /// Closing the window returns `Ok`, also after the context-unavailable
    /// fallback ran. Only a fatal rendering failure is returned as an error.
    pub fn run(self) -> Result<()> {
        tracing::info!(
            width = self.config.surface_size.0,
            height = self.config.surface_size.1,
            target_fps = ?self.config.target_fps,
            "starting sketch"
        );
        window::run(self.config, self.on_context_unavailable)
    }
}
