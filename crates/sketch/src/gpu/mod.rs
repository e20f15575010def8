//! wgpu side of the sketch.
//!
//! - `context` owns instance/adapter/device/surface wiring and maps the
//!   context options onto surface formats, MSAA and depth attachments.
//! - `resources` compiles and links the trail program and uploads the quad
//!   (`GpuHandles`), exactly once per context.
//! - `uniforms` packs a frame's values at the offsets reflected from the shader.
//! - `canvas` owns the persistent drawing buffer and the blit to the window.
//! - `state` glues everything together as the `DrawingSurface` and
//!   `FrameRenderer` the animation loop drives.

mod canvas;
mod context;
mod resources;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
