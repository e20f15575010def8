use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::error::{FrameError, SketchError};
use crate::session::{FrameInputs, FrameRenderer};
use crate::shader::{FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL};
use crate::surface::DrawingSurface;
use crate::types::{ContextOptions, SurfaceDimensions};

use super::canvas::{CanvasBlit, CanvasSpec, DrawingBuffer};
use super::context::GpuContext;
use super::resources::{GpuHandles, TargetFormat};
use super::uniforms::TrailUniforms;

/// A window's GPU context together with the trail program and drawing buffer.
pub(crate) struct GpuState {
    context: GpuContext,
    handles: GpuHandles,
    uniforms: TrailUniforms,
    blit: CanvasBlit,
    canvas: DrawingBuffer,
    display_size: SurfaceDimensions,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: SurfaceDimensions,
        options: &ContextOptions,
    ) -> Result<Self, SketchError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size, options)
            .map_err(|err| SketchError::ContextUnavailable(format!("{err:#}")))?;

        let handles = GpuHandles::initialize(
            &context.device,
            TargetFormat {
                color: context.surface_format,
                sample_count: context.sample_count,
                depth_stencil: context.depth_format,
            },
            VERTEX_SHADER_GLSL,
            FRAGMENT_SHADER_GLSL,
        )?;
        let uniforms = TrailUniforms::new(handles.uniforms);

        let blit = CanvasBlit::new(&context.device, context.surface_format, context.opaque)?;
        let spec = CanvasSpec {
            format: context.surface_format,
            sample_count: context.sample_count,
            depth_format: context.depth_format,
            preserve: options.preserve_drawing_buffer,
        };
        let canvas = DrawingBuffer::new(&context.device, spec, context.size, &blit);
        let display_size = context.size;

        tracing::info!(
            adapter = %context.adapter_profile.name,
            position_location = handles.attribute_location,
            width = display_size.width,
            height = display_size.height,
            "graphics context ready"
        );

        Ok(Self {
            context,
            handles,
            uniforms,
            blit,
            canvas,
            display_size,
        })
    }

    /// Records the size the window system reports for the surface.
    pub(crate) fn set_display_size(&mut self, size: SurfaceDimensions) {
        self.display_size = size;
    }

    /// Shows the drawing buffer without adding to it.
    pub(crate) fn present(&mut self) -> Result<(), FrameError> {
        self.submit(None)
    }

    fn acquire(&self) -> Result<wgpu::SurfaceTexture, FrameError> {
        self.context.surface.get_current_texture().map_err(|err| {
            if matches!(err, wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) {
                self.context.reconfigure();
            }
            FrameError::from(err)
        })
    }

    fn submit(&mut self, frame: Option<&FrameInputs>) -> Result<(), FrameError> {
        let output = self.acquire()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame encoder"),
                });

        if let Some(frame) = frame {
            self.uniforms.update(frame);
            self.context.queue.write_buffer(
                &self.handles.uniform_buffer,
                0,
                self.uniforms.as_bytes(),
            );
            let mut pass = self.canvas.begin_pass(&mut encoder);
            self.handles
                .encode_draw(&mut pass, frame.dimensions.width, frame.dimensions.height);
        }

        self.blit.encode(&mut encoder, &self.canvas, &target);
        self.context.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl DrawingSurface for GpuState {
    fn display_size(&self) -> SurfaceDimensions {
        self.display_size
    }

    fn backing_size(&self) -> SurfaceDimensions {
        self.canvas.size()
    }

    fn resize_backing(&mut self, size: SurfaceDimensions) {
        self.context.resize(size);
        self.canvas = self.canvas.resized(&self.context.device, size, &self.blit);
    }
}

impl FrameRenderer for GpuState {
    fn draw_frame(&mut self, frame: &FrameInputs) -> Result<(), FrameError> {
        self.submit(Some(frame))
    }
}
