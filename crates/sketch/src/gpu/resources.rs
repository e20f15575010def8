use wgpu::util::DeviceExt;

use crate::compile::{attribute_location, compile_stage, create_shader_module, UniformLocations};
use crate::error::{ShaderStage, SketchError};
use crate::shader::{POSITION_ATTRIBUTE, QUAD_INDICES, QUAD_VERTICES};

use super::uniforms::buffer_size;

/// Bytes per vertex: two tightly packed `f32`s.
const VERTEX_STRIDE: wgpu::BufferAddress = 2 * std::mem::size_of::<f32>() as wgpu::BufferAddress;

/// Everything the trail draw needs, created once per context.
pub(crate) struct GpuHandles {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub uniforms: UniformLocations,
    pub attribute_location: u32,
    pub index_count: u32,
}

/// Render target properties the trail pipeline must agree with.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TargetFormat {
    pub color: wgpu::TextureFormat,
    pub sample_count: u32,
    pub depth_stencil: Option<wgpu::TextureFormat>,
}

impl GpuHandles {
    /// Compiles and links the trail program, then uploads the quad.
    ///
    /// Nothing is allocated on the device until both stages have compiled and
    /// every uniform and the position attribute have been resolved.
    pub(crate) fn initialize(
        device: &wgpu::Device,
        target: TargetFormat,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, SketchError> {
        let vertex_ir = compile_stage(vertex_source, ShaderStage::Vertex)?;
        let fragment_ir = compile_stage(fragment_source, ShaderStage::Fragment)?;
        let attribute_location = attribute_location(&vertex_ir, POSITION_ATTRIBUTE)?;
        let uniforms = UniformLocations::resolve(&[&vertex_ir, &fragment_ir])?;
        tracing::debug!(attribute_location, ?uniforms, "resolved trail program interface");

        let vertex_module =
            create_shader_module(device, "trail vertex", vertex_source, ShaderStage::Vertex)?;
        let fragment_module = create_shader_module(
            device,
            "trail fragment",
            fragment_source,
            ShaderStage::Fragment,
        )?;

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trail uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trail pipeline layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let attributes = [wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x2,
            offset: 0,
            shader_location: attribute_location,
        }];
        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        };

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("trail pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[vertex_layout],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: target.depth_stencil.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: target.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.color,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SketchError::ProgramLink {
                log: err.to_string(),
            });
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("trail quad vertices"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("trail quad indices"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trail uniform buffer"),
            size: buffer_size(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trail uniform bind group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Ok(Self {
            vertex_buffer,
            index_buffer,
            pipeline,
            uniform_buffer,
            bind_group,
            uniforms,
            attribute_location,
            index_count: QUAD_INDICES.len() as u32,
        })
    }

    /// Records the trail draw into an open pass sized `width x height`.
    pub(crate) fn encode_draw(&self, pass: &mut wgpu::RenderPass<'_>, width: u32, height: u32) {
        pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
