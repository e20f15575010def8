use std::borrow::Cow;

use wgpu::naga;

use crate::error::{ShaderStage, SketchError};
use crate::shader::{
    COLOR_UNIFORM, CURSOR_UNIFORM, OLD_CURSOR_UNIFORM, RESOLUTION_UNIFORM, TIME_UNIFORM,
};

/// Parses and validates a GLSL stage with naga.
///
/// Errors carry the frontend or validator diagnostics rendered against the
/// source, which is the closest thing to a driver info log that wgpu offers.
pub fn compile_stage(source: &str, stage: ShaderStage) -> Result<naga::Module, SketchError> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options::from(stage.to_naga());
    let module = frontend
        .parse(&options, source)
        .map_err(|errors| SketchError::ShaderCompile {
            stage,
            log: errors.emit_to_string(source),
        })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|err| SketchError::ShaderCompile {
            stage,
            log: err.emit_to_string(source),
        })?;

    Ok(module)
}

/// Hands a validated GLSL stage to the device.
///
/// Anything the device still rejects is caught through a validation error
/// scope and reported as a compile error for `stage`.
pub(crate) fn create_shader_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, SketchError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage: stage.to_naga(),
            defines: &[],
        },
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(SketchError::ShaderCompile {
            stage,
            log: err.to_string(),
        });
    }
    Ok(module)
}

/// Byte offsets of the trail uniforms inside their std140 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformLocations {
    pub resolution: u32,
    pub cursor_ndc: u32,
    pub old_cursor_ndc: u32,
    pub time: u32,
    pub color: u32,
    /// Size of the whole block, used to allocate the uniform buffer.
    pub block_size: u32,
}

#[derive(Clone, Copy, Debug)]
enum UniformKind {
    Float,
    Vec2,
    Vec3,
}

impl UniformKind {
    fn matches(self, inner: &naga::TypeInner) -> bool {
        match (self, inner) {
            (UniformKind::Float, naga::TypeInner::Scalar(scalar)) => *scalar == naga::Scalar::F32,
            (
                UniformKind::Vec2,
                naga::TypeInner::Vector {
                    size: naga::VectorSize::Bi,
                    scalar,
                },
            ) => *scalar == naga::Scalar::F32,
            (
                UniformKind::Vec3,
                naga::TypeInner::Vector {
                    size: naga::VectorSize::Tri,
                    scalar,
                },
            ) => *scalar == naga::Scalar::F32,
            _ => false,
        }
    }

    fn glsl_name(self) -> &'static str {
        match self {
            UniformKind::Float => "float",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
        }
    }
}

struct ResolvedMember {
    offset: u32,
    block_span: u32,
    binding: Option<naga::ResourceBinding>,
}

impl UniformLocations {
    /// Looks every trail uniform up in the uniform blocks of `modules`.
    pub fn resolve(modules: &[&naga::Module]) -> Result<Self, SketchError> {
        let resolution = find_uniform(modules, RESOLUTION_UNIFORM, UniformKind::Vec2)?;
        let cursor_ndc = find_uniform(modules, CURSOR_UNIFORM, UniformKind::Vec2)?;
        let old_cursor_ndc = find_uniform(modules, OLD_CURSOR_UNIFORM, UniformKind::Vec2)?;
        let time = find_uniform(modules, TIME_UNIFORM, UniformKind::Float)?;
        let color = find_uniform(modules, COLOR_UNIFORM, UniformKind::Vec3)?;

        for (name, member) in [
            (CURSOR_UNIFORM, &cursor_ndc),
            (OLD_CURSOR_UNIFORM, &old_cursor_ndc),
            (TIME_UNIFORM, &time),
            (COLOR_UNIFORM, &color),
        ] {
            if member.binding != resolution.binding {
                return Err(SketchError::ProgramLink {
                    log: format!(
                        "uniform `{name}` is declared in a different block than `{RESOLUTION_UNIFORM}`"
                    ),
                });
            }
        }

        Ok(Self {
            resolution: resolution.offset,
            cursor_ndc: cursor_ndc.offset,
            old_cursor_ndc: old_cursor_ndc.offset,
            time: time.offset,
            color: color.offset,
            block_size: resolution.block_span,
        })
    }
}

fn find_uniform(
    modules: &[&naga::Module],
    name: &str,
    kind: UniformKind,
) -> Result<ResolvedMember, SketchError> {
    for module in modules {
        for (_, global) in module.global_variables.iter() {
            if global.space != naga::AddressSpace::Uniform {
                continue;
            }
            let naga::TypeInner::Struct { members, span } = &module.types[global.ty].inner else {
                continue;
            };
            let Some(member) = members
                .iter()
                .find(|member| member.name.as_deref() == Some(name))
            else {
                continue;
            };
            if !kind.matches(&module.types[member.ty].inner) {
                return Err(SketchError::ProgramLink {
                    log: format!("uniform `{name}` must be declared as {}", kind.glsl_name()),
                });
            }
            return Ok(ResolvedMember {
                offset: member.offset,
                block_span: *span,
                binding: global.binding.clone(),
            });
        }
    }

    Err(SketchError::ProgramLink {
        log: format!("uniform `{name}` is not declared by any stage"),
    })
}

/// Finds the `location` of a named vertex-stage input.
pub fn attribute_location(module: &naga::Module, name: &str) -> Result<u32, SketchError> {
    module
        .entry_points
        .iter()
        .filter(|entry| entry.stage == naga::ShaderStage::Vertex)
        .flat_map(|entry| entry.function.arguments.iter())
        .find_map(|argument| match (&argument.name, &argument.binding) {
            (Some(arg_name), Some(naga::Binding::Location { location, .. })) if arg_name == name => {
                Some(*location)
            }
            _ => None,
        })
        .ok_or_else(|| SketchError::ProgramLink {
            log: format!("attribute `{name}` is not an input of the vertex stage"),
        })
}
