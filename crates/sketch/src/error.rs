use std::fmt;

/// Pipeline stage a shader source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn to_naga(self) -> wgpu::naga::ShaderStage {
        match self {
            ShaderStage::Vertex => wgpu::naga::ShaderStage::Vertex,
            ShaderStage::Fragment => wgpu::naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors raised while mounting or running a sketch.
#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    /// No usable graphics context could be created for the surface.
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),
    /// A shader stage was rejected by the compiler.
    #[error("an error occurred compiling the {stage} shader:\n{log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    /// The compiled stages could not be linked into a pipeline.
    #[error("unable to initialize the shader program:\n{log}")]
    ProgramLink { log: String },
    /// A frame failed in a way that ends the session.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Failures reported by a single frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The surface needs reconfiguring; the frame can be retried next tick.
    #[error("frame skipped: {0}")]
    Recoverable(String),
    /// The context is unusable; no further frames should be issued.
    #[error("rendering context failed: {0}")]
    Fatal(String),
}

impl FrameError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::Fatal(_))
    }
}

impl From<wgpu::SurfaceError> for FrameError {
    fn from(value: wgpu::SurfaceError) -> Self {
        match value {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Timeout => {
                FrameError::Recoverable(format!("surface error: {value:?}"))
            }
            other => FrameError::Fatal(format!("surface error: {other:?}")),
        }
    }
}
