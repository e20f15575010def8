/// Pixel dimensions of a drawable surface.
///
/// The same type describes both the externally-driven display size and the
/// backing store the trail is drawn into; the sizing pass keeps the two equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceDimensions {
    pub width: u32,
    pub height: u32,
}

impl SurfaceDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A surface with no pixels on one axis cannot be rendered into.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_f32(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceDimensions {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

/// A point in normalized device coordinates (`[-1, 1]` on both axes, y up).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ndc {
    pub x: f32,
    pub y: f32,
}

impl Ndc {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Maps a pixel position measured from the surface's top-left corner into
    /// NDC, flipping the vertical axis to the bottom-left graphics convention.
    pub fn from_pixel(x: f32, y: f32, surface: SurfaceDimensions) -> Self {
        let width = surface.width.max(1) as f32;
        let height = surface.height.max(1) as f32;
        let flipped_y = height - y;
        Self {
            x: x / width * 2.0 - 1.0,
            y: flipped_y / height * 2.0 - 1.0,
        }
    }

    pub fn to_array(self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// RGB stroke colour with components in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StrokeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl StrokeColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Graphics-context feature flags requested at construction time.
///
/// The flags are handed to context creation as-is; see `gpu::context` for how
/// each one maps onto the adapter, surface and drawing buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextOptions {
    /// Composite the surface with its alpha channel instead of as opaque.
    pub alpha: bool,
    /// Attach a depth buffer to the drawing pass.
    pub depth: bool,
    /// Attach a stencil buffer to the drawing pass.
    pub stencil: bool,
    /// Multisample the drawing buffer when the surface format allows it.
    pub antialias: bool,
    /// Keep previously drawn segments between frames instead of clearing.
    pub preserve_drawing_buffer: bool,
    /// Refuse software (CPU) adapters.
    pub fail_if_major_performance_caveat: bool,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            alpha: true,
            depth: false,
            stencil: false,
            antialias: true,
            preserve_drawing_buffer: true,
            fail_if_major_performance_caveat: false,
        }
    }
}

/// Immutable configuration passed to the sketch at mount time.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Window title shown while the context is healthy.
    pub title: String,
    /// Feature flags forwarded to context creation.
    pub context: ContextOptions,
    /// Animation frame rate cap; `None` requests a frame on every wake-up.
    pub target_fps: Option<f32>,
    /// Fixed seed for stroke colours; `None` seeds from the OS.
    pub color_seed: Option<u64>,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            title: "glowtrail".to_string(),
            context: ContextOptions::default(),
            target_fps: Some(60.0),
            color_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_origin_maps_to_top_left_ndc() {
        let surface = SurfaceDimensions::new(800, 600);
        assert_eq!(Ndc::from_pixel(0.0, 0.0, surface), Ndc::new(-1.0, 1.0));
        assert_eq!(Ndc::from_pixel(800.0, 600.0, surface), Ndc::new(1.0, -1.0));
        assert_eq!(Ndc::from_pixel(400.0, 300.0, surface), Ndc::new(0.0, 0.0));
    }

    #[test]
    fn empty_surface_does_not_divide_by_zero() {
        let point = Ndc::from_pixel(0.0, 0.0, SurfaceDimensions::new(0, 0));
        assert!(point.x.is_finite());
        assert!(point.y.is_finite());
    }
}
