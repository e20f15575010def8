use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::TextureFormatFeatureFlags;

use crate::types::{ContextOptions, SurfaceDimensions};

/// Sample count requested when `antialias` is on.
const MSAA_SAMPLES: u32 = 4;

/// What the selected adapter turned out to be.
#[derive(Debug, Clone)]
pub(crate) struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    fn from_info(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub(crate) fn is_software(&self) -> bool {
        self.device_type == wgpu::DeviceType::Cpu
    }
}

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: SurfaceDimensions,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    /// True when the surface is composited without its alpha channel.
    pub opaque: bool,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: SurfaceDimensions,
        options: &ContextOptions,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_profile = AdapterProfile::from_info(&adapter.get_info());
        let is_software = adapter_profile.is_software();
        tracing::debug!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            is_software,
            "selected GPU adapter"
        );
        if is_software && options.fail_if_major_performance_caveat {
            bail!(
                "only a software adapter ({}) is available and performance caveats are not allowed",
                adapter_profile.name
            );
        }

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = initial_size.width.max(1);
        let requested_height = initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {requested_width}x{requested_height}"
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            bail!("surface reports no supported formats for this adapter");
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .unwrap_or_else(|| {
                tracing::warn!(
                    fallback = ?first_format,
                    "no linear (non-sRGB) surface format available"
                );
                first_format
            });

        let sample_count = select_sample_count(&adapter, surface_format, options.antialias, is_software);
        let depth_format = depth_stencil_format(options.depth, options.stencil);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("glowtrail device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let (alpha_mode, opaque) = select_alpha_mode(&surface_caps.alpha_modes, options.alpha);
        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .or_else(|| surface_caps.present_modes.first().copied())
            .unwrap_or(wgpu::PresentMode::Fifo);
        tracing::debug!(
            ?surface_format,
            ?present_mode,
            ?alpha_mode,
            sample_count,
            ?depth_format,
            "configuring surface"
        );

        let size = SurfaceDimensions::new(requested_width, requested_height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
            depth_format,
            opaque,
            adapter_profile,
        })
    }

    pub(crate) fn resize(&mut self, new_size: SurfaceDimensions) {
        if new_size.is_empty() {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Reapplies the current configuration after the surface was lost or went stale.
    pub(crate) fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn select_sample_count(
    adapter: &wgpu::Adapter,
    format: wgpu::TextureFormat,
    antialias: bool,
    is_software: bool,
) -> u32 {
    if !antialias {
        return 1;
    }
    if is_software {
        tracing::warn!("software rasterizer detected; disabling MSAA for performance");
        return 1;
    }

    let features = adapter.get_texture_format_features(format);
    let supported = features.flags.supported_sample_counts();
    if !supported.contains(&MSAA_SAMPLES) {
        tracing::warn!(
            ?format,
            ?supported,
            "surface format does not support {MSAA_SAMPLES}x MSAA; disabling antialiasing"
        );
        return 1;
    }
    if !features
        .flags
        .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
    {
        tracing::warn!(
            ?format,
            "surface format does not support MSAA resolve; disabling antialiasing"
        );
        return 1;
    }
    MSAA_SAMPLES
}

/// Picks the attachment format for the requested depth/stencil combination.
pub(crate) fn depth_stencil_format(depth: bool, stencil: bool) -> Option<wgpu::TextureFormat> {
    match (depth, stencil) {
        (true, true) => Some(wgpu::TextureFormat::Depth24PlusStencil8),
        (true, false) => Some(wgpu::TextureFormat::Depth32Float),
        (false, true) => Some(wgpu::TextureFormat::Stencil8),
        (false, false) => None,
    }
}

/// Returns the compositing mode and whether the canvas must be presented opaque.
pub(crate) fn select_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    alpha: bool,
) -> (wgpu::CompositeAlphaMode, bool) {
    if alpha {
        if modes.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
            return (wgpu::CompositeAlphaMode::PreMultiplied, false);
        }
        tracing::warn!(
            ?modes,
            "surface cannot composite premultiplied alpha; presenting opaque"
        );
    }
    if modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
        (wgpu::CompositeAlphaMode::Opaque, true)
    } else {
        (
            modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::CompositeAlphaMode;

    #[test]
    fn depth_and_stencil_share_one_attachment() {
        assert_eq!(
            depth_stencil_format(true, true),
            Some(wgpu::TextureFormat::Depth24PlusStencil8)
        );
        assert_eq!(
            depth_stencil_format(true, false),
            Some(wgpu::TextureFormat::Depth32Float)
        );
        assert_eq!(
            depth_stencil_format(false, true),
            Some(wgpu::TextureFormat::Stencil8)
        );
        assert_eq!(depth_stencil_format(false, false), None);
    }

    #[test]
    fn alpha_prefers_premultiplied_compositing() {
        let modes = [CompositeAlphaMode::Opaque, CompositeAlphaMode::PreMultiplied];
        assert_eq!(
            select_alpha_mode(&modes, true),
            (CompositeAlphaMode::PreMultiplied, false)
        );
        assert_eq!(
            select_alpha_mode(&modes, false),
            (CompositeAlphaMode::Opaque, true)
        );
    }

    #[test]
    fn alpha_falls_back_to_opaque() {
        let modes = [CompositeAlphaMode::Opaque];
        assert_eq!(
            select_alpha_mode(&modes, true),
            (CompositeAlphaMode::Opaque, true)
        );
        assert_eq!(
            select_alpha_mode(&[CompositeAlphaMode::Inherit], false),
            (CompositeAlphaMode::Inherit, true)
        );
    }
}
