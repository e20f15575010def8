use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use sketch::{ContextOptions, Sketch, SketchConfig};
use sketchconfig::GlowConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::paths;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    if cli.print_config {
        let text = config
            .to_toml_string()
            .context("failed to render resolved configuration")?;
        print!("{text}");
        return Ok(());
    }

    Sketch::new(sketch_config(&config)).run()
}

fn resolve_config(cli: &Cli) -> Result<GlowConfig> {
    let mut config = match &cli.config {
        Some(path) => GlowConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => load_default_config()?,
    };
    apply_overrides(&mut config, cli)?;
    config
        .validate()
        .context("configuration rejected after applying command-line overrides")?;
    Ok(config)
}

fn load_default_config() -> Result<GlowConfig> {
    let path = paths::default_config_file()?;
    load_optional(&path)
}

fn load_optional(path: &Path) -> Result<GlowConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file found; using defaults");
        return Ok(GlowConfig::default());
    }
    tracing::info!(path = %path.display(), "loading config");
    GlowConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

fn apply_overrides(config: &mut GlowConfig, cli: &Cli) -> Result<()> {
    if let Some(size) = cli.size.as_deref() {
        let (width, height) = parse_surface_size(size)?;
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(title) = &cli.title {
        config.window.title = title.clone();
    }
    if let Some(fps) = cli.fps {
        config.frame.fps = fps;
    }
    if let Some(seed) = cli.seed {
        config.frame.color_seed = Some(seed);
    }

    let context = &mut config.context;
    let flags = [
        (&mut context.alpha, cli.alpha),
        (&mut context.depth, cli.depth),
        (&mut context.stencil, cli.stencil),
        (&mut context.antialias, cli.antialias),
        (&mut context.preserve_drawing_buffer, cli.preserve_drawing_buffer),
        (
            &mut context.fail_if_major_performance_caveat,
            cli.fail_if_major_performance_caveat,
        ),
    ];
    for (slot, value) in flags {
        if let Some(value) = value {
            *slot = value;
        }
    }
    Ok(())
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow!("expected WxH format, e.g. 1024x768"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

fn sketch_config(config: &GlowConfig) -> SketchConfig {
    let context = &config.context;
    SketchConfig {
        surface_size: (config.window.width, config.window.height),
        title: config.window.title.clone(),
        context: ContextOptions {
            alpha: context.alpha,
            depth: context.depth,
            stencil: context.stencil,
            antialias: context.antialias,
            preserve_drawing_buffer: context.preserve_drawing_buffer,
            fail_if_major_performance_caveat: context.fail_if_major_performance_caveat,
        },
        target_fps: config.target_fps(),
        color_seed: config.frame.color_seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_size_variants() {
        assert_eq!(parse_surface_size("1024x768").unwrap(), (1024, 768));
        assert_eq!(parse_surface_size(" 640 X 480 ").unwrap(), (640, 480));
        assert_eq!(parse_surface_size("320×200").unwrap(), (320, 200));
    }

    #[test]
    fn rejects_malformed_sizes() {
        assert!(parse_surface_size("1024").is_err());
        assert!(parse_surface_size("0x768").is_err());
        assert!(parse_surface_size("axb").is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = GlowConfig::default();
        let cli = Cli {
            size: Some("640x480".into()),
            title: Some("doodle".into()),
            fps: Some(0.0),
            seed: Some(7),
            alpha: Some(true),
            preserve_drawing_buffer: Some(false),
            ..Cli::default()
        };
        apply_overrides(&mut config, &cli).unwrap();

        assert_eq!((config.window.width, config.window.height), (640, 480));
        assert_eq!(config.window.title, "doodle");
        assert_eq!(config.target_fps(), None);
        assert_eq!(config.frame.color_seed, Some(7));
        assert!(config.context.alpha);
        assert!(!config.context.preserve_drawing_buffer);
        assert!(config.context.antialias);
        assert!(!config.context.depth);
    }

    #[test]
    fn sketch_config_mirrors_resolved_values() {
        let mut config = GlowConfig::default();
        config.context.stencil = true;
        config.frame.color_seed = Some(3);
        let sketch = sketch_config(&config);

        assert_eq!(sketch.surface_size, (800, 600));
        assert_eq!(sketch.title, "glowtrail");
        assert!(sketch.context.stencil);
        assert!(!sketch.context.alpha);
        assert_eq!(sketch.target_fps, Some(60.0));
        assert_eq!(sketch.color_seed, Some(3));
    }

    #[test]
    fn missing_optional_file_uses_defaults() {
        let root = TempDir::new().unwrap();
        let config = load_optional(&root.path().join("glowtrail.toml")).unwrap();
        assert_eq!(config, GlowConfig::default());
    }

    #[test]
    fn broken_optional_file_is_an_error() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("glowtrail.toml");
        fs::write(&path, "version = \"one\"").unwrap();
        assert!(load_optional(&path).is_err());
    }
}
