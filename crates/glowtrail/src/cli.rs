use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(
    name = "glowtrail",
    author,
    version,
    about = "Draw a glowing trail with the pointer",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Configuration file to load instead of `glowtrail.toml` in the config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `1024x768`).
    #[arg(long, value_name = "WIDTHxHEIGHT")]
    pub size: Option<String>,

    /// Window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Frame rate cap for the animation loop (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Seed the stroke colour generator for repeatable colours.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Print the resolved configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Composite the window with its alpha channel.
    #[arg(long, value_name = "BOOL")]
    pub alpha: Option<bool>,

    /// Attach a depth buffer to the drawing pass.
    #[arg(long, value_name = "BOOL")]
    pub depth: Option<bool>,

    /// Attach a stencil buffer to the drawing pass.
    #[arg(long, value_name = "BOOL")]
    pub stencil: Option<bool>,

    /// Multisample the drawing buffer where supported.
    #[arg(long, value_name = "BOOL")]
    pub antialias: Option<bool>,

    /// Keep earlier segments on screen (`false` shows only the latest one).
    #[arg(long, value_name = "BOOL")]
    pub preserve_drawing_buffer: Option<bool>,

    /// Refuse to start on a software adapter.
    #[arg(long, value_name = "BOOL")]
    pub fail_if_major_performance_caveat: Option<bool>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
