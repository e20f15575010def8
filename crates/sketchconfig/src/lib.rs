use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE_NAME: &str = "glowtrail.toml";

/// Slowest non-zero frame rate accepted.
pub const MIN_FPS: f32 = 1e-3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlowConfig {
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub context: ContextSection,
    #[serde(default)]
    pub frame: FrameSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "glowtrail".to_string(),
        }
    }
}

/// Graphics-context flags, passed through to context creation unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ContextSection {
    pub alpha: bool,
    pub depth: bool,
    pub stencil: bool,
    pub antialias: bool,
    pub preserve_drawing_buffer: bool,
    pub fail_if_major_performance_caveat: bool,
}

impl Default for ContextSection {
    fn default() -> Self {
        Self {
            alpha: false,
            depth: false,
            stencil: false,
            antialias: true,
            preserve_drawing_buffer: true,
            fail_if_major_performance_caveat: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FrameSection {
    /// Frame rate cap; `0` leaves the loop uncapped.
    #[serde(default = "default_fps", deserialize_with = "deserialize_fps")]
    pub fps: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_seed: Option<u64>,
}

impl Default for FrameSection {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            color_seed: None,
        }
    }
}

fn default_fps() -> f32 {
    60.0
}

fn deserialize_fps<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = f32;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a frame rate in frames per second or \"uncapped\"")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match v.trim().to_ascii_lowercase().as_str() {
                "uncapped" | "off" | "none" => Ok(0.0),
                other => other
                    .parse::<f32>()
                    .map_err(|err| E::custom(format!("invalid fps '{v}': {err}"))),
            }
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as f32)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as f32)
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as f32)
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            version: 1,
            window: WindowSection::default(),
            context: ContextSection::default(),
            frame: FrameSection::default(),
        }
    }
}

impl GlowConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: GlowConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Frame rate cap, or `None` when uncapped.
    pub fn target_fps(&self) -> Option<f32> {
        (self.frame.fps > 0.0).then_some(self.frame.fps)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if !self.frame.fps.is_finite() || self.frame.fps < 0.0 {
            return Err(ConfigError::Invalid("frame.fps must be >= 0".into()));
        }

        if self.frame.fps > 0.0 && self.frame.fps < MIN_FPS {
            return Err(ConfigError::Invalid(format!(
                "frame.fps must be 0 (uncapped) or at least {MIN_FPS}, got {}",
                self.frame.fps
            )));
        }

        Ok(())
    }
}
