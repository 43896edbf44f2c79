//! Game configuration
//!
//! Read from `~/.config/scribble/config.toml` (or an explicit path). A missing
//! file means defaults; a malformed one is reported instead of silently ignored.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default judge endpoint (a local `scribble serve`)
pub const DEFAULT_JUDGE_ENDPOINT: &str = "http://127.0.0.1:3333/api/ai";

/// Default prompt list location (served by `scribble serve`)
pub const DEFAULT_PROMPTS_SOURCE: &str = "http://127.0.0.1:3333/prompts.txt";

/// Prompt shown before any prompt list has loaded
pub const DEFAULT_PROMPT: &str = "Circle";

/// Largest accepted canvas side, in logical pixels
pub const MAX_CANVAS_SIDE: f32 = 8192.0;

/// Logical size and pixel density of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 512.0,
            height: 512.0,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Client-side game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// URL of the judge endpoint (`POST { text, imageUrl }`)
    pub judge_endpoint: String,

    /// Prompt list: `http(s)://` URL or local file path
    pub prompts_source: String,

    /// Prompt used until a prompt list loads
    pub default_prompt: String,

    /// Points awarded per judged point
    pub reward_multiplier: u64,

    /// Brush diameter in logical pixels
    pub brush_width: f32,

    pub canvas: CanvasConfig,

    /// Where `save image` writes `<prompt>.png`
    pub export_dir: PathBuf,

    /// Judge request timeout
    pub request_timeout_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            judge_endpoint: DEFAULT_JUDGE_ENDPOINT.to_string(),
            prompts_source: DEFAULT_PROMPTS_SOURCE.to_string(),
            default_prompt: DEFAULT_PROMPT.to_string(),
            reward_multiplier: 1,
            brush_width: 4.0,
            canvas: CanvasConfig::default(),
            export_dir: PathBuf::from("."),
            request_timeout_secs: 30,
        }
    }
}

impl GameConfig {
    /// Default config file location: `<config_dir>/scribble/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("scribble").join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A file that does not exist yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(CoreError::FileRead { path, source }),
        };

        Self::from_toml(&content).map_err(|message| CoreError::InvalidConfig { path, message })
    }

    /// Parse and validate TOML content
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: GameConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.reward_multiplier == 0 {
            return Err("reward_multiplier must be at least 1".to_string());
        }
        if !(self.brush_width.is_finite() && self.brush_width > 0.0) {
            return Err("brush_width must be a positive number".to_string());
        }
        if !(self.canvas.device_pixel_ratio.is_finite() && self.canvas.device_pixel_ratio > 0.0) {
            return Err("canvas.device_pixel_ratio must be a positive number".to_string());
        }
        for (name, side) in [
            ("canvas.width", self.canvas.width),
            ("canvas.height", self.canvas.height),
        ] {
            if !(side.is_finite() && side > 0.0 && side <= MAX_CANVAS_SIDE) {
                return Err(format!(
                    "{} must be a positive number no larger than {}",
                    name, MAX_CANVAS_SIDE
                ));
            }
        }
        if self.default_prompt.trim().is_empty() {
            return Err("default_prompt must not be empty".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
