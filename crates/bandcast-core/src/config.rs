//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! tool and conversion sub-configs. Every section defaults sensibly so a
//! completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::params::{AUDIO_SAMPLE_RATE, BUFFER_SIZE_LIMIT, DEFAULT_FPS, DEFAULT_QUALITY, MAX_QUALITY, MIN_QUALITY};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub convert: ConvertConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(ref p) = self.tools.ffmpeg_path {
            if !p.exists() {
                warnings.push(format!(
                    "tools.ffmpeg_path {} does not exist; falling back to PATH lookup",
                    p.display()
                ));
            }
        }

        if self.convert.default_fps == 0 {
            warnings.push("convert.default_fps is 0".into());
        }
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.convert.default_quality) {
            warnings.push(format!(
                "convert.default_quality {} outside {}..={}",
                self.convert.default_quality, MIN_QUALITY, MAX_QUALITY
            ));
        }
        if self.convert.buffer_size_limit == 0 {
            warnings.push("convert.buffer_size_limit is 0; every conversion will be rejected".into());
        }
        if self.convert.engine_timeout_secs == 0 {
            warnings.push("convert.engine_timeout_secs is 0; the engine will always time out".into());
        }

        warnings
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
}

/// Conversion defaults derived from the device's declared capability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Default output frame rate.
    #[serde(default = "default_fps")]
    pub default_fps: u32,
    /// Default MJPEG quantizer.
    #[serde(default = "default_quality")]
    pub default_quality: u32,
    /// Mono PCM sample rate for the audio stream.
    #[serde(default = "default_sample_rate")]
    pub audio_sample_rate: u32,
    /// Per-stream decode buffer budget in bytes.
    #[serde(default = "default_buffer_limit")]
    pub buffer_size_limit: u32,
    /// Maximum engine execution time per attempt, in seconds.
    #[serde(default = "default_engine_timeout")]
    pub engine_timeout_secs: u64,
}

fn default_fps() -> u32 {
    DEFAULT_FPS
}
fn default_quality() -> u32 {
    DEFAULT_QUALITY
}
fn default_sample_rate() -> u32 {
    AUDIO_SAMPLE_RATE
}
fn default_buffer_limit() -> u32 {
    BUFFER_SIZE_LIMIT
}
fn default_engine_timeout() -> u64 {
    300
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            default_fps: default_fps(),
            default_quality: default_quality(),
            audio_sample_rate: default_sample_rate(),
            buffer_size_limit: default_buffer_limit(),
            engine_timeout_secs: default_engine_timeout(),
        }
    }
}
