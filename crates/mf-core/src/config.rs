//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! tool locations and the output format forced onto every mix. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tools: ToolsConfig,
    pub output: OutputConfig,
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

        if let Some(ref dir) = self.tools.bin_dir {
            if !dir.is_dir() {
                warnings.push(format!("tools.bin_dir {} is not a directory", dir.display()));
            }
        }

        for (name, path) in self.tools.overrides() {
            if let Some(path) = path {
                if !path.exists() {
                    warnings.push(format!(
                        "tools.{name}_path {} does not exist; falling back to discovery",
                        path.display()
                    ));
                }
            }
        }

        if self.output.channels == 0 {
            warnings.push("output.channels is 0; the engine will reject the mix".into());
        }
        if self.output.sample_rate == 0 {
            warnings.push("output.sample_rate is 0; the engine will reject the mix".into());
        }

        let levels = [
            "quiet", "panic", "fatal", "error", "warning", "info", "verbose", "debug", "trace",
        ];
        if !levels.contains(&self.output.loglevel.as_str()) {
            warnings.push(format!(
                "output.loglevel '{}' is not a recognized level (valid: {})",
                self.output.loglevel,
                levels.join(", ")
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Locations of the external tools.
///
/// An explicit `*_path` wins when it exists, then `bin_dir/<tool>`, then `PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directory holding ffmpeg, ffprobe and ffplay side by side.
    pub bin_dir: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub ffplay_path: Option<PathBuf>,
    pub mpv_path: Option<PathBuf>,
    pub youtube_dl_path: Option<PathBuf>,
}

impl ToolsConfig {
    /// Configure every engine tool to come from one directory.
    pub fn from_bin_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// The explicit override for a tool, if one is configured.
    pub fn override_for(&self, tool: &str) -> Option<&Path> {
        self.overrides()
            .into_iter()
            .find(|(name, _)| *name == tool)
            .and_then(|(_, path)| path)
    }

    fn overrides(&self) -> [(&'static str, Option<&Path>); 5] {
        [
            ("ffmpeg", self.ffmpeg_path.as_deref()),
            ("ffprobe", self.ffprobe_path.as_deref()),
            ("ffplay", self.ffplay_path.as_deref()),
            ("mpv", self.mpv_path.as_deref()),
            ("youtube-dl", self.youtube_dl_path.as_deref()),
        ]
    }
}

/// Output format forced onto every compiled mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(default = "default_channels")]
    pub channels: u32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// `-loglevel` passed to ffmpeg/ffplay; diagnostics go to our stderr.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            sample_rate: default_sample_rate(),
            loglevel: default_loglevel(),
        }
    }
}

fn default_channels() -> u32 {
    2
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_loglevel() -> String {
    "error".into()
}
