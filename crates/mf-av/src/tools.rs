//! External tool detection and management.
//!
//! The [`ToolRegistry`] discovers and caches the locations of the external
//! programs mixforge drives (ffmpeg, ffprobe, ffplay, mpv, youtube-dl) and
//! provides lookup methods for the rest of the crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mf_core::config::ToolsConfig;
use serde::{Deserialize, Serialize};

/// Known tool names that the registry manages.
pub const KNOWN_TOOLS: &[&str] = &["ffmpeg", "ffprobe", "ffplay", "mpv", "youtube-dl"];

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool paths.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, PathBuf>,
}

impl ToolRegistry {
    /// Discover tools from the configuration, then `PATH`.
    ///
    /// For each known tool an explicit override is used when it exists, then
    /// `bin_dir/<tool>` (with the platform executable suffix), and finally
    /// [`which::which`]. Tools that are not found are silently omitted.
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            if let Some(path) = resolve(name, config) {
                tracing::debug!("discovered {name} at {}", path.display());
                tools.insert(name.to_string(), path);
            }
        }

        Self { tools }
    }

    /// Build a registry from explicit paths without probing the filesystem.
    pub fn from_paths<I, N, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            tools: paths
                .into_iter()
                .map(|(name, path)| (name.into(), path.into()))
                .collect(),
        }
    }

    /// Path of the given tool, or [`mf_core::Error::ToolNotFound`].
    pub fn require(&self, name: &str) -> mf_core::Result<&Path> {
        self.tools
            .get(name)
            .map(PathBuf::as_path)
            .ok_or_else(|| mf_core::Error::tool_not_found(name))
    }

    /// Whether discovery found the tool.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(path) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(name, path),
                    path: Some(path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

fn resolve(name: &str, config: &ToolsConfig) -> Option<PathBuf> {
    if let Some(p) = config.override_for(name) {
        if p.exists() {
            return Some(p.to_path_buf());
        }
        tracing::warn!(
            "configured path for {name} does not exist: {}; falling back",
            p.display()
        );
    }

    if let Some(dir) = config.bin_dir.as_deref() {
        let candidate = dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
        if candidate.exists() {
            return Some(candidate);
        }
    }

    which::which(name).ok()
}

/// Run `<tool> -version` (or `--version` for mpv/youtube-dl) and return the
/// first line of stdout.
fn detect_version(name: &str, path: &Path) -> Option<String> {
    let version_arg = match name {
        "ffmpeg" | "ffprobe" | "ffplay" => "-version",
        _ => "--version",
    };

    let output = std::process::Command::new(path)
        .arg(version_arg)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discover_with_default_config() {
        let registry = ToolRegistry::discover(&ToolsConfig::default());
        // Nothing is guaranteed to be installed; the call must not panic.
        let _ = registry.check_all();
    }

    #[test]
    fn require_missing_tool_returns_error() {
        let registry = ToolRegistry::default();
        let err = registry.require("ffmpeg").unwrap_err();
        assert!(matches!(err, mf_core::Error::ToolNotFound { .. }));
    }

    #[test]
    fn check_all_returns_known_tools() {
        let registry = ToolRegistry::default();
        let infos = registry.check_all();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, KNOWN_TOOLS);
        assert!(infos.iter().all(|i| !i.available));
    }

    #[test]
    fn bin_dir_is_searched() {
        let dir = tempfile::tempdir().unwrap();
        let ffplay = dir
            .path()
            .join(format!("ffplay{}", std::env::consts::EXE_SUFFIX));
        std::fs::write(&ffplay, b"").unwrap();

        let registry = ToolRegistry::discover(&ToolsConfig::from_bin_dir(dir.path()));
        assert_eq!(registry.require("ffplay").unwrap(), ffplay.as_path());
    }

    #[test]
    fn explicit_override_wins_over_bin_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(format!("ffmpeg{}", std::env::consts::EXE_SUFFIX)),
            b"",
        )
        .unwrap();
        let custom = dir.path().join("custom-ffmpeg");
        std::fs::write(&custom, b"").unwrap();

        let config = ToolsConfig {
            bin_dir: Some(dir.path().to_path_buf()),
            ffmpeg_path: Some(custom.clone()),
            ..ToolsConfig::default()
        };
        let registry = ToolRegistry::discover(&config);
        assert_eq!(registry.require("ffmpeg").unwrap(), custom.as_path());
    }

    #[test]
    fn from_paths_registers_entries() {
        let registry = ToolRegistry::from_paths([("ffmpeg", "/bin/sh")]);
        assert!(registry.contains("ffmpeg"));
        assert!(!registry.contains("ffplay"));
    }
}
