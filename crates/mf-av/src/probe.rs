//! Container-level metadata via `ffprobe -show_format`.
//!
//! Only the `format` section is read, and it is mapped into the typed
//! [`FormatInfo`] at this boundary. Nothing untyped leaves this module.

use std::path::Path;

use serde::Deserialize;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Container metadata for one media file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatInfo {
    pub format_name: Option<String>,
    /// Duration in milliseconds, if the prober reported a usable value.
    pub duration_ms: Option<u64>,
    pub size: Option<u64>,
    pub bit_rate: Option<u64>,
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<Numeric>,
    size: Option<Numeric>,
    bit_rate: Option<Numeric>,
}

/// ffprobe prints numbers as strings; some builds and wrappers emit bare
/// numbers instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl Numeric {
    /// Interpret as seconds and convert to milliseconds.
    ///
    /// A bare integer `duration` is whole seconds, the same unit as ffprobe's
    /// textual `"12.345"`. It is never taken to already be milliseconds, so
    /// a wrapper emitting `90` means a 90 000 ms file.
    fn seconds_to_ms(&self) -> Option<u64> {
        let secs = match self {
            Numeric::Integer(v) => return v.checked_mul(1000),
            Numeric::Float(v) => *v,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (secs.is_finite() && secs >= 0.0).then(|| (secs * 1000.0).round() as u64)
    }

    fn as_u64(&self) -> Option<u64> {
        match self {
            Numeric::Integer(v) => Some(*v),
            Numeric::Float(v) => (v.is_finite() && *v >= 0.0).then(|| *v as u64),
            Numeric::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Parse `ffprobe -show_format -print_format json` output.
///
/// # Errors
///
/// [`mf_core::Error::Probe`] if the JSON is malformed or has no `format`
/// section. Individual fields that fail to parse become `None`.
pub fn parse_format_json(json: &str) -> mf_core::Result<FormatInfo> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| mf_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let format = output
        .format
        .ok_or_else(|| mf_core::Error::Probe("ffprobe output has no format section".into()))?;

    Ok(FormatInfo {
        format_name: format.format_name,
        duration_ms: format.duration.as_ref().and_then(Numeric::seconds_to_ms),
        size: format.size.as_ref().and_then(Numeric::as_u64),
        bit_rate: format.bit_rate.as_ref().and_then(Numeric::as_u64),
    })
}

/// Probe the container metadata of `path`.
///
/// # Errors
///
/// - [`mf_core::Error::ToolNotFound`] if ffprobe was not discovered.
/// - [`mf_core::Error::Spawn`] / [`mf_core::Error::Process`] if ffprobe fails.
/// - [`mf_core::Error::Probe`] if its output cannot be parsed.
pub async fn probe_format(tools: &ToolRegistry, path: &Path) -> mf_core::Result<FormatInfo> {
    let ffprobe = tools.require("ffprobe")?;

    let mut cmd = ToolCommand::new(ffprobe);
    cmd.arg("-i");
    cmd.arg(path.to_string_lossy().as_ref());
    cmd.args(["-show_format", "-print_format", "json", "-loglevel", "error"]);

    let stdout = cmd.output().await?;
    parse_format_json(&stdout)
}

/// Duration of `path` in milliseconds; `0` when it cannot be determined.
pub async fn probe_duration(tools: &ToolRegistry, path: &Path) -> u64 {
    match probe_format(tools, path).await {
        Ok(info) => info.duration_ms.unwrap_or(0),
        Err(e) => {
            tracing::debug!("duration probe failed for {}: {e}", path.display());
            0
        }
    }
}
