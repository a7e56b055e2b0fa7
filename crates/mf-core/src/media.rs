//! Media value types shared between the mixing compiler and the actions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{Error, Result};

/// A secondary audio source laid over the main track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViceFile {
    /// Path of the secondary source.
    pub path: PathBuf,
    /// Offset into the main track's timeline at which this source starts, in ms.
    pub start_local_ms: u64,
}

impl ViceFile {
    pub fn new(path: impl Into<PathBuf>, start_local_ms: u64) -> Self {
        Self {
            path: path.into(),
            start_local_ms,
        }
    }
}

/// A single fade window, used for both fade-in and fade-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeSpec {
    /// Start of the ramp, in ms from the beginning of the output.
    pub start_local_ms: u64,
    /// Length of the ramp, in ms.
    pub duration_ms: u64,
}

impl FadeSpec {
    pub fn new(start_local_ms: u64, duration_ms: u64) -> Self {
        Self {
            start_local_ms,
            duration_ms,
        }
    }
}

/// Everything needed to mix secondary tracks onto a main track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixSpec {
    pub main: PathBuf,
    #[serde(default)]
    pub vice_files: Vec<ViceFile>,
    /// Amplitude factor applied last; `1.0` leaves the level untouched.
    #[serde(default = "unity")]
    pub volume: f64,
    #[serde(default)]
    pub fade_in: Option<FadeSpec>,
    #[serde(default)]
    pub fade_out: Option<FadeSpec>,
}

fn unity() -> f64 {
    1.0
}

impl MixSpec {
    /// A spec that mixes nothing onto `main`.
    pub fn new(main: impl Into<PathBuf>) -> Self {
        Self {
            main: main.into(),
            vice_files: Vec::new(),
            volume: 1.0,
            fade_in: None,
            fade_out: None,
        }
    }

    pub fn with_vice_file(mut self, vice: ViceFile) -> Self {
        self.vice_files.push(vice);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_fade_in(mut self, fade: FadeSpec) -> Self {
        self.fade_in = Some(fade);
        self
    }

    pub fn with_fade_out(mut self, fade: FadeSpec) -> Self {
        self.fade_out = Some(fade);
        self
    }

    /// Whether the volume differs from unity and needs a volume stage.
    pub fn changes_volume(&self) -> bool {
        self.volume != 1.0
    }

    /// True when this mix describes no transformation at all. Such a request
    /// is served by copying (or playing) the main source directly.
    pub fn is_passthrough(&self) -> bool {
        self.vice_files.is_empty()
            && !self.changes_volume()
            && self.fade_in.is_none()
            && self.fade_out.is_none()
    }

    /// Reject values the engine cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(Error::Validation(format!(
                "volume must be a finite, non-negative factor (got {})",
                self.volume
            )));
        }
        for (name, fade) in [("fade_in", self.fade_in), ("fade_out", self.fade_out)] {
            if let Some(fade) = fade {
                if fade.duration_ms == 0 {
                    return Err(Error::Validation(format!("{name} duration must be non-zero")));
                }
            }
        }
        Ok(())
    }
}
