//! Shared harness for integration tests.
//!
//! [`FakeTools`] writes small shell scripts into a temp directory that stand in
//! for ffmpeg, ffplay, ffprobe and mpv. Each script records its arguments next
//! to itself as `<name>.args`, one per line, so tests can assert on the exact
//! command line an action built.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use mixforge::{Config, Engine, ToolRegistry};
use tempfile::TempDir;

/// Records args, then writes `encoded` to the last argument, or WAV-ish bytes
/// to stdout when the last argument is `-`.
pub const FFMPEG_OK: &str = r#"
printf '%s\n' "$@" > "$(dirname "$0")/ffmpeg.args"
for last; do :; done
if [ "$last" = "-" ]; then
    printf 'RIFFfakewav'
else
    printf 'encoded' > "$last"
fi
"#;

pub const FFMPEG_FAIL: &str = r#"
printf '%s\n' "$@" > "$(dirname "$0")/ffmpeg.args"
exit 1
"#;

pub const FFMPEG_SLOW: &str = r#"
printf '%s\n' "$@" > "$(dirname "$0")/ffmpeg.args"
exec sleep 30
"#;

/// Records args and copies stdin to `ffplay.sink`.
pub const FFPLAY_SINK: &str = r#"
printf '%s\n' "$@" > "$(dirname "$0")/ffplay.args"
cat > "$(dirname "$0")/ffplay.sink"
"#;

pub const FFPROBE_3_5S: &str = r#"
printf '{"format": {"format_name": "wav", "duration": "3.500000", "size": "617444"}}'
"#;

pub const MPV_RECORD_PATH: &str = r#"
printf '%s\n' "$@" > "$(dirname "$0")/mpv.args"
printf '%s' "$PATH" > "$(dirname "$0")/mpv.path"
"#;

pub struct FakeTools {
    dir: TempDir,
    installed: Vec<(String, PathBuf)>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
            installed: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable `sh` script named `name`.
    pub fn install(mut self, name: &str, body: &str) -> Self {
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod script");
        self.installed.push((name.to_string(), path));
        self
    }

    /// Register a tool at a path that does not exist.
    pub fn missing(mut self, name: &str) -> Self {
        let path = self.dir.path().join(format!("{name}-not-installed"));
        self.installed.push((name.to_string(), path));
        self
    }

    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::from_paths(self.installed.iter().cloned())
    }

    pub fn engine(&self) -> Engine {
        Engine::with_tools(Config::default(), self.registry()).expect("engine without ffmpeg")
    }

    /// Arguments the named script was last invoked with, if it ran.
    pub fn args_of(&self, name: &str) -> Option<Vec<String>> {
        std::fs::read_to_string(self.dir.path().join(format!("{name}.args")))
            .ok()
            .map(|s| s.lines().map(str::to_string).collect())
    }

    pub fn read(&self, file: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(file)).ok()
    }
}

/// The argument following `flag`.
pub fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}
