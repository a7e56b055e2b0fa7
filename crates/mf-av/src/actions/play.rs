//! Headless playback through ffplay, and URL playback through mpv.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use super::ActionContext;
use crate::command::ToolCommand;
use crate::filter_graph::format_seconds;

/// Play `path` to the end.
pub async fn play(
    ctx: &ActionContext,
    path: &Path,
    cancel: &CancellationToken,
) -> mf_core::Result<()> {
    tracing::info!("play {}", path.display());

    let mut cmd = ctx.ffplay()?;
    cmd.arg("-i");
    cmd.arg(path.to_string_lossy().as_ref());
    ctx.run(cmd, cancel).await
}

/// Play `duration_ms` of `path` starting at `start_ms`.
pub async fn play_slice(
    ctx: &ActionContext,
    path: &Path,
    start_ms: u64,
    duration_ms: u64,
    cancel: &CancellationToken,
) -> mf_core::Result<()> {
    tracing::info!(start_ms, duration_ms, "play slice of {}", path.display());

    let mut cmd = ctx.ffplay()?;
    cmd.args(["-ss".to_string(), format_seconds(start_ms)]);
    cmd.args(["-t".to_string(), format_seconds(duration_ms)]);
    cmd.arg("-i");
    cmd.arg(path.to_string_lossy().as_ref());
    ctx.run(cmd, cancel).await
}

/// Stream the audio of a web page or media URL through mpv.
///
/// mpv resolves page URLs through youtube-dl, which it finds on `PATH`. When
/// youtube-dl was discovered outside `PATH` its directory is prepended for
/// this child only.
pub async fn play_url(
    ctx: &ActionContext,
    url: &str,
    cancel: &CancellationToken,
) -> mf_core::Result<()> {
    tracing::info!("play url {url}");

    let mut cmd = ToolCommand::new(ctx.tools.require("mpv")?);
    cmd.args(["--no-video", url]);

    if let Ok(youtube_dl) = ctx.tools.require("youtube-dl") {
        if let Some(path) = youtube_dl.parent().and_then(prepend_to_path) {
            cmd.env("PATH", path);
        }
    }

    ctx.run(cmd, cancel).await
}

fn prepend_to_path(dir: &Path) -> Option<OsString> {
    if dir.as_os_str().is_empty() {
        return None;
    }

    let mut dirs: Vec<PathBuf> = vec![dir.to_path_buf()];
    if let Some(current) = std::env::var_os("PATH") {
        dirs.extend(std::env::split_paths(&current).filter(|p| p != dir));
    }

    match std::env::join_paths(dirs) {
        Ok(joined) => Some(joined),
        Err(e) => {
            tracing::warn!("cannot add {} to PATH: {e}", dir.display());
            None
        }
    }
}
