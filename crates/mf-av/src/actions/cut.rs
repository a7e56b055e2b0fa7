//! Stream-copy trimming.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use super::ActionContext;
use crate::destination::Destination;
use crate::filter_graph::format_seconds;

/// Copy `len_ms` of `input` starting at `start_ms` into `output` without
/// re-encoding.
pub async fn cut(
    ctx: &ActionContext,
    input: &Path,
    start_ms: u64,
    len_ms: u64,
    output: &Path,
    cancel: &CancellationToken,
) -> mf_core::Result<PathBuf> {
    tracing::info!(
        start_ms,
        len_ms,
        "cut {} -> {}",
        input.display(),
        output.display()
    );

    let dest = Destination::prepare(output)?;
    let mut cmd = ctx.ffmpeg()?;
    cmd.args(cut_args(input, start_ms, len_ms, dest.path()));

    ctx.run(cmd, cancel).await?;
    dest.finalize()
}

fn cut_args(input: &Path, start_ms: u64, len_ms: u64, output: &Path) -> Vec<String> {
    vec![
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-ss".into(),
        format_seconds(start_ms),
        "-t".into(),
        format_seconds(len_ms),
        "-c".into(),
        "copy".into(),
        output.to_string_lossy().into_owned(),
    ]
}
