//! Audio extraction and format conversion.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use super::ActionContext;
use crate::destination::Destination;

/// Decode `input` to 16-bit PCM WAV.
pub async fn transcode_to_wav(
    ctx: &ActionContext,
    input: &Path,
    output: &Path,
    cancel: &CancellationToken,
) -> mf_core::Result<PathBuf> {
    tracing::info!("transcode {} -> wav {}", input.display(), output.display());

    let dest = Destination::prepare(output)?;
    let mut cmd = ctx.ffmpeg()?;
    cmd.args(wav_args(input, ctx.output.channels, dest.path()));

    ctx.run(cmd, cancel).await?;
    let written = dest.finalize()?;
    tracing::info!("transcoded {}", written.display());
    Ok(written)
}

/// Extract the audio of `input` into whatever container `output` names.
///
/// Extensions the engine cannot write directly (`.m4r`) are encoded under a
/// substitute name and renamed on success.
pub async fn transcode(
    ctx: &ActionContext,
    input: &Path,
    output: &Path,
    cancel: &CancellationToken,
) -> mf_core::Result<PathBuf> {
    tracing::info!("transcode {} -> {}", input.display(), output.display());

    let dest = Destination::prepare(output)?;
    let mut cmd = ctx.ffmpeg()?;
    cmd.args(audio_args(input, ctx.output.channels, dest.path()));

    ctx.run(cmd, cancel).await?;
    let written = dest.finalize()?;
    tracing::info!("transcoded {}", written.display());
    Ok(written)
}

fn wav_args(input: &Path, channels: u32, output: &Path) -> Vec<String> {
    vec![
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vn".into(),
        "-c:a".into(),
        "pcm_s16le".into(),
        "-ac".into(),
        channels.to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

fn audio_args(input: &Path, channels: u32, output: &Path) -> Vec<String> {
    vec![
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-vn".into(),
        "-ac".into(),
        channels.to_string(),
        output.to_string_lossy().into_owned(),
    ]
}
