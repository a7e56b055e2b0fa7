//! Mixing vice files into a main track, to a file or straight to the speakers.

use std::path::{Path, PathBuf};

use mf_core::MixSpec;
use tokio_util::sync::CancellationToken;

use super::ActionContext;
use crate::destination::{copy_file, Destination};
use crate::filter_graph::FilterGraph;
use crate::pipeline::PipedPipeline;

/// Render `spec` into `output`.
///
/// A spec with nothing to apply is a plain copy of the main source and never
/// starts the engine.
pub async fn mix(
    ctx: &ActionContext,
    spec: &MixSpec,
    output: &Path,
    cancel: &CancellationToken,
) -> mf_core::Result<PathBuf> {
    spec.validate()?;
    let dest = Destination::prepare(output)?;

    if spec.is_passthrough() {
        tracing::info!("mix is passthrough; copying {}", spec.main.display());
        copy_file(&spec.main, dest.path(), cancel).await?;
        return dest.finalize();
    }

    let graph = FilterGraph::build(spec)?;
    tracing::info!(
        vice_files = spec.vice_files.len(),
        "mix {} -> {}",
        spec.main.display(),
        output.display()
    );
    tracing::debug!(filter = graph.expression(), "filter graph");

    let mut cmd = ctx.ffmpeg()?;
    cmd.args(graph.to_args(&ctx.output));
    cmd.arg(dest.path().to_string_lossy().as_ref());

    ctx.run(cmd, cancel).await?;
    dest.finalize()
}

/// Play `spec` without writing a file.
///
/// The engine renders WAV to its stdout and the player reads it from stdin.
/// Both run as one operation, so cancellation stops both.
pub async fn preview_mix(
    ctx: &ActionContext,
    spec: &MixSpec,
    cancel: &CancellationToken,
) -> mf_core::Result<()> {
    spec.validate()?;

    if spec.is_passthrough() {
        return super::play(ctx, &spec.main, cancel).await;
    }

    let graph = FilterGraph::build(spec)?;
    tracing::info!(vice_files = spec.vice_files.len(), "preview mix of {}", spec.main.display());
    tracing::debug!(filter = graph.expression(), "filter graph");

    let mut producer = ctx.ffmpeg()?;
    producer.args(graph.to_args(&ctx.output));
    producer.args(["-f", "wav", "-"]);

    let mut consumer = ctx.ffplay()?;
    consumer.args(["-i", "-"]);

    let registry = ctx.operations.registry();
    let id = PipedPipeline::new(producer, consumer).start(registry).await?;
    ctx.operations.wait(id, cancel).await
}
