//! mixforge - drive ffmpeg, ffplay and mpv as cancellable operations.
//!
//! [`Engine`] owns one operation registry and one set of discovered tools and
//! exposes every action. Each action blocks until its processes exit or the
//! caller's [`CancellationToken`] fires; a running operation can also be
//! stopped from elsewhere through [`Engine::terminate`].
//!
//! ```no_run
//! use mixforge::{Config, Engine, FadeSpec, MixSpec, ViceFile};
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> mixforge::Result<()> {
//! let engine = Engine::new(Config::default())?;
//! let spec = MixSpec::new("take1.wav")
//!     .with_vice_file(ViceFile::new("harmony.wav", 2_000))
//!     .with_fade_in(FadeSpec::new(0, 1_000));
//! engine.mix(&spec, Path::new("mixed.wav"), &CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mf_av::actions::{self, ActionContext};

pub use mf_av::{
    CancellableWaiter, FilterGraph, FormatInfo, OperationRegistry, ToolInfo, ToolRegistry,
};
pub use mf_core::config::{Config, OutputConfig, ToolsConfig};
pub use mf_core::{Error, FadeSpec, MixSpec, OperationId, Result, ViceFile};
pub use tokio_util::sync::CancellationToken;

/// Orchestrator owning the tools and the operation registry.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    ctx: ActionContext,
}

impl Engine {
    /// Discover tools per `config` and build an engine.
    ///
    /// # Errors
    ///
    /// [`Error::ToolNotFound`] if ffmpeg cannot be found.
    pub fn new(config: Config) -> Result<Self> {
        for warning in config.validate() {
            tracing::warn!("config: {warning}");
        }
        let tools = ToolRegistry::discover(&config.tools);
        Self::with_tools(config, tools)
    }

    /// Build an engine around an already-populated tool registry.
    ///
    /// # Errors
    ///
    /// [`Error::ToolNotFound`] if `tools` has no ffmpeg.
    pub fn with_tools(config: Config, tools: ToolRegistry) -> Result<Self> {
        let ffmpeg = tools.require("ffmpeg")?;
        tracing::info!("using ffmpeg at {}", ffmpeg.display());

        let waiter = CancellableWaiter::new(Arc::new(OperationRegistry::new()));
        let ctx = ActionContext::new(tools, waiter, config.output.clone());
        Ok(Self { config, ctx })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.ctx.tools
    }

    /// The registry tracking in-flight operations.
    pub fn registry(&self) -> &Arc<OperationRegistry> {
        self.ctx.operations.registry()
    }

    /// Ids of the operations currently running.
    pub fn active_operations(&self) -> Vec<OperationId> {
        self.registry().active_ids()
    }

    /// Kill every process of operation `id`.
    ///
    /// The action waiting on it returns [`Error::Cancelled`]. Unknown or
    /// already finished ids yield [`Error::NotFound`], which callers can
    /// ignore.
    pub fn terminate(&self, id: OperationId) -> Result<()> {
        self.ctx.operations.terminate(id)
    }

    pub async fn transcode_to_wav(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        actions::transcode_to_wav(&self.ctx, input, output, cancel).await
    }

    pub async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        actions::transcode(&self.ctx, input, output, cancel).await
    }

    pub async fn cut(
        &self,
        input: &Path,
        start_ms: u64,
        len_ms: u64,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        actions::cut(&self.ctx, input, start_ms, len_ms, output, cancel).await
    }

    pub async fn mix(
        &self,
        spec: &MixSpec,
        output: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        actions::mix(&self.ctx, spec, output, cancel).await
    }

    pub async fn preview_mix(&self, spec: &MixSpec, cancel: &CancellationToken) -> Result<()> {
        actions::preview_mix(&self.ctx, spec, cancel).await
    }

    pub async fn play(&self, path: &Path, cancel: &CancellationToken) -> Result<()> {
        actions::play(&self.ctx, path, cancel).await
    }

    pub async fn play_slice(
        &self,
        path: &Path,
        start_ms: u64,
        duration_ms: u64,
        cancel: &CancellationToken,
    ) -> Result<()> {
        actions::play_slice(&self.ctx, path, start_ms, duration_ms, cancel).await
    }

    pub async fn play_url(&self, url: &str, cancel: &CancellationToken) -> Result<()> {
        actions::play_url(&self.ctx, url, cancel).await
    }

    /// Container metadata of `path`.
    pub async fn probe_format(&self, path: &Path) -> Result<FormatInfo> {
        mf_av::probe_format(&self.ctx.tools, path).await
    }

    /// Duration of `path` in milliseconds, or 0 if it cannot be determined.
    pub async fn probe_duration(&self, path: &Path) -> u64 {
        mf_av::probe_duration(&self.ctx.tools, path).await
    }
}
