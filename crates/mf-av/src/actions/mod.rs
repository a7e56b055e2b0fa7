//! High-level audio actions: transcoding, cutting, mixing, and playback.
//!
//! Every action builds its argument list, starts its processes through the
//! shared [`OperationRegistry`](crate::OperationRegistry), and blocks in the
//! [`CancellableWaiter`] until they exit or `cancel` fires. Each call is a
//! single attempt.

mod cut;
mod mix;
mod play;
mod transcode;

pub use cut::cut;
pub use mix::{mix, preview_mix};
pub use play::{play, play_slice, play_url};
pub use transcode::{transcode, transcode_to_wav};

use mf_core::config::OutputConfig;
use mf_core::Result;
use tokio_util::sync::CancellationToken;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;
use crate::waiter::CancellableWaiter;

/// Everything an action needs: discovered tools, the operation lifecycle,
/// and the output format settings.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub tools: ToolRegistry,
    pub operations: CancellableWaiter,
    pub output: OutputConfig,
}

impl ActionContext {
    pub fn new(tools: ToolRegistry, operations: CancellableWaiter, output: OutputConfig) -> Self {
        Self {
            tools,
            operations,
            output,
        }
    }

    /// An engine command with the configured loglevel already applied.
    pub(crate) fn ffmpeg(&self) -> Result<ToolCommand> {
        let mut cmd = ToolCommand::new(self.tools.require("ffmpeg")?);
        cmd.args(["-y", "-hide_banner", "-loglevel", self.output.loglevel.as_str()]);
        Ok(cmd)
    }

    /// A headless player command that exits at end of stream.
    pub(crate) fn ffplay(&self) -> Result<ToolCommand> {
        let mut cmd = ToolCommand::new(self.tools.require("ffplay")?);
        cmd.args(["-autoexit", "-nodisp", "-loglevel", self.output.loglevel.as_str()]);
        Ok(cmd)
    }

    /// Start `cmd` as a new operation and wait for it.
    pub(crate) async fn run(&self, mut cmd: ToolCommand, cancel: &CancellationToken) -> Result<()> {
        let handle = cmd.spawn()?;
        let id = self.operations.registry().create_or_append(None, handle)?;
        self.operations.wait(id, cancel).await
    }
}
