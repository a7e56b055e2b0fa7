//! Two-process pipelines: a producer streaming into a consumer.
//!
//! Used for previews, where ffmpeg renders a mix to stdout and ffplay reads it
//! from stdin with no intermediate file. Both processes are started before
//! either is awaited and are registered as one operation, so cancelling or
//! failing either side tears down both.

use std::process::Stdio;

use mf_core::{Error, OperationId, Result};

use crate::command::ToolCommand;
use crate::operations::OperationRegistry;

/// A producer whose stdout feeds a consumer's stdin.
#[derive(Debug)]
pub struct PipedPipeline {
    producer: ToolCommand,
    consumer: ToolCommand,
}

impl PipedPipeline {
    pub fn new(producer: ToolCommand, consumer: ToolCommand) -> Self {
        Self { producer, consumer }
    }

    /// Start both processes and register them as one operation.
    ///
    /// Nothing is registered unless both start. If the consumer cannot be
    /// started the producer is killed and reaped before the consumer's error
    /// is returned.
    ///
    /// # Errors
    ///
    /// [`Error::Spawn`] for whichever side failed to start.
    pub async fn start(mut self, registry: &OperationRegistry) -> Result<OperationId> {
        let producer = self.producer.pipe_stdout().spawn()?;

        let stdin: std::io::Result<Stdio> = match producer.take_stdout() {
            Some(stdout) => stdout.try_into(),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "producer stdout was not captured",
            )),
        };

        let consumer = match stdin {
            Ok(stdin) => self.consumer.stdin(stdin).spawn(),
            Err(e) => Err(Error::spawn(producer.tool(), e)),
        };

        match consumer {
            Ok(consumer) => {
                let id = registry.register(vec![producer, consumer]);
                tracing::debug!(%id, "pipeline started");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!("pipeline consumer failed to start, stopping producer: {e}");
                producer.kill();
                if let Err(reaped) = producer.wait().await {
                    tracing::debug!("producer exit after teardown: {reaped}");
                }
                Err(e)
            }
        }
    }
}
