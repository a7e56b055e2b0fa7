//! Waiting on operations with caller-driven cancellation.
//!
//! [`CancellableWaiter::wait`] races natural completion of an operation's
//! processes against the caller's [`CancellationToken`]. Whichever finishes
//! first resolves the operation through its single resolution slot, so natural
//! completion and termination can never both take effect, and the registry
//! entry is removed exactly once after resolution.

use std::sync::Arc;

use futures::future::join_all;
use mf_core::{Error, OperationId, Result};
use tokio_util::sync::CancellationToken;

use crate::command::ProcessHandle;
use crate::operations::{OperationRegistry, Resolution};

/// Blocks on registered operations and terminates them on request.
#[derive(Debug, Clone)]
pub struct CancellableWaiter {
    registry: Arc<OperationRegistry>,
}

impl CancellableWaiter {
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    /// Wait for every process of `id` to exit, terminating them if `cancel`
    /// fires first.
    ///
    /// All processes are awaited together. Once one fails the others are
    /// killed, whichever side of a pipe it sat on, and every handle is still
    /// reaped before this returns.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `id` is not registered.
    /// - [`Error::Cancelled`] if the operation was terminated before it
    ///   completed on its own. Its detail holds the killed process's status.
    /// - [`Error::Process`] for the earliest-spawned process that failed on its
    ///   own.
    pub async fn wait(&self, id: OperationId, cancel: &CancellationToken) -> Result<()> {
        let op = self.registry.lookup(id)?;

        let reap = reap_all(op.processes());
        tokio::pin!(reap);

        let natural = tokio::select! {
            biased;
            outcome = &mut reap => Some(outcome),
            _ = cancel.cancelled() => None,
        };

        let outcome = match natural {
            Some(outcome) => outcome,
            None => {
                tracing::info!(%id, "cancellation requested; terminating operation");
                if let Err(e) = self.terminate(id) {
                    tracing::debug!(%id, "terminate skipped: {e}");
                }
                // Kill is only a request; the OS still has to confirm exit.
                reap.await
            }
        };

        op.resolve(Resolution::Completed);
        self.registry.remove(id);

        match op.resolution() {
            Some(Resolution::Terminated) => {
                Err(Error::cancelled(id, outcome.err().map(|e| e.to_string())))
            }
            _ => outcome,
        }
    }

    /// Kill every process of `id` and remove it from the registry.
    ///
    /// Kills are fire-and-forget; a wait in progress observes the exits. If
    /// the operation already resolved (completed naturally or was terminated)
    /// nothing is killed again.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if `id` is not registered. Callers treat this as a
    /// no-op; it has no side effects.
    pub fn terminate(&self, id: OperationId) -> Result<()> {
        let op = self.registry.lookup(id)?;

        if !op.resolve(Resolution::Terminated) {
            tracing::debug!(%id, state = ?op.state(), "operation already resolved");
            return Ok(());
        }

        for process in op.processes() {
            process.kill();
        }
        self.registry.remove(id);
        tracing::info!(%id, processes = op.processes().len(), "operation terminated");
        Ok(())
    }
}

/// Await every process concurrently. The first one to fail tears down the
/// rest, so a consumer that dies never waits on its producer.
///
/// The reported failure is the earliest-spawned process that was not killed
/// by that teardown, falling back to the earliest failure of all.
async fn reap_all(processes: &[Arc<ProcessHandle>]) -> Result<()> {
    let waits = processes.iter().enumerate().map(|(i, process)| async move {
        let outcome = process.wait().await;
        if let Err(e) = &outcome {
            tracing::debug!(tool = process.tool(), "process failed: {e}");
            for (j, other) in processes.iter().enumerate() {
                if j != i {
                    other.kill();
                }
            }
        }
        outcome
    });
    let outcomes = join_all(waits).await;

    let mut fallback = None;
    for (process, outcome) in processes.iter().zip(outcomes) {
        if let Err(e) = outcome {
            if !process.is_killed() {
                return Err(e);
            }
            fallback.get_or_insert(e);
        }
    }
    fallback.map_or(Ok(()), Err)
}
