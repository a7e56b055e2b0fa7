//! Launching external tool processes.
//!
//! [`ToolCommand`] builds one invocation; [`ToolCommand::spawn`] starts it and
//! returns a [`ProcessHandle`] as soon as the process is running. The child's
//! stderr is always the parent's stderr, so engine diagnostics stay visible to
//! the operator without being parsed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// A builder for constructing and launching external tool invocations.
///
/// # Example
///
/// ```no_run
/// use mf_av::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> mf_core::Result<()> {
/// let handle = ToolCommand::new(PathBuf::from("ffplay"))
///     .args(["-autoexit", "-nodisp", "-i", "song.wav"])
///     .spawn()?;
/// handle.wait().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, OsString)>,
    stdin: Option<Stdio>,
    pipe_stdout: bool,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            stdin: None,
            pipe_stdout: false,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child only.
    pub fn env(&mut self, key: impl Into<String>, value: impl Into<OsString>) -> &mut Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Feed the child's stdin from the given source.
    pub fn stdin(&mut self, stdin: Stdio) -> &mut Self {
        self.stdin = Some(stdin);
        self
    }

    /// Capture stdout so it can be handed to another process.
    pub fn pipe_stdout(&mut self) -> &mut Self {
        self.pipe_stdout = true;
        self
    }

    /// The configured program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The arguments appended so far.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn build(&mut self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.stdin(self.stdin.take().unwrap_or_else(Stdio::null));
        cmd.stdout(if self.pipe_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stderr(Stdio::inherit());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Start the process and return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`mf_core::Error::Spawn`] if the binary is missing or cannot be
    /// executed.
    pub fn spawn(&mut self) -> mf_core::Result<ProcessHandle> {
        let tool = self.tool_name();
        let child = self
            .build()
            .spawn()
            .map_err(|e| mf_core::Error::spawn(tool.clone(), e))?;

        tracing::debug!(
            tool = %tool,
            pid = ?child.id(),
            "spawned: {} {}",
            self.program.display(),
            self.args.join(" ")
        );

        Ok(ProcessHandle::new(tool, child))
    }

    /// Run to completion and return captured stdout (lossy UTF-8).
    ///
    /// # Errors
    ///
    /// - [`mf_core::Error::Spawn`] if the process cannot be started.
    /// - [`mf_core::Error::Process`] if it exits with a non-zero status.
    pub async fn output(&mut self) -> mf_core::Result<String> {
        let tool = self.tool_name();
        self.pipe_stdout = true;
        let child = self
            .build()
            .spawn()
            .map_err(|e| mf_core::Error::spawn(tool.clone(), e))?;

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(mf_core::Error::process(tool, output.status));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// A running (or finished) external process.
///
/// `wait` and `kill` may be called from different tasks. `kill` raises a flag
/// and signals the process directly when no wait holds it; otherwise the
/// pending wait delivers the signal and reaps the child. Dropping an unawaited
/// handle kills the process.
#[derive(Debug)]
pub struct ProcessHandle {
    tool: String,
    pid: Option<u32>,
    child: Mutex<Child>,
    stdout: parking_lot::Mutex<Option<ChildStdout>>,
    kill_switch: CancellationToken,
}

impl ProcessHandle {
    fn new(tool: String, mut child: Child) -> Self {
        let stdout = child.stdout.take();
        Self {
            tool,
            pid: child.id(),
            child: Mutex::new(child),
            stdout: parking_lot::Mutex::new(stdout),
            kill_switch: CancellationToken::new(),
        }
    }

    /// Name of the tool this process runs.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// OS process id, if the process was still running when spawned.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take the piped stdout, if [`ToolCommand::pipe_stdout`] was requested.
    pub fn take_stdout(&self) -> Option<ChildStdout> {
        self.stdout.lock().take()
    }

    /// Request termination. Returns immediately; does not wait for exit.
    pub fn kill(&self) {
        if self.kill_switch.is_cancelled() {
            return;
        }
        tracing::debug!(tool = %self.tool, pid = ?self.pid, "kill requested");
        self.kill_switch.cancel();

        // With no wait in progress, signal right away instead of on the next wait.
        if let Ok(mut child) = self.child.try_lock() {
            if let Err(e) = child.start_kill() {
                tracing::debug!(tool = %self.tool, "kill skipped: {e}");
            }
        }
    }

    /// Whether [`kill`](Self::kill) has been requested.
    pub fn is_killed(&self) -> bool {
        self.kill_switch.is_cancelled()
    }

    /// Block until the process exits.
    ///
    /// Calling this again after exit returns the same outcome.
    ///
    /// # Errors
    ///
    /// Returns [`mf_core::Error::Process`] if the process exited unsuccessfully
    /// (including when it was killed).
    pub async fn wait(&self) -> mf_core::Result<()> {
        let status = self.wait_status().await?;
        if status.success() {
            Ok(())
        } else {
            Err(mf_core::Error::process(&self.tool, status))
        }
    }

    async fn wait_status(&self) -> mf_core::Result<ExitStatus> {
        let mut child = self.child.lock().await;

        let exited = tokio::select! {
            status = child.wait() => Some(status),
            _ = self.kill_switch.cancelled() => None,
        };

        let status = match exited {
            Some(status) => status?,
            None => {
                if let Err(e) = child.start_kill() {
                    // Already exited; the wait below just collects the status.
                    tracing::debug!(tool = %self.tool, "kill skipped: {e}");
                }
                child.wait().await?
            }
        };

        tracing::debug!(tool = %self.tool, pid = ?self.pid, %status, "process exited");
        Ok(status)
    }
}
