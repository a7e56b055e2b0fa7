//! Unified error type for mixforge.
//!
//! Every failure surfaced by the operation core and the actions built on top of
//! it is an [`Error`]. The variants follow the failure classes callers care
//! about: the engine binary could not be started, an operation id is no longer
//! registered, a spawned process exited unsuccessfully, the operation was
//! cancelled, or a destination file could not be prepared.

use std::fmt;
use std::path::{Path, PathBuf};

/// Unified error type covering all failure modes in mixforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool was not found during discovery.
    #[error("tool not found: {tool}; is it installed and in PATH?")]
    ToolNotFound {
        /// Name of the missing tool.
        tool: String,
    },

    /// An external tool could not be executed.
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        /// Name of the tool that failed to start.
        tool: String,
        /// The underlying OS error (missing file, permissions, ...).
        source: std::io::Error,
    },

    /// The requested entity is not registered (never created or already removed).
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "operation").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A spawned process exited with a failure status.
    #[error("{tool} failed: {status}")]
    Process {
        /// Name of the tool whose process failed.
        tool: String,
        /// Exit status as reported by the OS.
        status: String,
    },

    /// Work was stopped because its cancellation signal fired.
    ///
    /// `detail` carries the status the killed process reported, if any. A
    /// killed process and a crashed one look the same from the outside, so the
    /// detail is informational only.
    #[error("{target} cancelled{}", .detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    Cancelled {
        /// What was stopped, e.g. `operation 7` or `copy to /out/mix.wav`.
        target: String,
        /// First per-process failure observed while reaping, if any.
        detail: Option<String>,
    },

    /// Removing, renaming or copying a source/destination file failed.
    #[error("file error at {}: {source}", .path.display())]
    File {
        /// Path that could not be handled.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Media probing failed.
    #[error("Probe error: {0}")]
    Probe(String),

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// Convenience constructor for [`Error::ToolNotFound`].
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Error::ToolNotFound { tool: tool.into() }
    }

    /// Convenience constructor for [`Error::Spawn`].
    pub fn spawn(tool: impl Into<String>, source: std::io::Error) -> Self {
        Error::Spawn {
            tool: tool.into(),
            source,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Process`].
    pub fn process(tool: impl Into<String>, status: impl fmt::Display) -> Self {
        Error::Process {
            tool: tool.into(),
            status: status.to_string(),
        }
    }

    /// [`Error::Cancelled`] for a terminated operation.
    pub fn cancelled(id: impl fmt::Display, detail: Option<String>) -> Self {
        Error::Cancelled {
            target: format!("operation {id}"),
            detail,
        }
    }

    /// [`Error::Cancelled`] for an interrupted file copy.
    pub fn copy_cancelled(dst: &Path) -> Self {
        Error::Cancelled {
            target: format!("copy to {}", dst.display()),
            detail: None,
        }
    }

    /// Convenience constructor for [`Error::File`].
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }

    /// Whether this is a [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Whether this is a [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
