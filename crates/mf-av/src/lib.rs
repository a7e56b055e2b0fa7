//! # mf-av
//!
//! External tool management and the operation lifecycle for mixforge.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffmpeg, ffprobe, ffplay,
//!   mpv and youtube-dl.
//! - **Process launching** ([`ToolCommand`], [`ProcessHandle`]) -- start a
//!   tool with stderr forwarded to ours and get a killable handle back.
//! - **Operations** ([`OperationRegistry`], [`CancellableWaiter`]) -- group
//!   processes under one id, wait on them, and terminate them on
//!   cancellation, resolving each operation exactly once.
//! - **Pipelines** ([`PipedPipeline`]) -- a producer streaming into a consumer
//!   as one operation.
//! - **Filter graphs** ([`FilterGraph`]) -- compile a [`mf_core::MixSpec`]
//!   into a `-filter_complex` expression.
//! - **Probing** ([`probe_format`], [`probe_duration`]) -- typed container
//!   metadata from ffprobe.
//! - **Destinations** ([`Destination`], [`copy_file`]) -- output file
//!   preparation, extension substitution, and the no-engine copy path.
//! - **Actions** ([`actions`]) -- transcode, cut, mix, preview, and playback.

pub mod actions;
pub mod command;
pub mod destination;
pub mod filter_graph;
pub mod operations;
pub mod pipeline;
pub mod probe;
pub mod tools;
pub mod waiter;

// ---- Re-exports for convenience ----

pub use command::{ProcessHandle, ToolCommand};
pub use destination::{copy_file, Destination};
pub use filter_graph::FilterGraph;
pub use operations::{Operation, OperationRegistry, OperationState, Resolution};
pub use pipeline::PipedPipeline;
pub use probe::{parse_format_json, probe_duration, probe_format, FormatInfo};
pub use tools::{ToolInfo, ToolRegistry, KNOWN_TOOLS};
pub use waiter::CancellableWaiter;

pub use actions::ActionContext;
