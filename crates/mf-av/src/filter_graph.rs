//! Compiling mix parameters into an ffmpeg `-filter_complex` graph.
//!
//! The graph is a linear chain. Stages are emitted in a fixed order:
//!
//! 1. one `adelay` per vice file, then a single `amix` of the main source with
//!    every delayed stream (`duration=first`, so the main track sets the length)
//! 2. `afade=t=in`
//! 3. `afade=t=out`
//! 4. `volume`
//!
//! Absent stages are skipped. The first emitted stage after the mix reads the
//! raw main source (`[0]`) when there is no mix. Every stage writes a unique
//! label which only the next stage reads; the last stage's label is dropped
//! because its stream is the graph output.

use std::path::PathBuf;

use mf_core::config::OutputConfig;
use mf_core::{Error, FadeSpec, MixSpec, Result};

/// A compiled filter graph plus the inputs it references.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    inputs: Vec<PathBuf>,
    expression: String,
}

impl FilterGraph {
    /// Compile `spec`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] if the spec is invalid or is a passthrough (no
    /// stage to emit). Passthrough requests are served without the engine.
    pub fn build(spec: &MixSpec) -> Result<Self> {
        spec.validate()?;
        if spec.is_passthrough() {
            return Err(Error::Validation(
                "mix has no stages; copy the main source instead".into(),
            ));
        }

        let mut inputs = Vec::with_capacity(spec.vice_files.len() + 1);
        inputs.push(spec.main.clone());
        inputs.extend(spec.vice_files.iter().map(|v| v.path.clone()));

        let mut chain = Chain::default();

        if !spec.vice_files.is_empty() {
            let mut mix_inputs = vec![source(0)];
            for (i, vice) in spec.vice_files.iter().enumerate() {
                let index = i + 1;
                let label = format!("del{index}");
                chain.stages.push(FilterStage {
                    inputs: vec![source(index)],
                    filter: format!("adelay=delays={}:all=1", vice.start_local_ms),
                    output: label.clone(),
                });
                mix_inputs.push(label);
            }
            let count = mix_inputs.len();
            chain.push_with_inputs(
                mix_inputs,
                format!("amix=inputs={count}:duration=first"),
                "mixed",
            );
        }

        if let Some(fade) = spec.fade_in {
            chain.push(fade_filter("in", fade), "faded_in");
        }
        if let Some(fade) = spec.fade_out {
            chain.push(fade_filter("out", fade), "faded_out");
        }
        if spec.changes_volume() {
            chain.push(format!("volume={}", spec.volume), "scaled");
        }

        Ok(Self {
            inputs,
            expression: chain.render(),
        })
    }

    /// Main source first, then vice files in the order supplied.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// The `-filter_complex` expression.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Engine arguments up to (not including) the output target: inputs, the
    /// filter graph, and the forced channel count and sample rate.
    pub fn to_args(&self, output: &OutputConfig) -> Vec<String> {
        let mut args = Vec::with_capacity(self.inputs.len() * 2 + 8);
        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }
        args.push("-filter_complex".to_string());
        args.push(self.expression.clone());
        args.extend([
            "-ac".to_string(),
            output.channels.to_string(),
            "-ar".to_string(),
            output.sample_rate.to_string(),
        ]);
        args
    }
}

/// One filter invocation in the chain.
#[derive(Debug, Clone)]
struct FilterStage {
    inputs: Vec<String>,
    filter: String,
    output: String,
}

#[derive(Debug, Default)]
struct Chain {
    stages: Vec<FilterStage>,
}

impl Chain {
    /// Append a single-input stage reading the current head of the chain.
    fn push(&mut self, filter: String, output: &str) {
        let input = self
            .stages
            .last()
            .map(|s| s.output.clone())
            .unwrap_or_else(|| source(0));
        self.push_with_inputs(vec![input], filter, output);
    }

    fn push_with_inputs(&mut self, inputs: Vec<String>, filter: String, output: &str) {
        self.stages.push(FilterStage {
            inputs,
            filter,
            output: output.to_string(),
        });
    }

    fn render(&self) -> String {
        let last = self.stages.len().saturating_sub(1);
        self.stages
            .iter()
            .enumerate()
            .map(|(i, stage)| {
                let mut out = String::new();
                for input in &stage.inputs {
                    out.push_str(&format!("[{input}]"));
                }
                out.push_str(&stage.filter);
                if i != last {
                    out.push_str(&format!("[{}]", stage.output));
                }
                out
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn source(index: usize) -> String {
    index.to_string()
}

fn fade_filter(direction: &str, fade: FadeSpec) -> String {
    format!(
        "afade=t={direction}:st={}:d={}",
        format_seconds(fade.start_local_ms),
        format_seconds(fade.duration_ms)
    )
}

/// Milliseconds as a decimal seconds string without trailing zeros
/// (`1500` -> `"1.5"`, `2000` -> `"2"`).
pub(crate) fn format_seconds(ms: u64) -> String {
    let (secs, frac) = (ms / 1000, ms % 1000);
    if frac == 0 {
        return secs.to_string();
    }
    let frac = format!("{frac:03}");
    format!("{secs}.{}", frac.trim_end_matches('0'))
}
