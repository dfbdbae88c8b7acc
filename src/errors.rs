//! Error taxonomy for a single pipeline run.
//!
//! Every variant is carried through `anyhow::Result` so call sites can keep
//! attaching context; callers that need to classify a failure downcast to
//! [`PipelineError`].
use std::path::PathBuf;
use thiserror::Error;

/// Smallest accepted perturbation amplitude.
pub const AMPLITUDE_MIN: f64 = 1.0;
/// Largest accepted perturbation amplitude.
pub const AMPLITUDE_MAX: f64 = 50000.0;

/// Failures raised by the run pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(
        "amplitude must be within [1-50000] (got {amplitude}); see the instructions for how \
         to choose an amplitude (e.g. 2000 global, 500 northern hemisphere)"
    )]
    OutOfRange { amplitude: f64 },

    #[error("{reason}\n{remedy}")]
    ConflictingConfig { reason: String, remedy: String },

    #[error("analysis cycle {cycle:?} is malformed: {detail}; expected 'today' or yyyymmddHH (e.g. 2025052600)")]
    MalformedCycle { cycle: String, detail: String },

    #[error(
        "no analysis state found at {}; download one with --download or copy a state into the input directory",
        .path.display()
    )]
    MissingInput { path: PathBuf },

    #[error("{tool} failed with {status}{}", stderr_suffix(.stderr))]
    ExternalProcessFailure {
        tool: String,
        status: String,
        stderr: String,
    },
}

impl PipelineError {
    /// Explicit analysis date combined with a download request.
    pub fn download_with_explicit_cycle(cycle: &str) -> Self {
        PipelineError::ConflictingConfig {
            reason: format!(
                "download was requested together with analysis date {cycle:?}, but \
                 opendata.dwd.de only provides the analysis of the current day"
            ),
            remedy: [
                "Do one of the following:",
                "a) use --an-date today together with --download",
                "b) download analysis states yourself, move one into the input directory and run without --download",
                "c) pass a state from another source with --reference and run without --download",
            ]
            .join("\n"),
        }
    }

    /// Explicit reference state combined with a download request.
    pub fn download_with_reference() -> Self {
        PipelineError::ConflictingConfig {
            reason: "--reference and --download both define the 'begin' reference state"
                .to_string(),
            remedy: "Drop --reference to use the downloaded analysis, or drop --download to \
                     use the given state"
                .to_string(),
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Return the pipeline error behind an `anyhow` chain, if any.
pub fn classify(err: &anyhow::Error) -> Option<&PipelineError> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
}
