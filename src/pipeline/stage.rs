//! Pipeline stages and their transitions.
use crate::validate::RunFlags;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the linear run pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Prepare,
    Generate,
    Forecast,
}

impl Stage {
    /// Entry stage of every run.
    pub const FIRST: Stage = Stage::Validate;

    /// Return the following stage, or `None` after the last one.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Validate => Some(Stage::Prepare),
            Stage::Prepare => Some(Stage::Generate),
            Stage::Generate => Some(Stage::Forecast),
            Stage::Forecast => None,
        }
    }

    /// Whether the flags ask for this stage to execute.
    pub fn is_enabled(self, flags: &RunFlags) -> bool {
        match self {
            Stage::Validate | Stage::Prepare => true,
            Stage::Generate => flags.run,
            Stage::Forecast => flags.wants_forecast(),
        }
    }

    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Prepare => "prepare",
            Stage::Generate => "generate",
            Stage::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a stage during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Completed,
    Skipped,
    Failed,
}
