//! Run report and history persistence.
//!
//! The report is a snapshot of the latest run; history is append-only JSONL
//! so earlier runs stay auditable.
use super::stage::{Stage, StageOutcome};
use crate::config::WorkspacePaths;
use crate::cycle::AnalysisCycle;
use crate::validate::RunFlags;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Current schema version for `report.json`.
pub const REPORT_SCHEMA_VERSION: u32 = 1;
/// Current schema version for `history.jsonl`.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

/// Outcome of one stage within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// Snapshot of a run that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub started_at_epoch_ms: u128,
    pub finished_at_epoch_ms: u128,
    pub cycle: AnalysisCycle,
    pub amplitude: f64,
    pub flags: RunFlags,
    pub stages: Vec<StageRecord>,
    /// Analysis state the reference was converted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_source: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<PathBuf>,
    #[serde(default)]
    pub selected_members: Vec<u32>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn new(
        started_at_epoch_ms: u128,
        cycle: AnalysisCycle,
        amplitude: f64,
        flags: RunFlags,
    ) -> Self {
        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            started_at_epoch_ms,
            finished_at_epoch_ms: started_at_epoch_ms,
            cycle,
            amplitude,
            flags,
            stages: Vec::new(),
            reference_source: None,
            reference: None,
            selected_members: Vec::new(),
            success: false,
            error: None,
        }
    }

    pub fn record(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push(StageRecord { stage, outcome });
    }

    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.stages
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| record.outcome)
    }

    /// Return the stage that aborted the run, if any.
    pub fn failed_stage(&self) -> Option<Stage> {
        self.stages
            .iter()
            .find(|record| record.outcome == StageOutcome::Failed)
            .map(|record| record.stage)
    }
}

/// One line of `history.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub schema_version: u32,
    pub started_at_epoch_ms: u128,
    pub finished_at_epoch_ms: u128,
    pub cycle: AnalysisCycle,
    pub amplitude: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&RunReport> for HistoryEntry {
    fn from(report: &RunReport) -> Self {
        Self {
            schema_version: HISTORY_SCHEMA_VERSION,
            started_at_epoch_ms: report.started_at_epoch_ms,
            finished_at_epoch_ms: report.finished_at_epoch_ms,
            cycle: report.cycle.clone(),
            amplitude: report.amplitude,
            success: report.success,
            failed_stage: report.failed_stage(),
            message: report.error.clone(),
        }
    }
}

/// Write the latest report snapshot.
pub fn write_report(paths: &WorkspacePaths, report: &RunReport) -> Result<()> {
    let path = paths.report_path();
    ensure_parent(&path)?;
    let text = serde_json::to_string_pretty(report).context("serialize run report")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Append a history entry as JSONL.
pub fn append_history(paths: &WorkspacePaths, entry: &HistoryEntry) -> Result<()> {
    let path = paths.history_path();
    ensure_parent(&path)?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    let line = serde_json::to_string(entry).context("serialize history entry")?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Load every history entry, oldest first.
pub fn load_history(paths: &WorkspacePaths) -> Result<Vec<HistoryEntry>> {
    let path = paths.history_path();
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("parse {} line {}", path.display(), idx + 1))
        })
        .collect()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}
