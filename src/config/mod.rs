//! Run configuration and workspace layout.
//!
//! The configuration is loaded once per process and handed to every component
//! by reference; nothing in the pipeline mutates it.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Current schema version for the configuration file.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "asvtools.json";

mod load;
mod paths;

pub use load::{default_config, load_config, write_config};
pub use paths::WorkspacePaths;

/// Norm used to measure perturbation size.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NormVariant {
    Energy,
    Kinetic,
    Euclidean,
}

impl NormVariant {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            NormVariant::Energy => "energy",
            NormVariant::Kinetic => "kinetic",
            NormVariant::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for NormVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware the generator and forecast model run on.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessUnit {
    Cpu,
    Gpu,
}

impl ProcessUnit {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessUnit::Cpu => "cpu",
            ProcessUnit::Gpu => "gpu",
        }
    }
}

impl fmt::Display for ProcessUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External command lines for the collaborators the pipeline drives.
///
/// Each value is split with shell-word rules; the pipeline appends its own
/// positional arguments.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ToolsConfig {
    /// Downloader, called as `<downloader> <download_mode> <input_dir>`.
    pub downloader: String,
    /// Source tag passed to the downloader.
    pub download_mode: String,
    /// State converter, called as `<reference> <source> <dest> <role>`.
    pub reference: String,
    /// Singular-vector generator, called as `<generator> --amplitude <a> --params <json>`.
    pub generator: String,
    /// Forecast model driver, called as `<forecaster> --request <json>`.
    pub forecaster: String,
}

/// Configuration file contents.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AsvConfig {
    pub schema_version: u32,
    /// Optimization region, e.g. `nh` or `global`.
    pub area: String,
    /// Arnoldi block size.
    pub block_size: u32,
    /// Number of Arnoldi loops.
    pub loops: u32,
    /// Optimization time in hours.
    pub t_opt: u32,
    pub sv_vars: Vec<String>,
    pub norm_variant: NormVariant,
    pub model: String,
    pub process_unit: ProcessUnit,
    /// Candidate member indices for the forecast stage.
    pub sv_nrs: Vec<u32>,
    /// Exclusive upper bound on forecast member indices.
    pub sv_cutoff: u32,
    /// Member file prefix; files are `<sv_pert_filename><index>.npy`.
    pub sv_pert_filename: String,
    pub input_dir: PathBuf,
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
    pub tools: ToolsConfig,
}

impl AsvConfig {
    /// Number of singular vectors the generator produces.
    pub fn generated_members(&self) -> u32 {
        self.block_size.saturating_mul(self.loops)
    }
}
