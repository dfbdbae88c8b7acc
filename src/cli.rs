//! CLI argument parsing for the ASV run pipeline.
//!
//! The CLI only maps flags onto a run request; every rule lives in the
//! pipeline so it can be exercised without a process boundary.
use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "asvtools",
    version,
    about = "Compute Arnoldi Singular Vector (ASV) perturbations and forecast them",
    after_help = "Examples:\n  asvtools init\n  asvtools run --download\n  asvtools run --download --run --fc-leadtime 24 --amplitude 500\n  asvtools run --an-date 2025052600 --run --reference /data/ana_state.nc\n  asvtools show-config --json\n  asvtools history --limit 5",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Run(RunArgs),
    ShowConfig(ShowConfigArgs),
    History(HistoryArgs),
}

/// Init command inputs for writing a default configuration.
#[derive(Parser, Debug)]
#[command(about = "Write a default configuration file")]
pub struct InitArgs {
    /// Configuration file to create
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

/// Run command inputs for one pipeline invocation.
#[derive(Parser, Debug)]
#[command(about = "Download, generate and forecast ASV perturbations")]
pub struct RunArgs {
    /// Configuration file; relative directories resolve against its location
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Size (norm) of the perturbations, within [1-50000]
    #[arg(long, default_value_t = 500.0)]
    pub amplitude: f64,

    /// Analysis date: 'today' or yyyymmddHH (e.g. 2025052600)
    #[arg(long, value_name = "CYCLE", default_value = "today")]
    pub an_date: String,

    /// Clean the input directory and download the current analysis
    #[arg(long)]
    pub download: bool,

    /// Run the ASV generation itself
    #[arg(long)]
    pub run: bool,

    /// Forecast leadtime in hours for generated perturbations; 0 disables forecasts
    #[arg(long, value_name = "HOURS", default_value_t = 0)]
    pub fc_leadtime: u32,

    /// Analysis state to prepare as 'begin' reference instead of downloading
    #[arg(long, value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Emit debug logging
    #[arg(long)]
    pub verbose: bool,
}

/// Show-config command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the effective configuration")]
pub struct ShowConfigArgs {
    /// Configuration file to read
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// History command inputs.
#[derive(Parser, Debug)]
#[command(about = "List previous runs recorded in the work directory")]
pub struct HistoryArgs {
    /// Configuration file to read
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Show only the most recent N runs
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
