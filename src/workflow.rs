//! Command implementations behind the CLI.
use crate::acquire::ScriptDownloader;
use crate::cli::{HistoryArgs, InitArgs, RunArgs, ShowConfigArgs};
use crate::config::{self, AsvConfig, WorkspacePaths};
use crate::external::ExternalCommand;
use crate::forecast::CommandForecaster;
use crate::generate::CommandGenerator;
use crate::pipeline::{load_history, Collaborators, Pipeline, RunRequest, Stage, StageOutcome};
use crate::reference::CommandConverter;
use crate::util::display_path;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

const BANNER: &str = "This is the asvtools package. (c) 2025 Deutscher Wetterdienst (DWD)\n\
A tiny package to compute 'Arnoldi Singular Vector' (ASV) perturbations.\n\
The software is provided without any warranty at all.\n\
See more information in the provided README and LICENCE files.\n";

pub fn run_init(args: &InitArgs) -> Result<()> {
    if args.config.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            args.config.display()
        ));
    }
    config::write_config(&args.config, &config::default_config())?;
    println!("wrote {}", args.config.display());
    Ok(())
}

pub fn run_run(args: &RunArgs) -> Result<()> {
    let (config, paths) = load_workspace(&args.config)?;
    println!("{BANNER}");

    let tools = CommandTools::from_config(&config, &paths)?;
    let request = RunRequest {
        amplitude: args.amplitude,
        an_date: args.an_date.clone(),
        flags: crate::validate::RunFlags {
            download: args.download,
            run: args.run,
            forecast_leadtime: args.fc_leadtime,
        },
        reference: args
            .reference
            .as_deref()
            .map(absolute_path)
            .transpose()?,
    };
    let report = Pipeline::new(&config, &paths, tools.collaborators()).run(&request)?;

    println!("analysis cycle: {}", report.cycle);
    for record in &report.stages {
        println!(
            "  {:<9} {}",
            record.stage.as_str(),
            outcome_label(record.outcome)
        );
    }
    if let Some(source) = &report.reference_source {
        println!("reference: {}", source.display());
    }
    if report.outcome(Stage::Forecast) == Some(StageOutcome::Completed) {
        println!("forecast members: {:?}", report.selected_members);
        println!("output: {}", paths.output_dir().display());
    }
    Ok(())
}

pub fn run_history(args: &HistoryArgs) -> Result<()> {
    let (_, paths) = load_workspace(&args.config)?;
    let mut entries = load_history(&paths)?;
    if let Some(limit) = args.limit {
        let skip = entries.len().saturating_sub(limit);
        entries = entries.split_off(skip);
    }
    if args.json {
        let text = serde_json::to_string_pretty(&entries).context("serialize history")?;
        println!("{text}");
        return Ok(());
    }
    if entries.is_empty() {
        println!("no runs recorded");
        return Ok(());
    }
    for entry in &entries {
        let status = match (entry.success, entry.failed_stage) {
            (true, _) => "ok".to_string(),
            (false, Some(stage)) => format!("failed at {stage}"),
            (false, None) => "failed".to_string(),
        };
        println!(
            "{} cycle={} amplitude={} {status}",
            entry.started_at_epoch_ms, entry.cycle, entry.amplitude
        );
    }
    Ok(())
}

fn outcome_label(outcome: StageOutcome) -> &'static str {
    match outcome {
        StageOutcome::Completed => "done",
        StageOutcome::Skipped => "skipped",
        StageOutcome::Failed => "failed",
    }
}

pub fn run_show_config(args: &ShowConfigArgs) -> Result<()> {
    let (config, paths) = load_workspace(&args.config)?;
    if args.json {
        let text = serde_json::to_string_pretty(&config).context("serialize config")?;
        println!("{text}");
        return Ok(());
    }
    let root = Some(paths.root());
    println!("AREA           = {}", config.area);
    println!("BLOCK_SIZE     = {}", config.block_size);
    println!("LOOPS          = {}", config.loops);
    println!("T_OPT          = {}", config.t_opt);
    println!("SV_VARS        = {}", config.sv_vars.join(","));
    println!("NORM_VARIANT   = {}", config.norm_variant);
    println!("MODEL          = {}", config.model);
    println!("PROCESSUNIT    = {}", config.process_unit);
    println!("SV_NRS         = {:?}", config.sv_nrs);
    println!("SV_CUTOFF      = {}", config.sv_cutoff);
    println!("SV_PERT_FILENAME = {}", config.sv_pert_filename);
    println!("input_dir      = {}", display_path(paths.input_dir(), root));
    println!("work_dir       = {}", display_path(paths.work_dir(), root));
    println!("output_dir     = {}", display_path(paths.output_dir(), root));
    Ok(())
}

/// Load the config and anchor its directories at the config file's location.
fn load_workspace(config_path: &Path) -> Result<(AsvConfig, WorkspacePaths)> {
    let config = config::load_config(config_path)?;
    let config_path = config_path
        .canonicalize()
        .with_context(|| format!("resolve config path {}", config_path.display()))?;
    let root = config_path
        .parent()
        .ok_or_else(|| anyhow!("config path {} has no parent", config_path.display()))?;
    let paths = WorkspacePaths::from_config(&config, root);
    Ok((config, paths))
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolve current directory")?;
    Ok(cwd.join(path))
}

/// Production collaborators backed by the configured commands.
struct CommandTools {
    downloader: ScriptDownloader,
    converter: CommandConverter,
    generator: CommandGenerator,
    forecaster: CommandForecaster,
}

impl CommandTools {
    fn from_config(config: &AsvConfig, paths: &WorkspacePaths) -> Result<Self> {
        let tools = &config.tools;
        let cwd = paths.root();
        Ok(Self {
            downloader: ScriptDownloader::new(ExternalCommand::parse(
                "downloader",
                &tools.downloader,
                cwd,
            )?),
            converter: CommandConverter::new(ExternalCommand::parse(
                "reference",
                &tools.reference,
                cwd,
            )?),
            generator: CommandGenerator::new(
                ExternalCommand::parse("generator", &tools.generator, cwd)?,
                paths.clone(),
            ),
            forecaster: CommandForecaster::new(
                ExternalCommand::parse("forecaster", &tools.forecaster, cwd)?,
                paths.clone(),
            ),
        })
    }

    fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            acquisition: &self.downloader,
            converter: &self.converter,
            generator: &self.generator,
            forecaster: &self.forecaster,
        }
    }
}
