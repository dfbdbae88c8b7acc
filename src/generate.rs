//! Bridge to the external singular-vector generator.
use crate::config::{AsvConfig, NormVariant, ProcessUnit, WorkspacePaths};
use crate::external::ExternalCommand;
use crate::reference::BEGIN_ROLE;
use crate::util::path_to_string;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Current schema version for the generator parameter file.
pub const GENERATOR_PARAMS_SCHEMA_VERSION: u32 = 1;

/// Produces the perturbation set for one amplitude.
pub trait Generator {
    fn generate(&self, amplitude: f64, config: &AsvConfig) -> Result<()>;
}

/// Everything the generator needs, written next to the reference state.
#[derive(Debug, Serialize)]
pub struct GeneratorParams<'a> {
    pub schema_version: u32,
    pub amplitude: f64,
    pub area: &'a str,
    pub block_size: u32,
    pub loops: u32,
    pub t_opt: u32,
    pub sv_vars: &'a [String],
    pub norm_variant: NormVariant,
    pub model: &'a str,
    pub process_unit: ProcessUnit,
    pub sv_pert_filename: &'a str,
    pub reference: PathBuf,
    pub intermediate_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl<'a> GeneratorParams<'a> {
    pub fn new(amplitude: f64, config: &'a AsvConfig, paths: &WorkspacePaths) -> Self {
        Self {
            schema_version: GENERATOR_PARAMS_SCHEMA_VERSION,
            amplitude,
            area: &config.area,
            block_size: config.block_size,
            loops: config.loops,
            t_opt: config.t_opt,
            sv_vars: &config.sv_vars,
            norm_variant: config.norm_variant,
            model: &config.model,
            process_unit: config.process_unit,
            sv_pert_filename: &config.sv_pert_filename,
            reference: paths.reference_path(BEGIN_ROLE),
            intermediate_dir: paths.intermediate_dir(),
            output_dir: paths.output_dir().to_path_buf(),
        }
    }
}

/// Generation through the configured generator command.
///
/// Invoked as `<command...> --amplitude <a> --params <generator_params.json>`.
pub struct CommandGenerator {
    command: ExternalCommand,
    paths: WorkspacePaths,
}

impl CommandGenerator {
    pub fn new(command: ExternalCommand, paths: WorkspacePaths) -> Self {
        Self { command, paths }
    }
}

impl Generator for CommandGenerator {
    fn generate(&self, amplitude: f64, config: &AsvConfig) -> Result<()> {
        let params = GeneratorParams::new(amplitude, config, &self.paths);
        let params_path = self.paths.generator_params_path();
        let text = serde_json::to_string_pretty(&params).context("serialize generator params")?;
        fs::write(&params_path, text.as_bytes())
            .with_context(|| format!("write {}", params_path.display()))?;

        let params_arg = path_to_string(&params_path, "generator params")?;
        self.command
            .run([
                "--amplitude".to_string(),
                amplitude.to_string(),
                "--params".to_string(),
                params_arg,
            ])
            .context("generate singular vector perturbations")?;
        Ok(())
    }
}
