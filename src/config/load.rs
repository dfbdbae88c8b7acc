//! Configuration helpers.
//!
//! This module loads, validates and writes the run configuration so every
//! pipeline stage sees the same checked values.
use super::paths::check_disjoint_dirs;
use super::{AsvConfig, NormVariant, ProcessUnit, ToolsConfig, CONFIG_SCHEMA_VERSION};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Build the default configuration written by `asvtools init`.
pub fn default_config() -> AsvConfig {
    AsvConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        area: "nh".to_string(),
        block_size: 2,
        loops: 3,
        t_opt: 48,
        sv_vars: ["u", "v", "temp"].map(str::to_string).to_vec(),
        norm_variant: NormVariant::Energy,
        model: "icon".to_string(),
        process_unit: ProcessUnit::Gpu,
        sv_nrs: (0..6).collect(),
        sv_cutoff: 6,
        sv_pert_filename: "sv_pert_".to_string(),
        input_dir: PathBuf::from("iodir/input"),
        work_dir: PathBuf::from("iodir/work"),
        output_dir: PathBuf::from("iodir/output"),
        tools: ToolsConfig {
            downloader: "bash get_icon_opendata.sh".to_string(),
            download_mode: "opendata".to_string(),
            reference: "asv-prepare-ref".to_string(),
            generator: "asv-arnoldi".to_string(),
            forecaster: "asv-forecast".to_string(),
        },
    }
}

/// Load and validate a configuration file.
pub fn load_config(path: &Path) -> Result<AsvConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: AsvConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config).with_context(|| format!("validate config {}", path.display()))?;
    Ok(config)
}

/// Persist a configuration in a stable JSON format.
pub fn write_config(path: &Path, config: &AsvConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema version and value constraints.
pub fn validate_config(config: &AsvConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {} (expected {CONFIG_SCHEMA_VERSION})",
            config.schema_version
        ));
    }
    if config.block_size == 0 {
        return Err(anyhow!("block_size must be at least 1"));
    }
    if config.loops == 0 {
        return Err(anyhow!("loops must be at least 1"));
    }
    if config.sv_vars.iter().all(|var| var.trim().is_empty()) {
        return Err(anyhow!("sv_vars must name at least one variable"));
    }
    let template = config.sv_pert_filename.as_str();
    if template.trim().is_empty() {
        return Err(anyhow!("sv_pert_filename must be non-empty"));
    }
    if template.contains(['/', '\\']) {
        return Err(anyhow!(
            "sv_pert_filename must be a file name prefix without separators (got {template:?})"
        ));
    }
    validate_distinct_dirs(config)?;
    validate_tool("downloader", &config.tools.downloader)?;
    validate_tool("reference", &config.tools.reference)?;
    validate_tool("generator", &config.tools.generator)?;
    validate_tool("forecaster", &config.tools.forecaster)?;
    if config.tools.download_mode.trim().is_empty() {
        return Err(anyhow!("tools.download_mode must be non-empty"));
    }
    Ok(())
}

/// Compares the configured paths as written; relative and absolute spellings
/// of one directory are caught once they are anchored, in
/// `WorkspacePaths::check_layout`.
fn validate_distinct_dirs(config: &AsvConfig) -> Result<()> {
    check_disjoint_dirs([
        ("input_dir", config.input_dir.as_path()),
        ("work_dir", config.work_dir.as_path()),
        ("output_dir", config.output_dir.as_path()),
    ])
}

fn validate_tool(label: &str, command: &str) -> Result<()> {
    let words = shell_words::split(command)
        .with_context(|| format!("tools.{label} is not a valid command line"))?;
    if words.is_empty() {
        return Err(anyhow!("tools.{label} must name a program"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
