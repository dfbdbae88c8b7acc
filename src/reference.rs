//! Reference analysis state selection and conversion.
//!
//! The reference is always the first state of the sorted input listing. This
//! is a positional choice, not a content-based one.
use crate::config::WorkspacePaths;
use crate::errors::PipelineError;
use crate::external::ExternalCommand;
use crate::util::path_to_string;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Role tag of the reference the generator starts from.
pub const BEGIN_ROLE: &str = "begin";

/// A converted reference state ready for the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceState {
    pub source: PathBuf,
    pub path: PathBuf,
}

/// Converts a model-native analysis state into the generator's array form.
pub trait ReferenceConverter {
    fn convert(&self, source: &Path, destination: &Path, role: &str) -> Result<()>;
}

/// Conversion through the configured converter command.
///
/// Invoked as `<command...> <source> <destination> <role>`.
pub struct CommandConverter {
    command: ExternalCommand,
}

impl CommandConverter {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

impl ReferenceConverter for CommandConverter {
    fn convert(&self, source: &Path, destination: &Path, role: &str) -> Result<()> {
        let source = path_to_string(source, "reference source")?;
        let destination = path_to_string(destination, "reference destination")?;
        self.command
            .run([source, destination, role.to_string()])
            .context("convert reference state")?;
        Ok(())
    }
}

/// List candidate analysis states in the input directory.
///
/// Hidden entries and directories are skipped; the result is sorted by file
/// name so the first element is stable across platforms.
pub fn list_input_states(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut states = Vec::new();
    if !input_dir.exists() {
        return Ok(states);
    }
    for entry in fs::read_dir(input_dir).with_context(|| format!("read {}", input_dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && path.is_file() {
            states.push(path);
        }
    }
    states.sort();
    Ok(states)
}

/// Select the first input state and convert it into the reference for `role`.
pub fn prepare_reference(
    converter: &dyn ReferenceConverter,
    paths: &WorkspacePaths,
    input_states: &[PathBuf],
    role: &str,
) -> Result<ReferenceState> {
    let source = input_states.first().ok_or_else(|| PipelineError::MissingInput {
        path: paths.input_dir().to_path_buf(),
    })?;
    if input_states.len() > 1 {
        tracing::warn!(
            count = input_states.len(),
            selected = %source.display(),
            "several input states present; using the first"
        );
    }
    convert_state(converter, paths, source, role)
}

/// Convert an explicitly chosen analysis state into the reference for `role`.
pub fn prepare_reference_from(
    converter: &dyn ReferenceConverter,
    paths: &WorkspacePaths,
    source: &Path,
    role: &str,
) -> Result<ReferenceState> {
    if !source.is_file() {
        return Err(PipelineError::MissingInput {
            path: source.to_path_buf(),
        }
        .into());
    }
    convert_state(converter, paths, source, role)
}

fn convert_state(
    converter: &dyn ReferenceConverter,
    paths: &WorkspacePaths,
    source: &Path,
    role: &str,
) -> Result<ReferenceState> {
    let destination = paths.reference_path(role);
    tracing::info!(
        role,
        source = %source.display(),
        destination = %destination.display(),
        "preparing reference state"
    );
    converter.convert(source, &destination, role)?;
    Ok(ReferenceState {
        source: source.to_path_buf(),
        path: destination,
    })
}
