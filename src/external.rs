//! Blocking invocation of configured external tools.
//!
//! Collaborators (downloader, converter, generator, forecaster) are plain
//! command lines from the configuration. Each call runs to completion; a
//! non-zero exit becomes [`PipelineError::ExternalProcessFailure`].
use crate::errors::PipelineError;
use crate::util::{tail_string, MAX_STDERR_BYTES};
use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Instant;

/// A configured command line plus the directory it runs in.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    label: String,
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl ExternalCommand {
    /// Split a configured command line with shell-word rules.
    pub fn parse(label: &str, command_line: &str, cwd: &Path) -> Result<Self> {
        let mut words = shell_words::split(command_line)
            .with_context(|| format!("parse {label} command {command_line:?}"))?
            .into_iter();
        let program = words
            .next()
            .ok_or_else(|| anyhow!("{label} command is empty"))?;
        Ok(Self {
            label: label.to_string(),
            program,
            args: words.collect(),
            cwd: cwd.to_path_buf(),
        })
    }

    /// Run with extra trailing arguments and wait for completion.
    pub fn run<I, S>(&self, extra: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let program = self.resolve_program()?;
        let extra: Vec<OsString> = extra.into_iter().map(Into::into).collect();
        tracing::debug!(
            tool = %self.label,
            program = %program.display(),
            args = ?self.args,
            extra = ?extra,
            "running external tool"
        );
        let start = Instant::now();
        let output = Command::new(&program)
            .args(&self.args)
            .args(&extra)
            .current_dir(&self.cwd)
            .output()
            .map_err(|err| PipelineError::ExternalProcessFailure {
                tool: self.label.clone(),
                status: "spawn error".to_string(),
                stderr: err.to_string(),
            })?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            tool = %self.label,
            elapsed_ms,
            stdout_bytes = output.stdout.len(),
            success = output.status.success(),
            "external tool finished"
        );
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!(tool = %self.label, "{line}");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::ExternalProcessFailure {
                tool: self.label.clone(),
                status: output.status.to_string(),
                stderr: tail_string(stderr.trim(), MAX_STDERR_BYTES),
            }
            .into());
        }
        Ok(output)
    }

    /// Resolve bare program names on `PATH`; paths are kept relative to `cwd`.
    fn resolve_program(&self) -> Result<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return Ok(if program.is_absolute() {
                program.to_path_buf()
            } else {
                self.cwd.join(program)
            });
        }
        which::which(&self.program).map_err(|err| {
            PipelineError::ExternalProcessFailure {
                tool: self.label.clone(),
                status: "not found".to_string(),
                stderr: format!("{}: {err}", self.program),
            }
            .into()
        })
    }
}
