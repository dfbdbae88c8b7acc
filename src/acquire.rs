//! Acquisition of analysis states into the input directory.
use crate::external::ExternalCommand;
use crate::util::path_to_string;
use anyhow::{Context, Result};
use std::path::Path;

/// Populates a destination directory with analysis states.
pub trait Acquisition {
    /// Download states for `mode` into `destination`; all-or-nothing.
    fn download(&self, mode: &str, destination: &Path) -> Result<()>;
}

/// Acquisition through the configured downloader script.
///
/// Invoked as `<command...> <mode> <destination>`.
pub struct ScriptDownloader {
    command: ExternalCommand,
}

impl ScriptDownloader {
    pub fn new(command: ExternalCommand) -> Self {
        Self { command }
    }
}

impl Acquisition for ScriptDownloader {
    fn download(&self, mode: &str, destination: &Path) -> Result<()> {
        let destination = path_to_string(destination, "download destination")?;
        tracing::info!(mode, destination = %destination, "downloading analysis states");
        self.command
            .run([mode.to_string(), destination])
            .with_context(|| format!("download analysis states ({mode})"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{classify, PipelineError};

    #[test]
    fn passes_mode_and_destination_positionally() {
        if which::which("sh").is_err() {
            return;
        }
        let dir = tempfile::tempdir().expect("create temp dir");
        let dest = dir.path().join("input");
        std::fs::create_dir_all(&dest).expect("create dest");
        let command = ExternalCommand::parse(
            "downloader",
            "sh -c 'echo \"$0\" > \"$1/mode.txt\"'",
            dir.path(),
        )
        .expect("parse");
        ScriptDownloader::new(command)
            .download("opendata", &dest)
            .expect("download");
        let mode = std::fs::read_to_string(dest.join("mode.txt")).expect("read mode");
        assert_eq!(mode.trim(), "opendata");
    }

    #[test]
    fn failing_script_aborts() {
        if which::which("sh").is_err() {
            return;
        }
        let dir = tempfile::tempdir().expect("create temp dir");
        let command = ExternalCommand::parse("downloader", "sh -c 'exit 1'", dir.path())
            .expect("parse");
        let err = ScriptDownloader::new(command)
            .download("opendata", dir.path())
            .expect_err("fails");
        assert!(matches!(
            classify(&err),
            Some(PipelineError::ExternalProcessFailure { .. })
        ));
    }
}
