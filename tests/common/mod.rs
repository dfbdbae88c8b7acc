//! Shared test infrastructure for integration tests.
//!
//! Each test gets its own workspace with a fresh configuration and `sh`
//! scripts standing in for the downloader, converter, generator and
//! forecaster.

use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_DOWNLOADER: &str = r#"# <mode> <destination>
echo "$1" > download.log
printf 'analysis' > "$2/icon_ana_state.grib2"
"#;

const FAKE_CONVERTER: &str = r#"# <source> <destination> <role>
cp "$1" "$2"
echo "$3" > reference.log
"#;

const FAKE_GENERATOR: &str = r#"# --amplitude <a> --params <json>
echo "$2" > generator.log
i=0
while [ "$i" -lt 6 ]; do
  printf 'sv' > "iodir/output/sv_pert_$i.npy"
  i=$((i + 1))
done
"#;

const FAKE_FORECASTER: &str = r#"# --request <json>
cp "$2" forecast_request_seen.json
"#;

/// A temporary directory holding `asvtools.json` and its workspace.
pub struct AsvWorkspace {
    dir: TempDir,
}

impl AsvWorkspace {
    /// Create a workspace and write the default configuration with `init`.
    pub fn init() -> Result<Self> {
        let workspace = Self {
            dir: TempDir::new()?,
        };
        let output = workspace.asvtools(&["init"])?;
        if !output.status.success() {
            return Err(anyhow!(
                "asvtools init failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("asvtools.json")
    }

    /// Run a subcommand against this workspace's configuration.
    pub fn asvtools(&self, args: &[&str]) -> Result<Output> {
        let (command, rest) = args
            .split_first()
            .ok_or_else(|| anyhow!("missing subcommand"))?;
        let output = Command::new(env!("CARGO_BIN_EXE_asvtools"))
            .arg(command)
            .arg("--config")
            .arg(self.config_path())
            .args(rest)
            .current_dir(self.root())
            .env_remove("RUST_LOG")
            .output()
            .context("spawn asvtools")?;
        Ok(output)
    }

    /// Write the fake tool scripts and point the configuration at them.
    pub fn install_fake_tools(&self) -> Result<()> {
        let scripts = [
            ("downloader", "fake_download.sh", FAKE_DOWNLOADER),
            ("reference", "fake_reference.sh", FAKE_CONVERTER),
            ("generator", "fake_generator.sh", FAKE_GENERATOR),
            ("forecaster", "fake_forecast.sh", FAKE_FORECASTER),
        ];
        for (tool, file, body) in scripts {
            fs::write(self.root().join(file), body)?;
            self.set_tool(tool, &format!("sh {file}"))?;
        }
        Ok(())
    }

    /// Replace one configured tool command line.
    pub fn set_tool(&self, tool: &str, command_line: &str) -> Result<()> {
        let mut config = self.read_json("asvtools.json")?;
        config["tools"][tool] = Value::String(command_line.to_string());
        fs::write(self.config_path(), serde_json::to_string_pretty(&config)?)?;
        Ok(())
    }

    pub fn read_json(&self, rel: &str) -> Result<Value> {
        let path = self.root().join(rel);
        let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn read_text(&self, rel: &str) -> Result<String> {
        let path = self.root().join(rel);
        let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        Ok(text.trim().to_string())
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }
}

/// Skip tests that need a POSIX shell for the fake tools.
pub fn skip_if_sh_missing() -> bool {
    let missing = which::which("sh").is_err();
    if missing {
        eprintln!("Skipping: sh not available");
    }
    missing
}

/// Outcome recorded for `stage` in a report's stage list.
pub fn stage_outcome(report: &Value, stage: &str) -> Option<String> {
    report["stages"]
        .as_array()?
        .iter()
        .find(|record| record["stage"] == stage)
        .and_then(|record| record["outcome"].as_str())
        .map(str::to_string)
}
