//! Forecast member selection and chaining into the forecast model.
use crate::config::WorkspacePaths;
use crate::cycle::AnalysisCycle;
use crate::external::ExternalCommand;
use crate::util::path_to_string;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One batch of perturbed states to forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub amplitude: f64,
    /// Forecast horizon in hours.
    pub leadtime: u32,
    pub cycle: AnalysisCycle,
    pub states: Vec<PathBuf>,
}

/// Runs the forecast model over a batch of states.
pub trait Forecaster {
    fn forecast(&self, request: &ForecastRequest) -> Result<()>;
}

/// Member selection inputs taken from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct SelectionBounds {
    pub cutoff: u32,
    pub block_size: u32,
    pub loops: u32,
}

impl SelectionBounds {
    /// Exclusive upper bound: `min(cutoff, block_size * loops)`.
    pub fn limit(&self) -> u32 {
        self.cutoff
            .min(self.block_size.saturating_mul(self.loops))
    }
}

/// Keep candidate indices below the selection limit, in candidate order.
pub fn select_members(candidates: &[u32], bounds: SelectionBounds) -> Vec<u32> {
    let limit = bounds.limit();
    candidates
        .iter()
        .copied()
        .filter(|&index| index < limit)
        .collect()
}

/// Chains selected members into the forecaster.
pub struct ForecastChain<'a> {
    pub forecaster: &'a dyn Forecaster,
    pub paths: &'a WorkspacePaths,
    /// Member file prefix (`sv_pert_filename`).
    pub template: &'a str,
}

impl ForecastChain<'_> {
    /// Select generated members and hand them to the forecaster in one batch.
    ///
    /// Returns the selected member indices. An empty selection skips the
    /// forecaster.
    pub fn select_and_forecast(
        &self,
        amplitude: f64,
        leadtime: u32,
        cycle: &AnalysisCycle,
        candidates: &[u32],
        bounds: SelectionBounds,
    ) -> Result<Vec<u32>> {
        let selected = select_members(candidates, bounds);
        if selected.is_empty() {
            tracing::warn!(
                limit = bounds.limit(),
                candidates = ?candidates,
                "no perturbation member qualifies for forecasting"
            );
            return Ok(selected);
        }

        let states: Vec<PathBuf> = selected
            .iter()
            .map(|&index| self.paths.member_path(self.template, index))
            .collect();
        for state in states.iter().filter(|state| !state.is_file()) {
            tracing::warn!(state = %state.display(), "selected member file is missing");
        }

        let request = ForecastRequest {
            amplitude,
            leadtime,
            cycle: cycle.clone(),
            states,
        };
        tracing::info!(
            members = ?selected,
            leadtime,
            cycle = %cycle,
            "forecasting perturbation members"
        );
        self.forecaster.forecast(&request)?;
        Ok(selected)
    }
}

/// Forecasting through the configured forecaster command.
///
/// Invoked as `<command...> --request <forecast_request.json>`.
pub struct CommandForecaster {
    command: ExternalCommand,
    paths: WorkspacePaths,
}

impl CommandForecaster {
    pub fn new(command: ExternalCommand, paths: WorkspacePaths) -> Self {
        Self { command, paths }
    }
}

impl Forecaster for CommandForecaster {
    fn forecast(&self, request: &ForecastRequest) -> Result<()> {
        let request_path = self.paths.forecast_request_path();
        let text = serde_json::to_string_pretty(request).context("serialize forecast request")?;
        fs::write(&request_path, text.as_bytes())
            .with_context(|| format!("write {}", request_path.display()))?;
        let request_arg = path_to_string(&request_path, "forecast request")?;
        self.command
            .run(["--request".to_string(), request_arg])
            .with_context(|| format!("forecast {} members", request.states.len()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "forecast_tests.rs"]
mod tests;
