//! Run orchestration.
//!
//! A run walks the fixed stage line `validate -> prepare -> generate ->
//! forecast`. Flags decide which stages execute; the first failure aborts the
//! remaining stages and nothing is retried or rolled back.
use crate::acquire::Acquisition;
use crate::config::{AsvConfig, NormVariant, WorkspacePaths};
use crate::cycle::AnalysisCycle;
use crate::errors::PipelineError;
use crate::forecast::{ForecastChain, Forecaster, SelectionBounds};
use crate::generate::Generator;
use crate::reference::{
    list_input_states, prepare_reference, prepare_reference_from, ReferenceConverter,
    ReferenceState, BEGIN_ROLE,
};
use crate::util::now_epoch_ms;
use crate::validate::{validate_run, validate_run_at, RunFlags};
use crate::workspace;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

mod report;
mod stage;

pub use report::{append_history, load_history, write_report, HistoryEntry, RunReport};
pub use stage::{Stage, StageOutcome};

/// User-supplied parameters of one invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub amplitude: f64,
    /// `today`/`TODAY` or `yyyymmddHH`.
    pub an_date: String,
    pub flags: RunFlags,
    /// Analysis state to use as `begin` reference when not downloading.
    pub reference: Option<PathBuf>,
}

/// External collaborators driven by the pipeline.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub acquisition: &'a dyn Acquisition,
    pub converter: &'a dyn ReferenceConverter,
    pub generator: &'a dyn Generator,
    pub forecaster: &'a dyn Forecaster,
}

/// Sequences the run stages over one workspace.
///
/// Callers must not run two pipelines against the same workspace at once.
pub struct Pipeline<'a> {
    config: &'a AsvConfig,
    paths: &'a WorkspacePaths,
    tools: Collaborators<'a>,
    /// Date `today` resolves to; the local date when unset.
    today: Option<NaiveDate>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AsvConfig, paths: &'a WorkspacePaths, tools: Collaborators<'a>) -> Self {
        Self {
            config,
            paths,
            tools,
            today: None,
        }
    }

    /// Pin the date `today` resolves to.
    #[cfg(test)]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Validate the request without touching the workspace.
    pub fn validate(&self, request: &RunRequest) -> Result<AnalysisCycle, PipelineError> {
        let cycle = match self.today {
            Some(today) => {
                validate_run_at(request.amplitude, &request.an_date, &request.flags, today)?
            }
            None => validate_run(request.amplitude, &request.an_date, &request.flags)?,
        };
        if request.flags.download && request.reference.is_some() {
            return Err(PipelineError::download_with_reference());
        }
        Ok(cycle)
    }

    /// Execute a run and persist its report.
    ///
    /// Validation failures return before any side effect and leave no report.
    pub fn run(&self, request: &RunRequest) -> Result<RunReport> {
        let cycle = self.validate(request).context("validate run parameters")?;
        let mut report = RunReport::new(
            now_epoch_ms()?,
            cycle.clone(),
            request.amplitude,
            request.flags,
        );
        report.record(Stage::Validate, StageOutcome::Completed);
        self.log_parameters(&cycle, request.amplitude);

        let result = self.run_stages(&cycle, request, &mut report);
        report.finished_at_epoch_ms = now_epoch_ms()?;
        match result {
            Ok(()) => {
                report.success = true;
                self.persist(&report)?;
                tracing::info!(cycle = %cycle, "run complete");
                Ok(report)
            }
            Err(err) => {
                report.error = Some(format!("{err:#}"));
                if let Err(persist_err) = self.persist(&report) {
                    tracing::warn!(error = %format!("{persist_err:#}"), "could not record aborted run");
                }
                Err(err)
            }
        }
    }

    fn run_stages(
        &self,
        cycle: &AnalysisCycle,
        request: &RunRequest,
        report: &mut RunReport,
    ) -> Result<()> {
        let mut next = Stage::FIRST.next();
        while let Some(stage) = next {
            if !stage.is_enabled(&request.flags) {
                tracing::debug!(%stage, "stage skipped");
                report.record(stage, StageOutcome::Skipped);
                next = stage.next();
                continue;
            }
            tracing::info!(%stage, "stage started");
            if let Err(err) = self.execute(stage, cycle, request, report) {
                report.record(stage, StageOutcome::Failed);
                return Err(err.context(format!("{stage} stage failed")));
            }
            report.record(stage, StageOutcome::Completed);
            next = stage.next();
        }
        Ok(())
    }

    fn execute(
        &self,
        stage: Stage,
        cycle: &AnalysisCycle,
        request: &RunRequest,
        report: &mut RunReport,
    ) -> Result<()> {
        match stage {
            Stage::Validate => Ok(()),
            Stage::Prepare => {
                if let Some(reference) = self.prepare(request)? {
                    report.reference_source = Some(reference.source);
                    report.reference = Some(reference.path);
                }
                Ok(())
            }
            Stage::Generate => self.tools.generator.generate(request.amplitude, self.config),
            Stage::Forecast => {
                let chain = ForecastChain {
                    forecaster: self.tools.forecaster,
                    paths: self.paths,
                    template: &self.config.sv_pert_filename,
                };
                report.selected_members = chain.select_and_forecast(
                    request.amplitude,
                    request.flags.forecast_leadtime,
                    cycle,
                    &self.config.sv_nrs,
                    SelectionBounds {
                        cutoff: self.config.sv_cutoff,
                        block_size: self.config.block_size,
                        loops: self.config.loops,
                    },
                )?;
                Ok(())
            }
        }
    }

    /// Prepare directories and, when asked, the `begin` reference.
    fn prepare(&self, request: &RunRequest) -> Result<Option<ReferenceState>> {
        if request.flags.download {
            workspace::prepare(self.paths, true, false)?;
            self.tools
                .acquisition
                .download(&self.config.tools.download_mode, self.paths.input_dir())?;
            let states = list_input_states(self.paths.input_dir())?;
            let reference =
                prepare_reference(self.tools.converter, self.paths, &states, BEGIN_ROLE)?;
            return Ok(Some(reference));
        }

        workspace::prepare(self.paths, false, false)?;
        match &request.reference {
            Some(source) => {
                prepare_reference_from(self.tools.converter, self.paths, source, BEGIN_ROLE)
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn persist(&self, report: &RunReport) -> Result<()> {
        write_report(self.paths, report)?;
        append_history(self.paths, &HistoryEntry::from(report))?;
        Ok(())
    }

    fn log_parameters(&self, cycle: &AnalysisCycle, amplitude: f64) {
        let config = self.config;
        tracing::info!(
            an_date = %cycle,
            amplitude,
            area = %config.area,
            block_size = config.block_size,
            loops = config.loops,
            generated_members = config.generated_members(),
            t_opt = config.t_opt,
            sv_vars = ?config.sv_vars,
            norm_variant = %config.norm_variant,
            model = %config.model,
            process_unit = %config.process_unit,
            "start Arnoldi SV algorithm"
        );
        if config.norm_variant == NormVariant::Energy {
            tracing::info!(
                "norm_variant 'energy' is a reduced total energy norm: surface pressure is not \
                 taken into account"
            );
        }
    }
}
