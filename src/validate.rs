//! Run-parameter validation.
//!
//! Validation happens before any filesystem or process side effect, and the
//! check order is fixed: amplitude, download/cycle conflict, `today`
//! resolution, cycle shape.
use crate::cycle::AnalysisCycle;
use crate::errors::{PipelineError, AMPLITUDE_MAX, AMPLITUDE_MIN};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-invocation stage switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunFlags {
    pub download: bool,
    pub run: bool,
    /// Forecast horizon in hours; `0` disables the forecast stage.
    pub forecast_leadtime: u32,
}

impl RunFlags {
    pub fn wants_forecast(&self) -> bool {
        self.run && self.forecast_leadtime > 0
    }
}

/// Check an amplitude against the accepted range.
pub fn check_amplitude(amplitude: f64) -> Result<(), PipelineError> {
    if (AMPLITUDE_MIN..=AMPLITUDE_MAX).contains(&amplitude) {
        Ok(())
    } else {
        Err(PipelineError::OutOfRange { amplitude })
    }
}

/// Validate run parameters against a fixed "today".
pub fn validate_run_at(
    amplitude: f64,
    an_date: &str,
    flags: &RunFlags,
    today: NaiveDate,
) -> Result<AnalysisCycle, PipelineError> {
    check_amplitude(amplitude)?;
    let is_today = AnalysisCycle::is_today_literal(an_date);
    if flags.download && !is_today {
        return Err(PipelineError::download_with_explicit_cycle(an_date));
    }
    if is_today {
        return Ok(AnalysisCycle::for_date(today));
    }
    AnalysisCycle::parse(an_date)
}

/// Validate run parameters against the local wall-clock date.
pub fn validate_run(
    amplitude: f64,
    an_date: &str,
    flags: &RunFlags,
) -> Result<AnalysisCycle, PipelineError> {
    validate_run_at(amplitude, an_date, flags, chrono::Local::now().date_naive())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
