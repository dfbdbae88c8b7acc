//! Analysis cycle identifiers (`yyyymmddHH`).
use crate::errors::PipelineError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed length of a cycle identifier.
pub const CYCLE_LEN: usize = 10;

/// Literals that resolve to the current day's `00` cycle.
const TODAY_LITERALS: [&str; 2] = ["today", "TODAY"];

/// A validated analysis cycle in `yyyymmddHH` form.
///
/// Only [`AnalysisCycle::parse`] and [`AnalysisCycle::for_date`] build values,
/// so any cycle that reaches a pipeline stage is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnalysisCycle(String);

impl AnalysisCycle {
    /// Parse an explicit cycle identifier.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let malformed = |detail: &str| PipelineError::MalformedCycle {
            cycle: raw.to_string(),
            detail: detail.to_string(),
        };
        let len = raw.chars().count();
        if len != CYCLE_LEN {
            return Err(malformed(&format!("length is {len} instead of {CYCLE_LEN}")));
        }
        if !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("only digits are allowed"));
        }
        let (date, hour) = raw.split_at(8);
        NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| malformed("not a calendar date"))?;
        let hour: u32 = hour.parse().map_err(|_| malformed("hour is not numeric"))?;
        NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| malformed("hour must be 00-23"))?;
        Ok(Self(raw.to_string()))
    }

    /// The `00` cycle of the given calendar day.
    pub fn for_date(date: NaiveDate) -> Self {
        Self(format!("{}00", date.format("%Y%m%d")))
    }

    /// Whether the raw value is one of the `today` literals.
    pub fn is_today_literal(raw: &str) -> bool {
        TODAY_LITERALS.contains(&raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnalysisCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AnalysisCycle {
    type Error = PipelineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AnalysisCycle> for String {
    fn from(value: AnalysisCycle) -> Self {
        value.0
    }
}
