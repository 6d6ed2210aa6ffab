//! Time handling utilities for forecast inputs.
//!
//! The canonical `time` axis stores signed offsets from a single forecast
//! initialization instant. [`ForecastClock`] converts between those offsets
//! and absolute instants whenever calendar context is needed.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Default spacing between model steps.
pub const DEFAULT_STEP_HOURS: i64 = 6;

/// Parse an ISO 8601 timestamp, assuming UTC when no offset is given.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DDTHH:MM` and bare
/// dates (midnight).
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Lead times `(i + 1) * step_hours` for `i in 0..steps`.
pub fn lead_times(steps: usize, step_hours: i64) -> Vec<Duration> {
    (1..=steps as i64)
        .map(|i| Duration::hours(i * step_hours))
        .collect()
}

/// Converts between absolute instants and offsets from an initialization
/// instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastClock {
    /// Forecast initialization instant.
    pub init: DateTime<Utc>,
}

impl ForecastClock {
    pub fn new(init: DateTime<Utc>) -> Self {
        Self { init }
    }

    /// Clock initialized at the last instant of an input sequence.
    pub fn at_last(times: &[DateTime<Utc>]) -> Option<Self> {
        times.last().copied().map(Self::new)
    }

    /// Signed offsets of `times` relative to the initialization instant.
    pub fn offsets(&self, times: &[DateTime<Utc>]) -> Vec<Duration> {
        times.iter().map(|t| *t - self.init).collect()
    }

    /// Absolute instants for the given offsets.
    pub fn absolute(&self, offsets: &[Duration]) -> Vec<DateTime<Utc>> {
        offsets.iter().map(|d| self.init + *d).collect()
    }
}

/// Format an offset the way it is logged, e.g. `-6h`, `+18h`, `+0h30m`.
pub fn format_offset(offset: &Duration) -> String {
    let total_minutes = offset.num_minutes();
    let sign = if total_minutes < 0 { '-' } else { '+' };
    let abs = total_minutes.abs();
    let (hours, minutes) = (abs / 60, abs % 60);
    if minutes == 0 {
        format!("{}{}h", sign, hours)
    } else {
        format!("{}{}h{}m", sign, hours, minutes)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}
