//! Year- and day-progress features.
//!
//! ```text
//! year_fraction = (day_of_year - 1) / days_in_year     (365 or 366)
//! day_fraction  = seconds_since_midnight / 86400
//! ```
//!
//! Each fraction is mapped onto the unit circle. Values are computed in `f64`
//! and stored as `f32`.

use std::f64::consts::TAU;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use forecast_common::{parse_iso8601, PipelineError, PipelineResult};
use tracing::debug;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// The four periodic calendar signals for a timestamp sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CalendarFeatures {
    pub year_progress_sin: Vec<f32>,
    pub year_progress_cos: Vec<f32>,
    pub day_progress_sin: Vec<f32>,
    pub day_progress_cos: Vec<f32>,
}

impl CalendarFeatures {
    pub fn len(&self) -> usize {
        self.year_progress_sin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.year_progress_sin.is_empty()
    }

    /// Year-progress signals keyed by their canonical field names.
    pub fn year_progress(&self) -> [(&'static str, &[f32]); 2] {
        [
            ("year_progress_sin", &self.year_progress_sin),
            ("year_progress_cos", &self.year_progress_cos),
        ]
    }

    /// Day-progress signals keyed by their canonical field names.
    pub fn day_progress(&self) -> [(&'static str, &[f32]); 2] {
        [
            ("day_progress_sin", &self.day_progress_sin),
            ("day_progress_cos", &self.day_progress_cos),
        ]
    }
}

fn days_in_year(year: i32) -> f64 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366.0
    } else {
        365.0
    }
}

/// Fraction of the calendar year elapsed at the start of `t`'s day.
pub fn year_fraction(t: &DateTime<Utc>) -> f64 {
    (t.ordinal() as f64 - 1.0) / days_in_year(t.year())
}

/// Fraction of the UTC day elapsed at `t`, whole seconds.
pub fn day_fraction(t: &DateTime<Utc>) -> f64 {
    t.num_seconds_from_midnight() as f64 / SECONDS_PER_DAY
}

/// Encode a timestamp sequence into calendar features.
pub fn encode(times: &[DateTime<Utc>]) -> CalendarFeatures {
    let mut features = CalendarFeatures {
        year_progress_sin: Vec::with_capacity(times.len()),
        year_progress_cos: Vec::with_capacity(times.len()),
        day_progress_sin: Vec::with_capacity(times.len()),
        day_progress_cos: Vec::with_capacity(times.len()),
    };

    for t in times {
        let year = TAU * year_fraction(t);
        let day = TAU * day_fraction(t);
        features.year_progress_sin.push(year.sin() as f32);
        features.year_progress_cos.push(year.cos() as f32);
        features.day_progress_sin.push(day.sin() as f32);
        features.day_progress_cos.push(day.cos() as f32);
    }

    debug!(steps = times.len(), "Encoded calendar features");
    features
}

/// Parse ISO 8601 timestamps and encode them.
///
/// A malformed timestamp fails the whole batch with
/// [`PipelineError::InvalidTimestamp`].
pub fn encode_iso<S: AsRef<str>>(times: &[S]) -> PipelineResult<CalendarFeatures> {
    let parsed = times
        .iter()
        .map(|s| {
            parse_iso8601(s.as_ref()).map_err(|e| PipelineError::InvalidTimestamp(e.to_string()))
        })
        .collect::<PipelineResult<Vec<_>>>()?;
    Ok(encode(&parsed))
}
