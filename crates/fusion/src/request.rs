//! Upstream request descriptors.
//!
//! The download client is external. This module only describes what to ask
//! for: each [`SourceRequest`] serializes to the provider's JSON request
//! body, and a [`SourceProvider`] turns a [`RetrieveJob`] into a local file.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use forecast_common::{PipelineError, PipelineResult, PRESSURE_LEVELS_37};
use serde::{Deserialize, Serialize};

use crate::source::SourceKind;
use crate::tables::request_variables;

/// Request body for one provider retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRequest {
    pub product_type: Vec<String>,
    pub variable: Vec<String>,
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub day: Vec<String>,
    pub time: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_level: Option<Vec<String>>,
    pub data_format: String,
    pub download_format: String,
}

fn hh00(hours: impl IntoIterator<Item = u32>) -> Vec<String> {
    hours.into_iter().map(|h| format!("{:02}:00", h)).collect()
}

fn two_digit(values: impl IntoIterator<Item = u32>) -> Vec<String> {
    values.into_iter().map(|v| format!("{:02}", v)).collect()
}

impl SourceRequest {
    fn base(variables: &[&str], date: NaiveDate, hours: Vec<String>) -> Self {
        Self {
            product_type: vec!["reanalysis".to_string()],
            variable: variables.iter().map(|v| v.to_string()).collect(),
            year: vec![date.year().to_string()],
            month: two_digit([date.month()]),
            day: two_digit([date.day()]),
            time: hours,
            pressure_level: None,
            data_format: "netcdf".to_string(),
            download_format: "unarchived".to_string(),
        }
    }

    /// Request for one of the three raw sources on `date`.
    ///
    /// `instants` are the input hours (ascending). The accumulated source
    /// covers the `window` hours ending at each instant, so that every
    /// instant closes exactly one complete window.
    pub fn for_source(
        kind: SourceKind,
        date: NaiveDate,
        instants: &[u32],
        window: u32,
    ) -> PipelineResult<Self> {
        let (first, last) = match (instants.first(), instants.last()) {
            (Some(&first), Some(&last)) if last < 24 => (first, last),
            _ => {
                return Err(PipelineError::InvalidConfig(format!(
                    "input hours must be non-empty and below 24, got {:?}",
                    instants
                )))
            }
        };
        let variables = request_variables(kind);
        let request = match kind {
            SourceKind::SingleInstant => Self::base(variables, date, hh00(instants.iter().copied())),
            SourceKind::SingleAccum => {
                let start = (first + 1).checked_sub(window).ok_or_else(|| {
                    PipelineError::InvalidConfig(format!(
                        "first input hour {} leaves no room for a {}-hour accumulation window",
                        first, window
                    ))
                })?;
                Self::base(variables, date, hh00(start..=last))
            }
            SourceKind::PressureLevels => {
                let mut request = Self::base(variables, date, hh00(instants.iter().copied()));
                request.pressure_level =
                    Some(PRESSURE_LEVELS_37.iter().map(|l| l.to_string()).collect());
                request
            }
        };
        Ok(request)
    }

    /// Hourly radiation for a run of days, used as the reference table.
    pub fn radiation_table(year: i32, month: u32, days: std::ops::RangeInclusive<u32>) -> Self {
        Self {
            product_type: vec!["reanalysis".to_string()],
            variable: vec!["toa_incident_solar_radiation".to_string()],
            year: vec![year.to_string()],
            month: two_digit([month]),
            day: two_digit(days),
            time: hh00(0..24),
            pressure_level: None,
            data_format: "netcdf".to_string(),
            download_format: "unarchived".to_string(),
        }
    }

    /// Hourly verification series of single-level variables.
    pub fn verification_series(
        variables: &[&str],
        year: i32,
        month: u32,
        days: std::ops::RangeInclusive<u32>,
    ) -> Self {
        let mut request = Self::radiation_table(year, month, days);
        request.variable = variables.iter().map(|v| v.to_string()).collect();
        request
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::InvalidConfig(format!("request serialization: {}", e)))
    }
}

/// A request together with its provider collection and local target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieveJob {
    pub collection: String,
    pub request: SourceRequest,
    pub target: PathBuf,
}

impl RetrieveJob {
    /// The three raw-source jobs for one initialization day.
    pub fn inputs(
        date: NaiveDate,
        instants: &[u32],
        window: u32,
        dir: &Path,
    ) -> PipelineResult<Vec<Self>> {
        SourceKind::ALL
            .iter()
            .map(|&kind| -> PipelineResult<Self> {
                Ok(Self {
                    collection: kind.collection().to_string(),
                    request: SourceRequest::for_source(kind, date, instants, window)?,
                    target: dir.join(format!("{}.nc", kind.as_str())),
                })
            })
            .collect()
    }

    pub fn radiation_table(
        year: i32,
        month: u32,
        days: std::ops::RangeInclusive<u32>,
        dir: &Path,
    ) -> Self {
        Self {
            collection: SourceKind::SingleInstant.collection().to_string(),
            request: SourceRequest::radiation_table(year, month, days),
            target: dir.join("toa.nc"),
        }
    }

    pub fn verification_series(
        variables: &[&str],
        year: i32,
        month: u32,
        days: std::ops::RangeInclusive<u32>,
        dir: &Path,
    ) -> Self {
        Self {
            collection: SourceKind::SingleInstant.collection().to_string(),
            request: SourceRequest::verification_series(variables, year, month, days),
            target: dir.join("real-temp.nc"),
        }
    }
}

/// The external download client.
///
/// Retries and credentials belong to the implementation; a failed
/// retrieval is reported as-is.
pub trait SourceProvider {
    fn retrieve(&self, job: &RetrieveJob) -> PipelineResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 11).unwrap()
    }

    #[test]
    fn test_accum_hours_cover_windows() {
        let req = SourceRequest::for_source(SourceKind::SingleAccum, day(), &[12, 18], 6).unwrap();
        assert_eq!(req.time.first().map(String::as_str), Some("07:00"));
        assert_eq!(req.time.last().map(String::as_str), Some("18:00"));
        assert_eq!(req.time.len(), 12);
        assert_eq!(req.variable, vec!["total_precipitation"]);
    }

    #[test]
    fn test_pressure_request_lists_levels() {
        let req =
            SourceRequest::for_source(SourceKind::PressureLevels, day(), &[12, 18], 6).unwrap();
        assert_eq!(req.pressure_level.as_ref().map(Vec::len), Some(37));
        assert_eq!(req.time, vec!["12:00", "18:00"]);
        assert_eq!(req.month, vec!["07"]);
    }

    #[test]
    fn test_single_instant_json_omits_levels() {
        let req =
            SourceRequest::for_source(SourceKind::SingleInstant, day(), &[12, 18], 6).unwrap();
        let json = req.to_json().unwrap();
        assert!(!json.contains("pressure_level"));
        assert!(json.contains("\"data_format\": \"netcdf\""));
    }

    #[test]
    fn test_window_too_wide_for_first_hour() {
        assert!(SourceRequest::for_source(SourceKind::SingleAccum, day(), &[3], 6).is_err());
    }

    #[test]
    fn test_radiation_table_days() {
        let req = SourceRequest::radiation_table(2024, 7, 11..=31);
        assert_eq!(req.day.len(), 21);
        assert_eq!(req.time.len(), 24);
    }

    #[test]
    fn test_input_jobs() {
        let jobs = RetrieveJob::inputs(day(), &[12, 18], 6, Path::new("download")).unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[2].collection, "reanalysis-era5-pressure-levels");
        assert_eq!(jobs[0].target, Path::new("download/single-instant.nc"));
    }

    #[test]
    fn test_auxiliary_jobs_use_single_levels() {
        let dir = Path::new("download");
        let toa = RetrieveJob::radiation_table(2024, 7, 1..=31, dir);
        let real = RetrieveJob::verification_series(&["2m_temperature"], 2025, 7, 11..=12, dir);
        assert_eq!(toa.collection, "reanalysis-era5-single-levels");
        assert_eq!(real.collection, toa.collection);
        assert_eq!(toa.target, Path::new("download/toa.nc"));
    }
}
