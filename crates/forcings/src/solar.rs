//! Top-of-atmosphere solar forcing lookup.
//!
//! Radiation at a future instant cannot be observed, so the resolver stands
//! in the reference table's value for the same `month-day-hour` in whichever
//! year the table covers. Two absolute years are treated as interchangeable.
//! No spatial interpolation is done: the table grid must equal the requested
//! grid.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc};
use forecast_common::{coords_match, PipelineError, PipelineResult, Stage};
use ndarray::{s, Array3, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Canonical name of the resolved field.
pub const TOA_FIELD: &str = "toa_incident_solar_radiation";

/// Year-independent `month-day-hour` pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarKey {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl CalendarKey {
    pub fn new(month: u32, day: u32, hour: u32) -> Self {
        Self { month, day, hour }
    }

    pub fn of(t: &DateTime<Utc>) -> Self {
        Self::new(t.month(), t.day(), t.hour())
    }

    pub fn is_leap_day(&self) -> bool {
        self.month == 2 && self.day == 29
    }
}

impl fmt::Display for CalendarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:02}", self.month, self.day, self.hour)
    }
}

/// What to do when Feb 29 is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeapDayPolicy {
    /// Feb 29 must be present in the table.
    #[default]
    Strict,
    /// Use Feb 28 at the same hour when Feb 29 is absent.
    FallbackToFeb28,
}

/// Reference radiation samples on a fixed lat/lon grid.
///
/// Built once, queried many times. Latitude is stored ascending.
#[derive(Debug, Clone)]
pub struct SolarForcingTable {
    times: Vec<DateTime<Utc>>,
    lat: Vec<f32>,
    lon: Vec<f32>,
    values: Array3<f32>,
    index: HashMap<CalendarKey, usize>,
    policy: LeapDayPolicy,
}

impl SolarForcingTable {
    /// Build a table from `(time, lat, lon)` samples.
    ///
    /// Latitude may arrive descending; rows are flipped to ascending. When a
    /// key occurs in several years the most recent sample wins.
    pub fn new(
        times: Vec<DateTime<Utc>>,
        mut lat: Vec<f32>,
        lon: Vec<f32>,
        mut values: Array3<f32>,
    ) -> PipelineResult<Self> {
        let expected = [times.len(), lat.len(), lon.len()];
        if values.shape() != expected {
            return Err(PipelineError::shape(
                Stage::Solar,
                TOA_FIELD,
                expected,
                values.shape(),
            ));
        }

        if lat.len() > 1 && lat[0] > lat[lat.len() - 1] {
            lat.reverse();
            values.invert_axis(Axis(1));
        }
        if !lat.windows(2).all(|w| w[0] < w[1]) {
            return Err(PipelineError::coordinate(
                Stage::Solar,
                "lat",
                "radiation table latitudes are not monotonic",
            ));
        }

        let mut index: HashMap<CalendarKey, usize> = HashMap::with_capacity(times.len());
        for (row, t) in times.iter().enumerate() {
            index
                .entry(CalendarKey::of(t))
                .and_modify(|existing| {
                    if times[*existing] < *t {
                        *existing = row;
                    }
                })
                .or_insert(row);
        }

        info!(
            rows = times.len(),
            patterns = index.len(),
            nlat = lat.len(),
            nlon = lon.len(),
            "Loaded solar forcing table"
        );

        Ok(Self {
            times,
            lat,
            lon,
            values,
            index,
            policy: LeapDayPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: LeapDayPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LeapDayPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    pub fn lat(&self) -> &[f32] {
        &self.lat
    }

    pub fn lon(&self) -> &[f32] {
        &self.lon
    }

    pub fn contains(&self, key: &CalendarKey) -> bool {
        self.index.contains_key(key)
    }

    /// Row holding the sample for `t`'s calendar pattern.
    pub fn row_for(&self, t: &DateTime<Utc>) -> PipelineResult<usize> {
        let key = CalendarKey::of(t);
        if let Some(&row) = self.index.get(&key) {
            return Ok(row);
        }
        if key.is_leap_day() && self.policy == LeapDayPolicy::FallbackToFeb28 {
            let fallback = CalendarKey::new(2, 28, key.hour);
            if let Some(&row) = self.index.get(&fallback) {
                debug!(key = %key, fallback = %fallback, "Leap day resolved from Feb 28");
                return Ok(row);
            }
        }
        Err(PipelineError::MissingCalendarPattern {
            stage: Stage::Solar,
            key: key.to_string(),
        })
    }

    /// Radiation for each requested instant on the requested grid,
    /// shaped `(time, lat, lon)`.
    pub fn resolve(
        &self,
        times: &[DateTime<Utc>],
        lat: &[f32],
        lon: &[f32],
    ) -> PipelineResult<Array3<f32>> {
        self.check_grid(lat, lon)?;

        let rows = times
            .iter()
            .map(|t| self.row_for(t))
            .collect::<PipelineResult<Vec<_>>>()?;

        let mut out = Array3::<f32>::zeros((times.len(), lat.len(), lon.len()));
        for (i, &row) in rows.iter().enumerate() {
            out.slice_mut(s![i, .., ..])
                .assign(&self.values.slice(s![row, .., ..]));
        }

        debug!(steps = times.len(), "Resolved solar forcing");
        Ok(out)
    }

    fn check_grid(&self, lat: &[f32], lon: &[f32]) -> PipelineResult<()> {
        if lat.len() != self.lat.len() || lon.len() != self.lon.len() {
            return Err(PipelineError::shape(
                Stage::Solar,
                TOA_FIELD,
                vec![self.lat.len(), self.lon.len()],
                vec![lat.len(), lon.len()],
            ));
        }
        if !coords_match(&self.lat, lat) {
            return Err(PipelineError::coordinate(
                Stage::Solar,
                "lat",
                "requested latitudes differ from the radiation table",
            ));
        }
        if !coords_match(&self.lon, lon) {
            return Err(PipelineError::coordinate(
                Stage::Solar,
                "lon",
                "requested longitudes differ from the radiation table",
            ));
        }
        Ok(())
    }
}
