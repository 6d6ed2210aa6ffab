//! Test data generators for synthetic reanalysis-like data.
//!
//! These generators create predictable, verifiable arrays so tests can check
//! where a value ended up after renaming, windowing and axis sorting.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use ndarray::{Array3, ArrayD, Dimension, IxDyn};

/// Timestamps at the given hours of one day.
///
/// Panics if `day` is not `YYYY-MM-DD`; test fixtures only.
pub fn hourly_times(day: &str, hours: impl IntoIterator<Item = u32>) -> Vec<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").expect("fixture day must be YYYY-MM-DD");
    let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight"));
    hours
        .into_iter()
        .map(|h| midnight + Duration::hours(h as i64))
        .collect()
}

/// Every hour of a date range, `[start, end]` inclusive.
pub fn hourly_range(start: &str, end: &str) -> Vec<DateTime<Utc>> {
    let first = hourly_times(start, [0])[0];
    let last = hourly_times(end, [23])[0];
    let n = (last - first).num_hours();
    (0..=n).map(|i| first + Duration::hours(i)).collect()
}

/// Parse fixture timestamps in RFC 3339 form.
pub fn parse_times(values: &[&str]) -> Vec<DateTime<Utc>> {
    values
        .iter()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .expect("fixture timestamp must be RFC 3339")
                .with_timezone(&Utc)
        })
        .collect()
}

/// A `(time, lat, lon)` series of ones.
pub fn ones_series(ntime: usize, nlat: usize, nlon: usize) -> Array3<f32> {
    Array3::ones((ntime, nlat, nlon))
}

/// A `(time, lat, lon)` series whose every value is the hour of its timestamp.
pub fn hour_valued_series(times: &[DateTime<Utc>], nlat: usize, nlon: usize) -> Array3<f32> {
    Array3::from_shape_fn((times.len(), nlat, nlon), |(t, _, _)| times[t].hour() as f32)
}

/// An array of arbitrary shape whose value encodes its index.
///
/// The last axis contributes units, the one before it hundreds, and so on;
/// e.g. index `[1, 2, 3]` holds `10203.0`.
pub fn index_coded(shape: &[usize]) -> ArrayD<f32> {
    ArrayD::from_shape_fn(IxDyn(shape), |idx| {
        idx.slice()
            .iter()
            .fold(0.0_f32, |acc, &i| acc * 100.0 + i as f32)
    })
}

/// Calendar code `MMDDHH` of a timestamp, exactly representable in `f32`.
pub fn calendar_code(t: &DateTime<Utc>) -> f32 {
    (t.month() * 10_000 + t.day() * 100 + t.hour()) as f32
}

/// A radiation-table series whose values are the calendar code of each row.
pub fn calendar_coded_series(times: &[DateTime<Utc>], nlat: usize, nlon: usize) -> Array3<f32> {
    Array3::from_shape_fn((times.len(), nlat, nlon), |(t, _, _)| calendar_code(&times[t]))
}

/// A series whose values are the latitude row index.
pub fn lat_indexed_series(ntime: usize, nlat: usize, nlon: usize) -> Array3<f32> {
    Array3::from_shape_fn((ntime, nlat, nlon), |(_, i, _)| i as f32)
}

/// A 2-D grid with predictable values: `col * 1000 + row`, row-major.
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a test grid with temperature-like values in Kelvin (250K to 310K).
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Copy of `values` with NaN at the given flat indices.
pub fn with_nans(values: &[f32], nan_indices: &[usize]) -> Vec<f32> {
    let mut data = values.to_vec();
    for &i in nan_indices {
        if i < data.len() {
            data[i] = f32::NAN;
        }
    }
    data
}
