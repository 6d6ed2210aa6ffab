//! Alignment transforms applied to a `(time, lat, lon)` series.
//!
//! Steps run in a fixed order: time offset and stride, time window,
//! latitude flip, trailing-latitude trim, longitude roll, then the lat/lon
//! index subsets.

use std::ops::Range;

use forecast_common::{PipelineError, PipelineResult, Stage};
use ndarray::{concatenate, s, Array3, ArrayView3, Axis, Slice};
use serde::{Deserialize, Serialize};

const TIME: Axis = Axis(0);
const LAT: Axis = Axis(1);
const LON: Axis = Axis(2);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignTransform {
    /// First time index kept.
    pub time_offset: usize,
    /// Keep every `time_stride`-th step from `time_offset`.
    pub time_stride: usize,
    /// Keep at most this many steps after striding.
    pub time_window: Option<usize>,
    /// Reverse the latitude axis.
    pub flip_lat: bool,
    /// Rows dropped from the end of the latitude axis, after any flip.
    pub trim_trailing_lat: usize,
    /// Output column `j` takes input column `(j + lon_roll) mod nlon`.
    pub lon_roll: isize,
    /// Latitude index subset, applied after flip and trim.
    pub lat_range: Option<Range<usize>>,
    /// Longitude index subset, applied after the roll.
    pub lon_range: Option<Range<usize>>,
}

impl Default for AlignTransform {
    fn default() -> Self {
        Self {
            time_offset: 0,
            time_stride: 1,
            time_window: None,
            flip_lat: false,
            trim_trailing_lat: 0,
            lon_roll: 0,
            lat_range: None,
            lon_range: None,
        }
    }
}

fn subset(name: &str, axis: &str, len: usize, range: &Range<usize>) -> PipelineResult<Slice> {
    if range.start >= range.end || range.end > len {
        return Err(PipelineError::shape(
            Stage::Compare,
            format!("{}.{}", name, axis),
            vec![len],
            vec![range.start, range.end],
        ));
    }
    Ok(Slice::from(range.clone()))
}

impl AlignTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the transform to `data`; `name` labels errors.
    pub fn apply(&self, name: &str, data: ArrayView3<f32>) -> PipelineResult<Array3<f32>> {
        if self.time_stride == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "{}: time stride must be at least 1",
                name
            )));
        }
        let nt = data.len_of(TIME);
        if self.time_offset >= nt {
            return Err(PipelineError::insufficient(
                Stage::Compare,
                name,
                format!("time offset {} beyond {} steps", self.time_offset, nt),
            ));
        }

        let mut view = data.slice_axis(
            TIME,
            Slice::new(self.time_offset as isize, None, self.time_stride as isize),
        );
        if let Some(window) = self.time_window {
            let keep = view.len_of(TIME).min(window);
            view.slice_axis_inplace(TIME, Slice::from(..keep));
        }

        if self.flip_lat {
            view.invert_axis(LAT);
        }
        let nlat = view.len_of(LAT);
        if self.trim_trailing_lat >= nlat && self.trim_trailing_lat > 0 {
            return Err(PipelineError::shape(
                Stage::Compare,
                format!("{}.lat", name),
                vec![nlat],
                vec![self.trim_trailing_lat],
            ));
        }
        view.slice_axis_inplace(LAT, Slice::from(..nlat - self.trim_trailing_lat));
        if let Some(range) = &self.lat_range {
            let slice = subset(name, "lat", view.len_of(LAT), range)?;
            view.slice_axis_inplace(LAT, slice);
        }

        let mut out = roll_lon(view, self.lon_roll)?;
        if let Some(range) = &self.lon_range {
            let slice = subset(name, "lon", out.len_of(LON), range)?;
            out = out.slice_axis(LON, slice).to_owned();
        }
        Ok(out)
    }
}

fn roll_lon(view: ArrayView3<f32>, roll: isize) -> PipelineResult<Array3<f32>> {
    let nlon = view.len_of(LON);
    if roll == 0 || nlon == 0 {
        return Ok(view.to_owned());
    }
    let k = roll.rem_euclid(nlon as isize) as usize;
    concatenate(LON, &[view.slice(s![.., .., k..]), view.slice(s![.., .., ..k])])
        .map_err(|e| PipelineError::schema(Stage::Compare, "lon", e.to_string()))
}
