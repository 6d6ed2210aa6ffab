//! Core types for the canonical dataset model.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Duration;
use ndarray::ArrayD;

use crate::error::{DatasetError, Result};

/// A canonical axis.
///
/// The declaration order is the canonical axis order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    /// Forecast initialization index (size 1, unlabeled).
    Batch,
    /// Offsets from the initialization instant.
    Time,
    /// Pressure level in hPa.
    Level,
    /// Latitude in degrees north.
    Lat,
    /// Longitude in degrees east, 0..360.
    Lon,
}

impl Axis {
    /// All axes in canonical order.
    pub const CANONICAL: [Axis; 5] = [Axis::Batch, Axis::Time, Axis::Level, Axis::Lat, Axis::Lon];

    pub fn name(&self) -> &'static str {
        match self {
            Axis::Batch => "batch",
            Axis::Time => "time",
            Axis::Level => "level",
            Axis::Lat => "lat",
            Axis::Lon => "lon",
        }
    }

    /// Parse a canonical axis name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "batch" => Ok(Axis::Batch),
            "time" => Ok(Axis::Time),
            "level" => Ok(Axis::Level),
            "lat" => Ok(Axis::Lat),
            "lon" => Ok(Axis::Lon),
            other => Err(DatasetError::UnknownAxis(other.to_string())),
        }
    }

    /// Axes of a 2-D surface field.
    pub fn surface() -> Vec<Axis> {
        vec![Axis::Batch, Axis::Time, Axis::Lat, Axis::Lon]
    }

    /// Axes of a 3-D atmospheric field.
    pub fn atmospheric() -> Vec<Axis> {
        vec![Axis::Batch, Axis::Time, Axis::Level, Axis::Lat, Axis::Lon]
    }

    /// Axes of a static field.
    pub fn static_2d() -> Vec<Axis> {
        vec![Axis::Lat, Axis::Lon]
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) fn axis_names(axes: &[Axis]) -> Vec<String> {
    axes.iter().map(|a| a.name().to_string()).collect()
}

/// Coordinate vectors for every axis of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    /// Size of the unlabeled batch axis.
    pub batch: usize,
    /// Offsets from the initialization instant.
    pub time: Vec<Duration>,
    /// Pressure levels, when any field spans `level`.
    pub level: Option<Vec<i32>>,
    /// Latitudes (32-bit float).
    pub lat: Vec<f32>,
    /// Longitudes (32-bit float).
    pub lon: Vec<f32>,
}

impl Coordinates {
    pub fn new(time: Vec<Duration>, level: Option<Vec<i32>>, lat: Vec<f32>, lon: Vec<f32>) -> Self {
        Self {
            batch: 1,
            time,
            level,
            lat,
            lon,
        }
    }

    /// Length of an axis, `None` if the dataset has no such coordinate.
    pub fn len_of(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::Batch => Some(self.batch),
            Axis::Time => Some(self.time.len()),
            Axis::Level => self.level.as_ref().map(|l| l.len()),
            Axis::Lat => Some(self.lat.len()),
            Axis::Lon => Some(self.lon.len()),
        }
    }

    /// Expected array shape for a field spanning `axes`.
    pub fn shape_for(&self, field: &str, axes: &[Axis]) -> Result<Vec<usize>> {
        axes.iter()
            .map(|&axis| {
                self.len_of(axis).ok_or_else(|| DatasetError::MissingCoordinate {
                    field: field.to_string(),
                    axis: axis.name().to_string(),
                })
            })
            .collect()
    }
}

/// A named array together with the axes it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    axes: Vec<Axis>,
    data: ArrayD<f32>,
    /// Free-form attributes (units, description).
    pub attrs: BTreeMap<String, String>,
}

impl Field {
    /// Create a field, checking that `axes` follow the canonical order and
    /// match the array rank.
    pub fn new(axes: Vec<Axis>, data: ArrayD<f32>) -> Result<Self> {
        if !axes.windows(2).all(|w| w[0] < w[1]) {
            return Err(DatasetError::AxisOrder {
                field: String::new(),
                axes: axis_names(&axes),
            });
        }
        if axes.len() != data.ndim() {
            return Err(DatasetError::RankMismatch {
                field: String::new(),
                axes: axes.len(),
                ndim: data.ndim(),
            });
        }
        Ok(Self {
            axes,
            data,
            attrs: BTreeMap::new(),
        })
    }

    /// Attach an attribute, builder style.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn data(&self) -> &ArrayD<f32> {
        &self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Position of `axis` within this field's array, if spanned.
    pub fn axis_index(&self, axis: Axis) -> Option<usize> {
        self.axes.iter().position(|&a| a == axis)
    }

    pub fn spans(&self, axis: Axis) -> bool {
        self.axis_index(axis).is_some()
    }

    /// Prepend a `batch` axis of size 1.
    pub fn insert_batch(self) -> Result<Self> {
        if self.spans(Axis::Batch) {
            return Ok(self);
        }
        let mut axes = Vec::with_capacity(self.axes.len() + 1);
        axes.push(Axis::Batch);
        axes.extend_from_slice(&self.axes);
        let data = self.data.insert_axis(ndarray::Axis(0));
        Ok(Self {
            axes,
            data,
            attrs: self.attrs,
        })
    }

    /// Reduce to the first batch/time slice after checking that every slice
    /// is identical to it.
    pub fn collapse_static(&self, name: &str) -> Result<Self> {
        let mut data = self.data.clone();
        let mut axes = self.axes.clone();

        for axis in [Axis::Batch, Axis::Time] {
            if let Some(idx) = axes.iter().position(|&a| a == axis) {
                let first = data.index_axis(ndarray::Axis(idx), 0).to_owned();
                let uniform = data
                    .axis_iter(ndarray::Axis(idx))
                    .all(|slice| slices_equal(&slice, &first.view()));
                if !uniform {
                    return Err(DatasetError::StaticVaries(name.to_string()));
                }
                data = first;
                axes.remove(idx);
            }
        }

        Ok(Self {
            axes,
            data,
            attrs: self.attrs.clone(),
        })
    }

    /// Reorder the array along `axis` by `order` (indices into the old axis).
    pub fn reorder(&mut self, axis: Axis, order: &[usize]) {
        if let Some(idx) = self.axis_index(axis) {
            self.data = self.data.select(ndarray::Axis(idx), order);
        }
    }

    /// Same axes and attributes, every value NaN.
    pub fn nan_filled(&self) -> Self {
        Self {
            axes: self.axes.clone(),
            data: ArrayD::from_elem(self.data.raw_dim(), f32::NAN),
            attrs: self.attrs.clone(),
        }
    }

    pub(crate) fn named(mut err: DatasetError, name: &str) -> DatasetError {
        match &mut err {
            DatasetError::AxisOrder { field, .. } | DatasetError::RankMismatch { field, .. } => {
                *field = name.to_string();
            }
            _ => {}
        }
        err
    }
}

/// Element-wise equality that treats NaN as equal to NaN.
fn slices_equal(a: &ndarray::ArrayViewD<f32>, b: &ndarray::ArrayViewD<f32>) -> bool {
    a.shape() == b.shape()
        && a
            .iter()
            .zip(b.iter())
            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}
