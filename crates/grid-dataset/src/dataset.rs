//! The dataset container and its structural operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{DatasetError, Result};
use crate::schema::CanonicalSchema;
use crate::types::{Axis, Coordinates, Field};

/// Ordered mapping from field name to [`Field`], plus shared coordinates.
///
/// Datasets are built once per stage and handed on; transformations consume
/// `self` or operate on an owned copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    fields: BTreeMap<String, Field>,
    coords: Coordinates,
    /// Initialization instant the `time` offsets are relative to.
    pub reference_time: Option<DateTime<Utc>>,
}

impl Dataset {
    /// Create an empty dataset over the given coordinates.
    pub fn new(coords: Coordinates) -> Self {
        Self {
            fields: BTreeMap::new(),
            coords,
            reference_time: None,
        }
    }

    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn coords(&self) -> &Coordinates {
        &self.coords
    }

    /// Insert or replace a field, checking its extents against the coordinates.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) -> Result<()> {
        let name = name.into();
        let expected = self.coords.shape_for(&name, field.axes())?;
        for ((axis, &want), &got) in field.axes().iter().zip(&expected).zip(field.shape()) {
            if want != got {
                return Err(DatasetError::AxisLength {
                    field: name,
                    axis: axis.name().to_string(),
                    expected: want,
                    actual: got,
                });
            }
        }
        self.fields.insert(name, field);
        Ok(())
    }

    /// Build a field from axes and data and insert it.
    pub fn insert_array(
        &mut self,
        name: impl Into<String>,
        axes: Vec<Axis>,
        data: ndarray::ArrayD<f32>,
    ) -> Result<()> {
        let name = name.into();
        let field = Field::new(axes, data).map_err(|e| Field::named(e, &name))?;
        self.insert(name, field)
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Field by name, or [`DatasetError::MissingField`].
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.fields
            .get(name)
            .ok_or_else(|| DatasetError::MissingField(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Option<Field> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Axis sizes of the dataset, keyed by axis.
    pub fn sizes(&self) -> BTreeMap<Axis, usize> {
        Axis::CANONICAL
            .iter()
            .filter_map(|&axis| self.coords.len_of(axis).map(|n| (axis, n)))
            .collect()
    }

    /// Replace the named field with its collapsed first batch/time slice.
    pub fn collapse_static(&mut self, name: &str) -> Result<()> {
        let collapsed = self.field(name)?.collapse_static(name)?;
        self.fields.insert(name.to_string(), collapsed);
        Ok(())
    }

    /// Sort the `lat` or `level` axis ascending, permuting every field that
    /// spans it. Other axes are rejected.
    pub fn sort_ascending(&mut self, axis: Axis) -> Result<()> {
        let order = match axis {
            Axis::Lat => ascending_order(&self.coords.lat, |a, b| a.total_cmp(b)),
            Axis::Level => match &self.coords.level {
                Some(level) => ascending_order(level, |a, b| a.cmp(b)),
                None => return Ok(()),
            },
            Axis::Lon => ascending_order(&self.coords.lon, |a, b| a.total_cmp(b)),
            other => {
                return Err(DatasetError::invalid_coordinate(
                    other.name(),
                    "axis cannot be sorted",
                ))
            }
        };

        let Some(order) = order else {
            return Ok(());
        };

        debug!(axis = %axis, len = order.len(), "Reordering axis ascending");

        match axis {
            Axis::Lat => self.coords.lat = permute(&self.coords.lat, &order),
            Axis::Lon => self.coords.lon = permute(&self.coords.lon, &order),
            Axis::Level => {
                if let Some(level) = self.coords.level.take() {
                    self.coords.level = Some(permute(&level, &order));
                }
            }
            _ => {}
        }

        self.fields
            .par_iter_mut()
            .for_each(|(_, field)| field.reorder(axis, &order));

        Ok(())
    }

    /// Copy with every field filled with NaN.
    pub fn nan_filled(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.nan_filled()))
                .collect(),
            coords: self.coords.clone(),
            reference_time: self.reference_time,
        }
    }

    /// Check the dataset against a schema.
    pub fn validate(&self, schema: &CanonicalSchema) -> Result<()> {
        schema.check(self)
    }

    /// Check that `other` carries the same `lat`/`lon`/`level`/`time`
    /// coordinates as this dataset.
    pub fn check_same_coords(&self, other: &Dataset) -> Result<()> {
        let ours = &self.coords;
        let theirs = &other.coords;
        if ours.time != theirs.time {
            return Err(DatasetError::invalid_coordinate(
                "time",
                format!("{} offsets vs {}", ours.time.len(), theirs.time.len()),
            ));
        }
        if ours.level != theirs.level {
            return Err(DatasetError::invalid_coordinate("level", "levels differ"));
        }
        if !forecast_common::coords_match(&ours.lat, &theirs.lat) {
            return Err(DatasetError::invalid_coordinate("lat", "latitudes differ"));
        }
        if !forecast_common::coords_match(&ours.lon, &theirs.lon) {
            return Err(DatasetError::invalid_coordinate("lon", "longitudes differ"));
        }
        Ok(())
    }
}

/// Permutation that sorts `values` ascending, or `None` if already sorted.
/// Permutation that sorts `values` ascending, or `None` if already sorted.
pub fn ascending_order<T, F>(values: &[T], cmp: F) -> Option<Vec<usize>>
where
    F: Fn(&T, &T) -> std::cmp::Ordering,
{
    if values
        .windows(2)
        .all(|w| cmp(&w[0], &w[1]) != std::cmp::Ordering::Greater)
    {
        return None;
    }
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| cmp(&values[a], &values[b]));
    Some(order)
}

fn permute<T: Copy>(values: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| values[i]).collect()
}
