//! Saving and re-loading canonical datasets.
//!
//! Layout: one dimension per canonical axis (`batch`, `time`, `level`, `lat`,
//! `lon`), coordinate variables for all but `batch`, `time` stored as
//! integer seconds from the dataset's `reference_time` global attribute.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use grid_dataset::{Axis, Coordinates, Dataset, Field};
use ndarray::{ArrayD, IxDyn};
use tracing::info;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{dim_lens, dim_names, get_string_attr, is_coordinate, open_file, require_variable};

const REFERENCE_TIME_ATTR: &str = "reference_time";

/// Write `ds` to a new NetCDF-4 file at `path`, replacing any existing file.
pub fn write_dataset(ds: &Dataset, path: &Path) -> NetCdfResult<()> {
    let coords = ds.coords();
    let mut file = netcdf::create(path)?;

    file.add_dimension(Axis::Batch.name(), coords.batch)?;
    file.add_dimension(Axis::Time.name(), coords.time.len())?;
    if let Some(levels) = &coords.level {
        file.add_dimension(Axis::Level.name(), levels.len())?;
    }
    file.add_dimension(Axis::Lat.name(), coords.lat.len())?;
    file.add_dimension(Axis::Lon.name(), coords.lon.len())?;

    if let Some(reference) = ds.reference_time {
        file.add_attribute(REFERENCE_TIME_ATTR, reference.to_rfc3339())?;
    }

    {
        let seconds: Vec<i64> = coords.time.iter().map(|d| d.num_seconds()).collect();
        let mut var = file.add_variable::<i64>(Axis::Time.name(), &[Axis::Time.name()])?;
        var.put_attribute("units", "seconds")?;
        var.put_values(&seconds, ..)?;
    }
    if let Some(levels) = &coords.level {
        let mut var = file.add_variable::<i32>(Axis::Level.name(), &[Axis::Level.name()])?;
        var.put_attribute("units", "hPa")?;
        var.put_values(levels, ..)?;
    }
    {
        let mut var = file.add_variable::<f32>(Axis::Lat.name(), &[Axis::Lat.name()])?;
        var.put_attribute("units", "degrees_north")?;
        var.put_values(&coords.lat, ..)?;
    }
    {
        let mut var = file.add_variable::<f32>(Axis::Lon.name(), &[Axis::Lon.name()])?;
        var.put_attribute("units", "degrees_east")?;
        var.put_values(&coords.lon, ..)?;
    }

    for (name, field) in ds.fields() {
        let dims: Vec<&str> = field.axes().iter().map(Axis::name).collect();
        let mut var = file.add_variable::<f32>(name, &dims)?;
        for (key, value) in &field.attrs {
            var.put_attribute(key, value.as_str())?;
        }
        let data = field.data().as_standard_layout();
        let values = data
            .as_slice()
            .ok_or_else(|| NetCdfError::InvalidFormat(format!("{}: non-contiguous data", name)))?;
        var.put_values(values, ..)?;
    }

    info!(
        path = %path.display(),
        fields = ds.len(),
        steps = coords.time.len(),
        "Wrote dataset"
    );
    Ok(())
}

/// Load a dataset written by [`write_dataset`].
pub fn read_dataset(path: &Path) -> NetCdfResult<Dataset> {
    let file = open_file(path)?;

    let time = require_variable(&file, Axis::Time.name())?
        .get_values::<i64, _>(..)?
        .into_iter()
        .map(Duration::seconds)
        .collect();
    let level = match file.variable(Axis::Level.name()) {
        Some(var) => Some(var.get_values::<i32, _>(..)?),
        None => None,
    };
    let lat = require_variable(&file, Axis::Lat.name())?.get_values::<f32, _>(..)?;
    let lon = require_variable(&file, Axis::Lon.name())?.get_values::<f32, _>(..)?;

    let mut coords = Coordinates::new(time, level, lat, lon);
    if let Some(batch) = file.dimension(Axis::Batch.name()) {
        coords.batch = batch.len();
    }
    let mut ds = Dataset::new(coords);

    if let Some(attr) = file.attribute(REFERENCE_TIME_ATTR) {
        let text = String::try_from(attr.value()?)?;
        let reference = DateTime::parse_from_rfc3339(&text)
            .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", REFERENCE_TIME_ATTR, e)))?
            .with_timezone(&Utc);
        ds = ds.with_reference_time(reference);
    }

    for var in file.variables() {
        if is_coordinate(&var) {
            continue;
        }
        let name = var.name();
        let axes = dim_names(&var)
            .iter()
            .map(|d| Axis::from_name(d))
            .collect::<grid_dataset::Result<Vec<_>>>()
            .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", name, e)))?;
        let data = ArrayD::from_shape_vec(IxDyn(&dim_lens(&var)), var.get_values::<f32, _>(..)?)
            .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", name, e)))?;

        let mut field = Field::new(axes, data)
            .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", name, e)))?;
        if let Some(units) = get_string_attr(&var, "units") {
            field = field.with_attr("units", units);
        }
        ds.insert(name.as_str(), field)
            .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", name, e)))?;
    }

    info!(path = %path.display(), fields = ds.len(), "Read dataset");
    Ok(ds)
}
