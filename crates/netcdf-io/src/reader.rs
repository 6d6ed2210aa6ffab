//! Loading raw sources, the radiation table and comparison series.

use std::path::Path;

use chrono::{DateTime, Utc};
use forcings::SolarForcingTable;
use fusion::tables::canonical_axis;
use fusion::{RawCoord, RawDataset, RawVariable, SourceKind};
use grid_dataset::Axis;
use ndarray::{Array3, ArrayD, Axis as NdAxis, IxDyn};
use tracing::{debug, info};

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{
    descriptive_attrs, dim_lens, dim_names, get_string_attr, is_coordinate, is_numeric,
    open_file, read_as_f64, read_unpacked, require_variable,
};
use crate::units::TimeUnits;

/// Time units of a coordinate variable, if it is a time axis.
fn time_units(var: &netcdf::Variable) -> NetCdfResult<Option<TimeUnits>> {
    match get_string_attr(var, "units") {
        Some(units) if units.contains(" since ") => TimeUnits::parse(&units).map(Some),
        _ => Ok(None),
    }
}

fn read_coord(var: &netcdf::Variable) -> NetCdfResult<RawCoord> {
    let values = read_as_f64(var)?;
    Ok(match time_units(var)? {
        Some(units) => RawCoord::Time(units.to_datetimes(&values)?),
        None => RawCoord::Values(values),
    })
}

fn to_array(name: &str, shape: &[usize], data: Vec<f32>) -> NetCdfResult<ArrayD<f32>> {
    ArrayD::from_shape_vec(IxDyn(shape), data)
        .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", name, e)))
}

/// Load one provider download as a [`RawDataset`].
///
/// Coordinate variables become coordinates (CF time units are decoded);
/// every other numeric variable is unpacked to `f32`. Non-numeric variables
/// (e.g. string `expver`) are skipped.
pub fn read_raw_source(path: &Path, kind: SourceKind) -> NetCdfResult<RawDataset> {
    let file = open_file(path)?;
    let mut ds = RawDataset::new(kind);

    for var in file.variables().filter(is_coordinate) {
        ds.set_coord(var.name(), read_coord(&var)?);
    }

    let mut skipped = 0usize;
    for var in file.variables() {
        if is_coordinate(&var) {
            continue;
        }
        let name = var.name();
        if !is_numeric(&var) {
            debug!(variable = %name, "Skipping non-numeric variable");
            skipped += 1;
            continue;
        }
        let data = to_array(&name, &dim_lens(&var), read_unpacked(&var)?)?;
        let mut raw = RawVariable::new(dim_names(&var), data);
        raw.attrs.extend(descriptive_attrs(&var));
        ds.insert(name, raw)?;
    }

    info!(
        path = %path.display(),
        source = %kind,
        variables = ds.variable_names().count(),
        skipped,
        "Loaded raw source"
    );
    Ok(ds)
}

/// A `(time, lat, lon)` series with its coordinates.
#[derive(Debug, Clone)]
pub struct GridSeries {
    pub times: Vec<DateTime<Utc>>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub values: Array3<f32>,
}

/// Read `var` as a `(time, lat, lon)` series, whatever order its
/// dimensions are stored in.
pub fn read_grid_series(path: &Path, var_name: &str) -> NetCdfResult<GridSeries> {
    let file = open_file(path)?;
    let var = require_variable(&file, var_name)?;

    let dims = dim_names(&var);
    let axes = dims
        .iter()
        .map(|d| {
            canonical_axis(d).ok_or_else(|| {
                NetCdfError::InvalidFormat(format!("{}: unknown dimension '{}'", var_name, d))
            })
        })
        .collect::<NetCdfResult<Vec<_>>>()?;
    if axes.len() != 3 {
        return Err(NetCdfError::InvalidFormat(format!(
            "{}: expected 3 dimensions, found {}",
            var_name,
            axes.len()
        )));
    }
    let position = |axis: Axis| {
        axes.iter().position(|&a| a == axis).ok_or_else(|| {
            NetCdfError::InvalidFormat(format!(
                "{}: expected (time, lat, lon) dimensions, found {:?}",
                var_name, dims
            ))
        })
    };
    let order = [position(Axis::Time)?, position(Axis::Lat)?, position(Axis::Lon)?];

    let data = to_array(var_name, &dim_lens(&var), read_unpacked(&var)?)?;
    let values = data
        .permuted_axes(IxDyn(&order))
        .as_standard_layout()
        .into_owned()
        .into_dimensionality()
        .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", var_name, e)))?;

    let coord = |idx: usize| -> NetCdfResult<RawCoord> {
        read_coord(&require_variable(&file, &dims[order[idx]])?)
    };
    let times = match coord(0)? {
        RawCoord::Time(times) => times,
        RawCoord::Values(_) => {
            return Err(NetCdfError::MissingData(format!(
                "time units on '{}'",
                dims[order[0]]
            )))
        }
    };
    let values_of = |c: RawCoord| match c {
        RawCoord::Values(v) => Ok(v),
        RawCoord::Time(_) => Err(NetCdfError::InvalidFormat(
            "spatial coordinate carries time units".to_string(),
        )),
    };
    let lat = values_of(coord(1)?)?;
    let lon = values_of(coord(2)?)?;

    debug!(
        path = %path.display(),
        variable = %var_name,
        steps = times.len(),
        "Read grid series"
    );
    Ok(GridSeries {
        times,
        lat,
        lon,
        values,
    })
}

/// Load the reference radiation table (`tisr` in provider downloads).
pub fn read_solar_table(path: &Path, var_name: &str) -> NetCdfResult<SolarForcingTable> {
    let series = read_grid_series(path, var_name)?;
    let lat = series.lat.iter().map(|&v| v as f32).collect();
    let lon = series.lon.iter().map(|&v| v as f32).collect();
    Ok(SolarForcingTable::new(series.times, lat, lon, series.values)?)
}

/// Read an array archive as a `(time, lat, lon)` series.
///
/// Archives are stored either as `(time, lat, lon)` or
/// `(time, channel, lat, lon)`; for the latter `channel` selects the slice.
pub fn read_archive_series(path: &Path, var_name: &str, channel: usize) -> NetCdfResult<Array3<f32>> {
    let file = open_file(path)?;
    let var = require_variable(&file, var_name)?;
    let shape = dim_lens(&var);
    let data = to_array(var_name, &shape, read_unpacked(&var)?)?;

    let series = match shape.len() {
        3 if channel == 0 => data,
        4 if channel < shape[1] => data.index_axis(NdAxis(1), channel).to_owned(),
        3 | 4 => {
            return Err(NetCdfError::InvalidFormat(format!(
                "{}: channel {} out of range for shape {:?}",
                var_name, channel, shape
            )))
        }
        n => {
            return Err(NetCdfError::InvalidFormat(format!(
                "{}: expected 3 or 4 dimensions, found {}",
                var_name, n
            )))
        }
    };

    info!(
        path = %path.display(),
        variable = %var_name,
        channel,
        shape = ?series.shape(),
        "Read archive series"
    );
    series
        .into_dimensionality()
        .map_err(|e| NetCdfError::InvalidFormat(format!("{}: {}", var_name, e)))
}
