//! The canonical schema the model consumes.
//!
//! Field names, the axes each field spans, the pressure-level set and the
//! horizontal grid are fixed here; [`CanonicalSchema::check`] enforces them.

use std::collections::BTreeMap;

use forecast_common::{LatLonGrid, PRESSURE_LEVELS_37};

use crate::dataset::Dataset;
use crate::error::{DatasetError, Result};
use crate::types::{axis_names, Axis};

/// 2-D fields predicted by the model.
pub const SURFACE_VARS: [&str; 5] = [
    "2m_temperature",
    "mean_sea_level_pressure",
    "10m_v_component_of_wind",
    "10m_u_component_of_wind",
    "total_precipitation_6hr",
];

/// 3-D fields predicted by the model.
pub const ATMOSPHERIC_VARS: [&str; 6] = [
    "temperature",
    "geopotential",
    "u_component_of_wind",
    "v_component_of_wind",
    "vertical_velocity",
    "specific_humidity",
];

/// Externally supplied forcing fields.
pub const FORCING_VARS: [&str; 5] = [
    "toa_incident_solar_radiation",
    "year_progress_sin",
    "year_progress_cos",
    "day_progress_sin",
    "day_progress_cos",
];

/// Fields without batch/time variation.
pub const STATIC_VARS: [&str; 2] = ["geopotential_at_surface", "land_sea_mask"];

/// Axes spanned by a known canonical field.
pub fn axes_for(name: &str) -> Option<Vec<Axis>> {
    if SURFACE_VARS.contains(&name) || name == "toa_incident_solar_radiation" {
        Some(Axis::surface())
    } else if ATMOSPHERIC_VARS.contains(&name) {
        Some(Axis::atmospheric())
    } else if STATIC_VARS.contains(&name) {
        Some(Axis::static_2d())
    } else if name.starts_with("year_progress_") {
        Some(vec![Axis::Batch, Axis::Time])
    } else if name.starts_with("day_progress_") {
        Some(vec![Axis::Batch, Axis::Time, Axis::Lon])
    } else {
        None
    }
}

/// Fixed field-to-axes map plus coordinate domains.
#[derive(Debug, Clone)]
pub struct CanonicalSchema {
    fields: BTreeMap<String, Vec<Axis>>,
    levels: Vec<i32>,
    grid: Option<LatLonGrid>,
}

impl CanonicalSchema {
    /// Build a schema from canonical field names.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>, grid: Option<LatLonGrid>) -> Self {
        let fields = names
            .into_iter()
            .filter_map(|name| axes_for(name).map(|axes| (name.to_string(), axes)))
            .collect();
        Self {
            fields,
            levels: PRESSURE_LEVELS_37.to_vec(),
            grid,
        }
    }

    /// Full Model-Input Dataset: predicted fields, forcings and statics.
    pub fn model_inputs(grid: Option<LatLonGrid>) -> Self {
        let names = SURFACE_VARS
            .iter()
            .chain(ATMOSPHERIC_VARS.iter())
            .chain(FORCING_VARS.iter())
            .chain(STATIC_VARS.iter())
            .copied();
        Self::from_names(names, grid)
    }

    /// Target template: predicted fields only.
    pub fn targets(grid: Option<LatLonGrid>) -> Self {
        let names = SURFACE_VARS.iter().chain(ATMOSPHERIC_VARS.iter()).copied();
        Self::from_names(names, grid)
    }

    /// Forcing template: the five forcing fields.
    pub fn forcings(grid: Option<LatLonGrid>) -> Self {
        Self::from_names(FORCING_VARS.iter().copied(), grid)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn axes(&self, name: &str) -> Option<&[Axis]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Check field set, field axes and coordinate domains.
    pub fn check(&self, ds: &Dataset) -> Result<()> {
        for name in ds.names() {
            if !self.fields.contains_key(name) {
                return Err(DatasetError::UnexpectedField(name.to_string()));
            }
        }

        let mut spans_level = false;
        for (name, axes) in &self.fields {
            let field = ds.field(name)?;
            if field.axes() != axes.as_slice() {
                return Err(DatasetError::SchemaAxes {
                    field: name.clone(),
                    expected: axis_names(axes),
                    actual: axis_names(field.axes()),
                });
            }
            spans_level |= field.spans(Axis::Level);
        }

        let coords = ds.coords();
        if coords.batch != 1 {
            return Err(DatasetError::invalid_coordinate(
                "batch",
                format!("size {} (expected 1)", coords.batch),
            ));
        }

        if !coords.time.windows(2).all(|w| w[0] < w[1]) {
            return Err(DatasetError::invalid_coordinate("time", "not strictly ascending"));
        }

        check_lat(&coords.lat)?;
        check_lon(&coords.lon)?;

        if spans_level {
            match &coords.level {
                Some(level) if *level == self.levels => {}
                Some(level) => {
                    return Err(DatasetError::invalid_coordinate(
                        "level",
                        format!("{} levels do not match the {}-level set", level.len(), self.levels.len()),
                    ))
                }
                None => {
                    return Err(DatasetError::invalid_coordinate("level", "missing"));
                }
            }
        }

        if let Some(grid) = &self.grid {
            if !grid.matches(&coords.lat, &coords.lon) {
                return Err(DatasetError::invalid_coordinate(
                    "lat/lon",
                    format!(
                        "{}x{} does not match the {}x{} grid",
                        coords.lat.len(),
                        coords.lon.len(),
                        grid.nlat,
                        grid.nlon
                    ),
                ));
            }
        }

        Ok(())
    }
}

fn check_lat(lat: &[f32]) -> Result<()> {
    if !lat.windows(2).all(|w| w[0] < w[1]) {
        return Err(DatasetError::invalid_coordinate("lat", "not strictly ascending"));
    }
    if lat.iter().any(|v| !(-90.0..=90.0).contains(v)) {
        return Err(DatasetError::invalid_coordinate("lat", "outside [-90, 90]"));
    }
    Ok(())
}

fn check_lon(lon: &[f32]) -> Result<()> {
    if !lon.windows(2).all(|w| w[0] < w[1]) {
        return Err(DatasetError::invalid_coordinate("lon", "not strictly ascending"));
    }
    if lon.iter().any(|v| !(0.0..360.0).contains(v)) {
        return Err(DatasetError::invalid_coordinate("lon", "outside [0, 360)"));
    }
    Ok(())
}
