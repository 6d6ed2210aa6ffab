//! Provider-to-canonical rename tables.
//!
//! The provider delivers short variable codes (`t2m`, `u10`, ...) and its own
//! axis names (`valid_time`, `latitude`, ...). Every name the fuser accepts is
//! listed here; anything else is a schema mismatch.

use forecast_common::{PipelineError, PipelineResult, Stage};
use grid_dataset::Axis;

use crate::source::SourceKind;

/// Short codes in the single-level downloads (instantaneous and accumulated).
const SINGLE_LEVEL_RENAMES: &[(&str, &str)] = &[
    ("u10", "10m_u_component_of_wind"),
    ("v10", "10m_v_component_of_wind"),
    ("t2m", "2m_temperature"),
    ("z", "geopotential_at_surface"),
    ("lsm", "land_sea_mask"),
    ("msl", "mean_sea_level_pressure"),
    ("tp", "total_precipitation_6hr"),
];

/// Short codes in the pressure-level download.
const PRESSURE_LEVEL_RENAMES: &[(&str, &str)] = &[
    ("z", "geopotential"),
    ("q", "specific_humidity"),
    ("t", "temperature"),
    ("u", "u_component_of_wind"),
    ("v", "v_component_of_wind"),
    ("w", "vertical_velocity"),
];

/// Provider axis names, current and legacy.
const AXIS_RENAMES: &[(&str, Axis)] = &[
    ("valid_time", Axis::Time),
    ("time", Axis::Time),
    ("pressure_level", Axis::Level),
    ("level", Axis::Level),
    ("isobaricInhPa", Axis::Level),
    ("latitude", Axis::Lat),
    ("lat", Axis::Lat),
    ("longitude", Axis::Lon),
    ("lon", Axis::Lon),
];

fn renames(kind: SourceKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        SourceKind::SingleInstant | SourceKind::SingleAccum => SINGLE_LEVEL_RENAMES,
        SourceKind::PressureLevels => PRESSURE_LEVEL_RENAMES,
    }
}

/// Canonical name of a provider variable, if the table knows it.
pub fn canonical_variable(kind: SourceKind, code: &str) -> Option<&'static str> {
    renames(kind)
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| *to)
}

/// Canonical axis for a provider axis name.
pub fn canonical_axis(name: &str) -> Option<Axis> {
    AXIS_RENAMES
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, axis)| *axis)
}

/// Like [`canonical_variable`], failing with a schema mismatch on a miss.
pub fn rename_variable(kind: SourceKind, code: &str) -> PipelineResult<&'static str> {
    canonical_variable(kind, code).ok_or_else(|| {
        PipelineError::schema(
            Stage::Fuse,
            code,
            format!("no canonical name for {} variable", kind),
        )
    })
}

/// Like [`canonical_axis`], failing with a schema mismatch on a miss.
pub fn rename_axis(name: &str) -> PipelineResult<Axis> {
    canonical_axis(name)
        .ok_or_else(|| PipelineError::schema(Stage::Fuse, name, "no canonical axis for this name"))
}

/// Long variable names used when requesting each source from the provider.
pub fn request_variables(kind: SourceKind) -> &'static [&'static str] {
    match kind {
        SourceKind::SingleInstant => &[
            "10m_u_component_of_wind",
            "10m_v_component_of_wind",
            "2m_temperature",
            "geopotential",
            "land_sea_mask",
            "mean_sea_level_pressure",
        ],
        SourceKind::SingleAccum => &["total_precipitation"],
        SourceKind::PressureLevels => &[
            "geopotential",
            "specific_humidity",
            "temperature",
            "u_component_of_wind",
            "v_component_of_wind",
            "vertical_velocity",
        ],
    }
}
