//! Synthetic provider downloads for fusion tests.
//!
//! Every source uses the coarse 5x8 grid in the provider's layout: latitude
//! descending and pressure levels in request order. Values are index-coded
//! so tests can follow them through renaming, windowing and sorting.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use forcings::SolarForcingTable;
use forecast_common::LatLonGrid;
use fusion::{FusionConfig, PipelineContext, RawCoord, RawDataset, RawSources, SourceKind};
use ndarray::{ArrayD, IxDyn};
use test_utils::fixtures::grid::COARSE_5X8;
use test_utils::fixtures::levels::REQUEST_ORDER;
use test_utils::fixtures::time::{ACCUM_HOURS, INSTANTS, REFERENCE_DAY};
use test_utils::{calendar_coded_series, hour_valued_series, hourly_range, hourly_times, index_coded, parse_times};

pub const NLAT: usize = COARSE_5X8.nlat;
pub const NLON: usize = COARSE_5X8.nlon;
pub const NLEVEL: usize = REQUEST_ORDER.len();

pub fn grid() -> LatLonGrid {
    LatLonGrid::new(NLAT, NLON)
}

pub fn instants() -> Vec<DateTime<Utc>> {
    parse_times(&INSTANTS)
}

pub fn accum_times() -> Vec<DateTime<Utc>> {
    hourly_times(REFERENCE_DAY, ACCUM_HOURS)
}

/// Time-invariant values `row * 10 + col` repeated over `ntime` steps.
pub fn static_values(ntime: usize) -> ArrayD<f32> {
    ArrayD::from_shape_fn(IxDyn(&[ntime, NLAT, NLON]), |idx| {
        (idx[1] * 10 + idx[2]) as f32
    })
}

fn with_grid(kind: SourceKind) -> RawDataset {
    RawDataset::new(kind)
        .with_coord("latitude", COARSE_5X8.lat_descending())
        .with_coord("longitude", COARSE_5X8.lon())
}

/// Instantaneous single-level source, including the `number` metadata
/// variable the provider attaches.
pub fn instant_source(times: &[DateTime<Utc>]) -> RawDataset {
    let nt = times.len();
    let dims = ["valid_time", "latitude", "longitude"];
    let mut ds = with_grid(SourceKind::SingleInstant).with_time("valid_time", times.to_vec());
    for code in ["u10", "v10", "t2m", "msl"] {
        ds = ds
            .with_variable(code, &dims, index_coded(&[nt, NLAT, NLON]))
            .unwrap();
    }
    for code in ["z", "lsm"] {
        ds = ds.with_variable(code, &dims, static_values(nt)).unwrap();
    }
    ds.with_variable("number", &[], ArrayD::zeros(IxDyn(&[])))
        .unwrap()
}

/// Hourly accumulated precipitation whose every value is its hour, plus the
/// `expver` metadata variable.
pub fn accum_source(times: &[DateTime<Utc>]) -> RawDataset {
    let tp = hour_valued_series(times, NLAT, NLON).into_dyn();
    with_grid(SourceKind::SingleAccum)
        .with_time("valid_time", times.to_vec())
        .with_variable("tp", &["valid_time", "latitude", "longitude"], tp)
        .unwrap()
        .with_variable("expver", &["valid_time"], ArrayD::ones(IxDyn(&[times.len()])))
        .unwrap()
}

pub fn pressure_source(times: &[DateTime<Utc>]) -> RawDataset {
    let nt = times.len();
    let levels = REQUEST_ORDER.iter().map(|&l| l as f64).collect();
    let dims = ["valid_time", "pressure_level", "latitude", "longitude"];
    let mut ds = with_grid(SourceKind::PressureLevels)
        .with_time("valid_time", times.to_vec())
        .with_coord("pressure_level", levels);
    for code in ["z", "q", "t", "u", "v", "w"] {
        ds = ds
            .with_variable(code, &dims, index_coded(&[nt, NLEVEL, NLAT, NLON]))
            .unwrap();
    }
    ds
}

/// The same download with its latitude axis delivered south to north.
pub fn with_ascending_lat(mut src: RawDataset) -> RawDataset {
    let lat = match src.coord("latitude") {
        Some(RawCoord::Values(values)) => values.iter().rev().copied().collect(),
        other => panic!("latitude coordinate expected, found {:?}", other),
    };
    src.set_coord("latitude", RawCoord::Values(lat));

    let names: Vec<String> = src.variable_names().map(String::from).collect();
    for name in names {
        let mut var = src.remove_variable(&name).unwrap();
        if let Some(axis) = var.dim_index("latitude") {
            var.data.invert_axis(ndarray::Axis(axis));
            var.data = var.data.as_standard_layout().into_owned();
        }
        src.insert(name, var).unwrap();
    }
    src
}

pub fn sources() -> RawSources {
    let instants = instants();
    RawSources {
        single_instant: instant_source(&instants),
        single_accum: accum_source(&accum_times()),
        pressure_levels: pressure_source(&instants),
    }
}

/// Hourly radiation table for July of `year`, valued by calendar code.
pub fn july_table(year: i32) -> SolarForcingTable {
    let times = hourly_range(&format!("{}-07-01", year), &format!("{}-07-31", year));
    let values = calendar_coded_series(&times, NLAT, NLON);
    let lat = COARSE_5X8.lat_descending().into_iter().map(|v| v as f32).collect();
    let lon = COARSE_5X8.lon().into_iter().map(|v| v as f32).collect();
    SolarForcingTable::new(times, lat, lon, values).unwrap()
}

pub fn context_with(config: FusionConfig) -> PipelineContext {
    PipelineContext::new(config, grid(), july_table(2023)).unwrap()
}

pub fn context() -> PipelineContext {
    context_with(FusionConfig::default())
}
