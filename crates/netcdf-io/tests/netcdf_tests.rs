//! Round-trips through real NetCDF-4 files in a temporary directory.

use std::path::Path;

use chrono::{DateTime, Utc};
use forcings::TOA_FIELD;
use forecast_common::LatLonGrid;
use fusion::{FusionConfig, PipelineContext, RawCoord, RawSources, SourceKind};
use ndarray::{Array4, ArrayD, IxDyn};
use netcdf_io::{
    read_archive_series, read_dataset, read_grid_series, read_raw_source, read_solar_table,
    write_dataset, NetCdfError, RADIATION_VAR,
};
use test_utils::fixtures::grid::{COARSE_5X8, ERA5_0P25};
use test_utils::fixtures::levels::REQUEST_ORDER;
use test_utils::fixtures::names::{ACCUM_VARS, INSTANT_VARS, PRESSURE_VARS};
use test_utils::fixtures::time::{ACCUM_HOURS, INSTANTS, REFERENCE_DAY};
use test_utils::{
    calendar_coded_series, hour_valued_series, hourly_range, hourly_times, index_coded,
    parse_times, require_download, temp_test_dir,
};

const NLAT: usize = COARSE_5X8.nlat;
const NLON: usize = COARSE_5X8.nlon;

/// Write a file in the provider's layout: `valid_time` in unix seconds,
/// latitude descending, pressure levels in request order.
fn write_provider(
    path: &Path,
    times: &[DateTime<Utc>],
    levels: bool,
    variables: &[(&str, ArrayD<f32>)],
) {
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension("valid_time", times.len()).unwrap();
    if levels {
        file.add_dimension("pressure_level", REQUEST_ORDER.len()).unwrap();
    }
    file.add_dimension("latitude", NLAT).unwrap();
    file.add_dimension("longitude", NLON).unwrap();

    {
        let seconds: Vec<i64> = times.iter().map(|t| t.timestamp()).collect();
        let mut var = file.add_variable::<i64>("valid_time", &["valid_time"]).unwrap();
        var.put_attribute("units", "seconds since 1970-01-01").unwrap();
        var.put_values(&seconds, ..).unwrap();
    }
    if levels {
        let values: Vec<f64> = REQUEST_ORDER.iter().map(|&l| l as f64).collect();
        let mut var = file
            .add_variable::<f64>("pressure_level", &["pressure_level"])
            .unwrap();
        var.put_values(&values, ..).unwrap();
    }
    for (name, values) in [
        ("latitude", COARSE_5X8.lat_descending()),
        ("longitude", COARSE_5X8.lon()),
    ] {
        let mut var = file.add_variable::<f64>(name, &[name]).unwrap();
        var.put_values(&values, ..).unwrap();
    }

    for (name, data) in variables {
        let dims: &[&str] = if data.ndim() == 4 {
            &["valid_time", "pressure_level", "latitude", "longitude"]
        } else {
            &["valid_time", "latitude", "longitude"]
        };
        let mut var = file.add_variable::<f32>(name, dims).unwrap();
        var.put_attribute("units", "1").unwrap();
        var.put_values(data.as_slice().unwrap(), ..).unwrap();
    }
}

fn static_values(nt: usize) -> ArrayD<f32> {
    ArrayD::from_shape_fn(IxDyn(&[nt, NLAT, NLON]), |idx| (idx[1] * 10 + idx[2]) as f32)
}

/// The three provider downloads and the radiation table for the reference day.
fn write_downloads(dir: &Path) {
    let instants = parse_times(&INSTANTS);
    let nt = instants.len();

    let single: Vec<(&str, ArrayD<f32>)> = INSTANT_VARS
        .iter()
        .map(|&code| match code {
            "z" | "lsm" => (code, static_values(nt)),
            _ => (code, index_coded(&[nt, NLAT, NLON])),
        })
        .collect();
    write_provider(&dir.join("single-instant.nc"), &instants, false, &single);

    let accum_times = hourly_times(REFERENCE_DAY, ACCUM_HOURS);
    let tp = hour_valued_series(&accum_times, NLAT, NLON).into_dyn();
    write_provider(&dir.join("single-accum.nc"), &accum_times, false, &[(ACCUM_VARS[0], tp)]);

    let pressure: Vec<(&str, ArrayD<f32>)> = PRESSURE_VARS
        .iter()
        .map(|&code| (code, index_coded(&[nt, REQUEST_ORDER.len(), NLAT, NLON])))
        .collect();
    write_provider(&dir.join("pressure-level.nc"), &instants, true, &pressure);

    let table_times = hourly_range("2023-07-01", "2023-07-31");
    let toa = calendar_coded_series(&table_times, NLAT, NLON).into_dyn();
    write_provider(&dir.join("toa.nc"), &table_times, false, &[(RADIATION_VAR, toa)]);
}

#[test]
fn test_read_raw_source_decodes_coordinates() {
    let dir = temp_test_dir();
    write_downloads(dir.path());

    let raw = read_raw_source(&dir.path().join("single-instant.nc"), SourceKind::SingleInstant)
        .unwrap();
    assert_eq!(raw.time_coord().unwrap().1, parse_times(&INSTANTS).as_slice());
    assert_eq!(
        raw.coord("latitude"),
        Some(&RawCoord::Values(COARSE_5X8.lat_descending()))
    );
    let t2m = raw.variable("t2m").unwrap();
    assert_eq!(t2m.dims, vec!["valid_time", "latitude", "longitude"]);
    assert_eq!(t2m.data[[1, 2, 3]], 10203.0);
    assert_eq!(t2m.attrs.get("units").map(String::as_str), Some("1"));
}

#[test]
fn test_packed_values_unpacked() {
    let dir = temp_test_dir();
    let path = dir.path().join("packed.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("valid_time", 3).unwrap();
        {
            let mut var = file.add_variable::<i64>("valid_time", &["valid_time"]).unwrap();
            var.put_attribute("units", "hours since 1900-01-01 00:00:00.0").unwrap();
            var.put_values(&[0_i64, 1, 2], ..).unwrap();
        }
        let mut var = file.add_variable::<i16>("tp", &["valid_time"]).unwrap();
        var.put_attribute("scale_factor", 0.5_f64).unwrap();
        var.put_attribute("add_offset", 100.0_f64).unwrap();
        var.put_attribute("_FillValue", -32767_i16).unwrap();
        var.put_values(&[0_i16, 1, -32767], ..).unwrap();
    }

    let raw = read_raw_source(&path, SourceKind::SingleAccum).unwrap();
    let tp = &raw.variable("tp").unwrap().data;
    assert_eq!(tp[[0]], 100.0);
    assert_eq!(tp[[1]], 100.5);
    assert!(tp[[2]].is_nan());
}

#[test]
fn test_solar_table_flipped_to_ascending() {
    let dir = temp_test_dir();
    write_downloads(dir.path());

    let table = read_solar_table(&dir.path().join("toa.nc"), RADIATION_VAR).unwrap();
    assert_eq!(table.lat().first(), Some(&-90.0));
    assert_eq!(table.len(), 31 * 24);

    let series = read_grid_series(&dir.path().join("toa.nc"), RADIATION_VAR).unwrap();
    assert_eq!(series.lat.first(), Some(&90.0));
    assert_eq!(series.values.shape(), &[31 * 24, NLAT, NLON]);
}

#[test]
fn test_fuse_and_round_trip() {
    let dir = temp_test_dir();
    write_downloads(dir.path());

    let load = |name: &str, kind| read_raw_source(&dir.path().join(name), kind).unwrap();
    let sources = RawSources {
        single_instant: load("single-instant.nc", SourceKind::SingleInstant),
        single_accum: load("single-accum.nc", SourceKind::SingleAccum),
        pressure_levels: load("pressure-level.nc", SourceKind::PressureLevels),
    };
    let table = read_solar_table(&dir.path().join("toa.nc"), RADIATION_VAR).unwrap();
    let ctx = PipelineContext::new(FusionConfig::default(), LatLonGrid::new(NLAT, NLON), table)
        .unwrap();
    let inputs = ctx.fuser().fuse(sources).unwrap();

    let out = dir.path().join("inputs.nc");
    write_dataset(&inputs, &out).unwrap();
    let back = read_dataset(&out).unwrap();

    assert_eq!(back.coords(), inputs.coords());
    assert_eq!(back.reference_time, inputs.reference_time);
    assert_eq!(back.len(), inputs.len());
    assert_eq!(back.field(TOA_FIELD).unwrap(), inputs.field(TOA_FIELD).unwrap());
    assert_eq!(back, inputs);
}

#[test]
fn test_archive_channel_selection() {
    let dir = temp_test_dir();
    let path = dir.path().join("archive.nc");
    let data = Array4::from_shape_fn((4, 3, NLAT, NLON), |(t, c, _, _)| (t * 10 + c) as f32);
    {
        let mut file = netcdf::create(&path).unwrap();
        for (name, len) in [("t", 4), ("c", 3), ("h", NLAT), ("w", NLON)] {
            file.add_dimension(name, len).unwrap();
        }
        let mut var = file.add_variable::<f32>("forecast", &["t", "c", "h", "w"]).unwrap();
        var.put_values(data.as_slice().unwrap(), ..).unwrap();
    }

    let series = read_archive_series(&path, "forecast", 2).unwrap();
    assert_eq!(series.shape(), &[4, NLAT, NLON]);
    assert_eq!(series[[3, 0, 0]], 32.0);
    assert!(read_archive_series(&path, "forecast", 3).is_err());
}

#[test]
fn test_missing_file() {
    let err = read_raw_source(Path::new("/nonexistent/single.nc"), SourceKind::SingleInstant)
        .unwrap_err();
    assert!(matches!(err, NetCdfError::FileNotFound(_)));
}

#[test]
fn test_real_radiation_table() {
    let path = require_download!("toa.nc");
    let table = read_solar_table(&path, RADIATION_VAR).unwrap();
    assert_eq!(table.lat().len(), ERA5_0P25.nlat);
    assert_eq!(table.lon().len(), ERA5_0P25.nlon);
    assert!(LatLonGrid::global(0.25).matches(table.lat(), table.lon()));
    assert_eq!(table.len() % 24, 0);
}

#[test]
fn test_real_downloads_share_instants() {
    let paths = require_download!("single-instant.nc", "single-accum.nc", "pressure-level.nc");
    let kinds = [SourceKind::SingleInstant, SourceKind::SingleAccum, SourceKind::PressureLevels];
    let raw: Vec<_> = paths
        .iter()
        .zip(kinds)
        .map(|(path, kind)| read_raw_source(path, kind).unwrap())
        .collect();

    let instants = raw[0].time_coord().unwrap().1.to_vec();
    assert!(raw[0].variable("t2m").is_some());
    assert_eq!(raw[2].time_coord().unwrap().1, &instants[..]);
    // Accumulated samples are hourly and end at the last instant.
    assert_eq!(raw[1].time_coord().unwrap().1.last(), instants.last());
}
