//! End-to-end fusion of synthetic provider downloads.

mod common;

use chrono::Duration;
use common::*;
use forcings::{encode, TOA_FIELD};
use forecast_common::{ErrorKind, PipelineError, Stage, PRESSURE_LEVELS_37};
use fusion::{FusionConfig, PipelineContext, RawSources};
use grid_dataset::{Axis, CanonicalSchema};
use ndarray::{ArrayD, IxDyn};
use test_utils::{assert_all_approx_eq, calendar_code, hourly_times, parse_times};

fn fuse_default() -> grid_dataset::Dataset {
    let ctx = context();
    ctx.fuser().fuse(sources()).unwrap()
}

#[test]
fn test_fused_dataset_is_canonical() {
    let ds = fuse_default();
    ds.validate(&CanonicalSchema::model_inputs(Some(grid())))
        .unwrap();

    assert!(!ds.contains("number"));
    assert!(!ds.contains("expver"));
    assert_eq!(ds.len(), 5 + 6 + 5 + 2);
}

#[test]
fn test_time_offsets_relative_to_last_instant() {
    let ds = fuse_default();
    assert_eq!(
        ds.coords().time,
        vec![Duration::hours(-6), Duration::zero()]
    );
    assert_eq!(ds.reference_time, Some(instants()[1]));
}

#[test]
fn test_configured_init_time() {
    let config = FusionConfig {
        init_time: Some(instants()[0]),
        ..FusionConfig::default()
    };
    let ctx = context_with(config);
    let ds = ctx.fuser().fuse(sources()).unwrap();
    assert_eq!(ds.coords().time, vec![Duration::zero(), Duration::hours(6)]);
    assert_eq!(ds.reference_time, Some(instants()[0]));
}

#[test]
fn test_pressure_levels_with_ascending_latitude() {
    let expected = fuse_default();
    let mut raw = sources();
    raw.pressure_levels = with_ascending_lat(raw.pressure_levels);

    let ds = context().fuser().fuse(raw).unwrap();
    assert_eq!(ds.coords().lat, vec![-90.0, -45.0, 0.0, 45.0, 90.0]);
    assert_eq!(ds, expected);
}

#[test]
fn test_single_levels_with_ascending_latitude() {
    let expected = fuse_default();
    let mut raw = sources();
    raw.single_instant = with_ascending_lat(raw.single_instant);

    let ds = context().fuser().fuse(raw).unwrap();
    assert_eq!(ds, expected);
}

#[test]
fn test_accumulation_with_ascending_latitude() {
    let expected = fuse_default();
    let mut raw = sources();
    raw.single_accum = with_ascending_lat(raw.single_accum);

    let ds = context().fuser().fuse(raw).unwrap();
    assert_eq!(ds, expected);
}

#[test]
fn test_accumulation_on_another_grid() {
    let mut raw = sources();
    raw.single_accum
        .set_coord("latitude", fusion::RawCoord::Values(vec![80.0, 40.0, 0.0, -40.0, -80.0]));
    let err = context().fuser().fuse(raw).unwrap_err();
    assert!(matches!(err, PipelineError::CoordinateMismatch { .. }));
}

#[test]
fn test_axes_sorted_ascending() {
    let ds = fuse_default();
    let coords = ds.coords();
    assert_eq!(coords.lat, vec![-90.0, -45.0, 0.0, 45.0, 90.0]);
    assert_eq!(coords.level.as_deref(), Some(PRESSURE_LEVELS_37.as_slice()));
    assert!(coords.lon.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(coords.batch, 1);
}

#[test]
fn test_values_follow_latitude_flip() {
    let ds = fuse_default();
    let t2m = ds.field("2m_temperature").unwrap();
    assert_eq!(t2m.axes(), Axis::surface().as_slice());
    // Provider row 4 (-90) is now row 0; value = t * 10000 + row * 100 + col.
    assert_eq!(t2m.data()[[0, 1, 0, 3]], 10403.0);
    assert_eq!(t2m.data()[[0, 0, 4, 7]], 7.0);
}

#[test]
fn test_values_follow_level_sort() {
    let ds = fuse_default();
    let t = ds.field("temperature").unwrap();
    assert_eq!(t.shape(), &[1, 2, NLEVEL, NLAT, NLON]);
    // 1 hPa was requested last (index 36); 1000 hPa first.
    assert_eq!(t.data()[[0, 1, 0, 0, 0]], 1_360_400.0);
    assert_eq!(t.data()[[0, 0, NLEVEL - 1, NLAT - 1, 0]], 0.0);
}

#[test]
fn test_precipitation_windows() {
    let ds = fuse_default();
    let tp = ds.field("total_precipitation_6hr").unwrap();
    assert_eq!(tp.shape(), &[1, 2, NLAT, NLON]);
    // 7 + 8 + ... + 12 and 13 + 14 + ... + 18.
    assert!(tp.data().index_axis(ndarray::Axis(1), 0).iter().all(|&v| v == 57.0));
    assert!(tp.data().index_axis(ndarray::Axis(1), 1).iter().all(|&v| v == 93.0));
}

#[test]
fn test_calendar_features_attached() {
    let ds = fuse_default();
    let expected = encode(&instants());

    let year_sin = ds.field("year_progress_sin").unwrap();
    assert_eq!(year_sin.axes(), &[Axis::Batch, Axis::Time]);
    assert_eq!(year_sin.data().iter().copied().collect::<Vec<_>>(), expected.year_progress_sin);

    let day_cos = ds.field("day_progress_cos").unwrap();
    assert_eq!(day_cos.shape(), &[1, 2, NLON]);
    for lon in 0..NLON {
        assert_eq!(day_cos.data()[[0, 0, lon]], expected.day_progress_cos[0]);
        assert_eq!(day_cos.data()[[0, 1, lon]], expected.day_progress_cos[1]);
    }
    // Noon sits half-way round the day.
    assert_all_approx_eq!(vec![day_cos.data()[[0, 0, 0]]], vec![-1.0_f32], 1e-6);
}

#[test]
fn test_solar_forcing_from_other_year() {
    let ds = fuse_default();
    let toa = ds.field(TOA_FIELD).unwrap();
    assert_eq!(toa.shape(), &[1, 2, NLAT, NLON]);
    let codes: Vec<f32> = instants().iter().map(calendar_code).collect();
    for (t, code) in codes.iter().enumerate() {
        assert!(toa
            .data()
            .index_axis(ndarray::Axis(1), t)
            .iter()
            .all(|v| v == code));
    }
    assert_eq!(codes, vec![72112.0, 72118.0]);
}

#[test]
fn test_static_fields_collapsed() {
    let ds = fuse_default();
    for name in ["geopotential_at_surface", "land_sea_mask"] {
        let field = ds.field(name).unwrap();
        assert_eq!(field.axes(), &[Axis::Lat, Axis::Lon]);
        assert_eq!(field.data()[[0, 2]], 42.0);
        assert_eq!(field.data()[[4, 0]], 0.0);
    }
}

#[test]
fn test_varying_static_field_rejected() {
    let mut sources = sources();
    let times = instants();
    let varying = ArrayD::from_shape_fn(IxDyn(&[times.len(), NLAT, NLON]), |idx| idx[0] as f32);
    sources
        .single_instant
        .remove_variable("lsm")
        .unwrap();
    sources
        .single_instant
        .insert(
            "lsm",
            fusion::RawVariable::new(
                vec!["valid_time".into(), "latitude".into(), "longitude".into()],
                varying,
            ),
        )
        .unwrap();
    assert!(context().fuser().fuse(sources).is_err());
}

#[test]
fn test_unknown_variable_is_schema_error() {
    let mut sources = sources();
    let nt = instants().len();
    sources.single_instant = sources
        .single_instant
        .with_variable(
            "sst",
            &["valid_time", "latitude", "longitude"],
            ArrayD::zeros(IxDyn(&[nt, NLAT, NLON])),
        )
        .unwrap();
    let err = context().fuser().fuse(sources).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert!(matches!(err, PipelineError::SchemaMismatch { ref name, .. } if name == "sst"));
}

#[test]
fn test_pressure_time_count_mismatch() {
    let three = parse_times(&[
        "2024-07-21T06:00:00Z",
        "2024-07-21T12:00:00Z",
        "2024-07-21T18:00:00Z",
    ]);
    let sources = RawSources {
        pressure_levels: pressure_source(&three),
        ..sources()
    };
    let err = context().fuser().fuse(sources).unwrap_err();
    assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
    assert_eq!(err.stage(), Some(Stage::Fuse));
}

#[test]
fn test_short_accumulation_is_insufficient() {
    let sources = RawSources {
        single_accum: accum_source(&hourly_times("2024-07-21", 13..=17)),
        ..sources()
    };
    let err = context().fuser().fuse(sources).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataInsufficiency);
}

#[test]
fn test_misaligned_accumulation_windows() {
    let sources = RawSources {
        single_accum: accum_source(&hourly_times("2024-07-21", 6..=17)),
        ..sources()
    };
    let err = context().fuser().fuse(sources).unwrap_err();
    assert!(matches!(err, PipelineError::CoordinateMismatch { .. }));
}

#[test]
fn test_missing_radiation_pattern() {
    let times = test_utils::hourly_range("2023-07-01", "2023-07-20");
    let values = test_utils::calendar_coded_series(&times, NLAT, NLON);
    let lat = grid().lat_coords();
    let lon = grid().lon_coords();
    let table = forcings::SolarForcingTable::new(times, lat, lon, values).unwrap();
    let ctx = PipelineContext::new(FusionConfig::default(), grid(), table).unwrap();

    let err = ctx.fuser().fuse(sources()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::MissingCalendarPattern { stage: Stage::Solar, ref key } if key == "07-21-12"
    ));
}

#[test]
fn test_swapped_sources_rejected() {
    let s = sources();
    let swapped = RawSources {
        single_instant: s.pressure_levels.clone(),
        single_accum: s.single_accum,
        pressure_levels: s.single_instant,
    };
    let err = context().fuser().fuse(swapped).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}
