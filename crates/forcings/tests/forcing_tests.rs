use chrono::{Duration, TimeZone, Utc};
use forcings::{encode, CalendarKey, LeapDayPolicy, SolarForcingTable};
use forecast_common::{ErrorKind, PipelineError};
use test_utils::fixtures::grid::COARSE_5X8;
use test_utils::{
    assert_approx_eq, calendar_code, calendar_coded_series, hourly_range, lat_indexed_series,
};

fn coarse_lat_desc() -> Vec<f32> {
    COARSE_5X8.lat_descending().into_iter().map(|v| v as f32).collect()
}

fn coarse_lat_asc() -> Vec<f32> {
    COARSE_5X8.lat_ascending().into_iter().map(|v| v as f32).collect()
}

fn coarse_lon() -> Vec<f32> {
    COARSE_5X8.lon().into_iter().map(|v| v as f32).collect()
}

fn july_table() -> SolarForcingTable {
    let times = hourly_range("2025-07-11", "2025-07-31");
    let values = calendar_coded_series(&times, COARSE_5X8.nlat, COARSE_5X8.nlon);
    SolarForcingTable::new(times, coarse_lat_desc(), coarse_lon(), values).unwrap()
}

#[test]
fn test_unit_circle_identity() {
    let start = Utc.with_ymd_and_hms(2023, 12, 30, 0, 0, 0).unwrap();
    let times: Vec<_> = (0..400).map(|i| start + Duration::minutes(97 * i)).collect();
    let f = encode(&times);
    for i in 0..times.len() {
        let y = f.year_progress_sin[i].powi(2) + f.year_progress_cos[i].powi(2);
        let d = f.day_progress_sin[i].powi(2) + f.day_progress_cos[i].powi(2);
        assert_approx_eq!(y, 1.0, 1e-6);
        assert_approx_eq!(d, 1.0, 1e-6);
    }
}

#[test]
fn test_encoding_is_bit_identical() {
    let start = Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap();
    let times: Vec<_> = (0..48).map(|i| start + Duration::hours(6 * i)).collect();
    let a = encode(&times);
    let b = encode(&times);
    let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.year_progress_sin), bits(&b.year_progress_sin));
    assert_eq!(bits(&a.day_progress_cos), bits(&b.day_progress_cos));
    assert_eq!(a, b);
}

#[test]
fn test_matching_key_from_other_year() {
    let table = july_table();
    let requested = vec![
        Utc.with_ymd_and_hms(2031, 7, 21, 12, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2031, 7, 21, 18, 0, 0).unwrap(),
    ];
    let out = table
        .resolve(&requested, &coarse_lat_asc(), &coarse_lon())
        .unwrap();
    assert_eq!(out.dim(), (2, 5, 8));
    assert_eq!(out[[0, 0, 0]], calendar_code(&requested[0]));
    assert_eq!(out[[1, 4, 7]], 72118.0);
}

#[test]
fn test_missing_key_reports_pattern() {
    let table = july_table();
    let requested = vec![Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap()];
    let err = table
        .resolve(&requested, &coarse_lat_asc(), &coarse_lon())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataInsufficiency);
    match err {
        PipelineError::MissingCalendarPattern { key, .. } => assert_eq!(key, "08-01-00"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_descending_table_rows_resorted() {
    let times = hourly_range("2025-07-11", "2025-07-11");
    let values = lat_indexed_series(times.len(), 5, 8);
    let table = SolarForcingTable::new(times, coarse_lat_desc(), coarse_lon(), values).unwrap();
    let out = table
        .resolve(
            &[Utc.with_ymd_and_hms(2026, 7, 11, 3, 0, 0).unwrap()],
            &coarse_lat_asc(),
            &coarse_lon(),
        )
        .unwrap();
    // Southernmost row was the provider's last row.
    assert_eq!(out[[0, 0, 0]], 4.0);
    assert_eq!(out[[0, 4, 0]], 0.0);
}

#[test]
fn test_leap_day_policy_deserializes() {
    let policy: LeapDayPolicy = serde_json::from_str("\"fallback_to_feb28\"").unwrap();
    assert_eq!(policy, LeapDayPolicy::FallbackToFeb28);
    assert!(CalendarKey::new(2, 29, 0).is_leap_day());
}
