//! CF time units: `"<unit> since <reference>"`.
//!
//! Provider files use `seconds since 1970-01-01` for `valid_time`; older
//! downloads use `hours since 1900-01-01 00:00:00.0`. Both are accepted.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::error::{NetCdfError, NetCdfResult};

/// Parsed CF time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    /// Length of one unit, in seconds.
    pub unit_seconds: i64,
    pub epoch: DateTime<Utc>,
}

impl TimeUnits {
    pub fn parse(units: &str) -> NetCdfResult<Self> {
        let bad = || NetCdfError::TimeUnits(units.to_string());

        let (unit, reference) = units.split_once(" since ").ok_or_else(bad)?;
        let unit_seconds = match unit.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => 1,
            "minutes" | "minute" | "mins" => 60,
            "hours" | "hour" | "hrs" | "h" => 3_600,
            "days" | "day" | "d" => 86_400,
            _ => return Err(bad()),
        };

        let reference = reference
            .trim()
            .trim_end_matches(" UTC")
            .trim_end_matches('Z')
            .replacen('T', " ", 1);
        let epoch = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&reference, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(&reference, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(bad)?
            .and_utc();

        Ok(Self {
            unit_seconds,
            epoch,
        })
    }

    /// Instant `value` units after the epoch, rounded to the millisecond.
    pub fn to_datetime(&self, value: f64) -> NetCdfResult<DateTime<Utc>> {
        if !value.is_finite() {
            return Err(NetCdfError::InvalidFormat(format!(
                "non-finite time value {}",
                value
            )));
        }
        let out_of_range =
            || NetCdfError::InvalidFormat(format!("time value {} is out of range", value));
        let millis = (value * self.unit_seconds as f64 * 1_000.0).round();
        if millis.abs() >= i64::MAX as f64 {
            return Err(out_of_range());
        }
        Duration::try_milliseconds(millis as i64)
            .and_then(|offset| self.epoch.checked_add_signed(offset))
            .ok_or_else(out_of_range)
    }

    pub fn to_datetimes(&self, values: &[f64]) -> NetCdfResult<Vec<DateTime<Utc>>> {
        values.iter().map(|&v| self.to_datetime(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unix_seconds() {
        let units = TimeUnits::parse("seconds since 1970-01-01").unwrap();
        let t = units.to_datetime(1_721_563_200.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 7, 21, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_hours_since_1900() {
        let units = TimeUnits::parse("hours since 1900-01-01 00:00:00.0").unwrap();
        assert_eq!(units.unit_seconds, 3_600);
        assert_eq!(units.epoch, Utc.with_ymd_and_hms(1900, 1, 1, 0, 0, 0).unwrap());
        let t = units.to_datetime(24.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1900, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_iso_reference() {
        let units = TimeUnits::parse("days since 2000-01-01T06:00:00Z").unwrap();
        let t = units.to_datetime(0.5).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2000, 1, 1, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(TimeUnits::parse("hours").is_err());
        assert!(TimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(TimeUnits::parse("hours since yesterday").is_err());
    }

    #[test]
    fn test_out_of_range_value() {
        let units = TimeUnits::parse("hours since 1900-01-01").unwrap();
        assert!(matches!(units.to_datetime(1e300), Err(NetCdfError::InvalidFormat(_))));
        assert!(matches!(units.to_datetime(-1e15), Err(NetCdfError::InvalidFormat(_))));
        assert!(units.to_datetime(f64::NAN).is_err());
    }
}
