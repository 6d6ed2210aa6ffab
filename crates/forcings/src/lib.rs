//! Forcing fields derived from the calendar.
//!
//! - [`calendar`] turns absolute timestamps into the four periodic
//!   year/day-progress signals.
//! - [`solar`] resolves top-of-atmosphere incident solar radiation from a
//!   reference table by `month-day-hour` pattern, ignoring the year.
//!
//! Both operate on absolute instants; callers holding time offsets convert
//! them with [`forecast_common::ForecastClock`] first.

pub mod calendar;
pub mod solar;

pub use calendar::{day_fraction, encode, encode_iso, year_fraction, CalendarFeatures};
pub use solar::{CalendarKey, LeapDayPolicy, SolarForcingTable, TOA_FIELD};
