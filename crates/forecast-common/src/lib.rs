//! Common types and utilities shared across the forecast preparation crates.

pub mod error;
pub mod grid;
pub mod time;

pub use error::{ErrorKind, PipelineError, PipelineResult, Stage};
pub use grid::{coords_match, grids, LatLonGrid, COORD_TOLERANCE, PRESSURE_LEVELS_37};
pub use time::{
    format_offset, lead_times, parse_iso8601, ForecastClock, TimeParseError, DEFAULT_STEP_HOURS,
};
