//! NetCDF-4 loading and saving.
//!
//! Reads the three provider downloads into [`fusion::RawDataset`]s, the
//! reference radiation table into a [`forcings::SolarForcingTable`] and
//! comparison series into plain arrays; writes canonical datasets
//! (model inputs, templates, predictions) and reads them back.
//!
//! # Implementation Notes
//!
//! The netcdf library wraps libnetcdf/HDF5 (system requirements:
//! libhdf5-dev libnetcdf-dev). Call [`silence_hdf5_errors`] once at startup
//! to keep HDF5 diagnostics for optional attributes off stderr.

pub mod error;
mod native;
pub mod reader;
pub mod units;
pub mod writer;

pub use error::{NetCdfError, NetCdfResult};
pub use native::silence_hdf5_errors;
pub use reader::{read_archive_series, read_grid_series, read_raw_source, read_solar_table, GridSeries};
pub use units::TimeUnits;
pub use writer::{read_dataset, write_dataset};

/// Radiation variable name in provider downloads.
pub const RADIATION_VAR: &str = "tisr";
