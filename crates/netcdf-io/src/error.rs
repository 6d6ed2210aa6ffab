//! Error types for NetCDF loading and saving.

use std::path::PathBuf;

use forecast_common::{PipelineError, Stage};
use thiserror::Error;

/// Result type for NetCDF operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF loading and saving.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error raised by the netCDF library
    #[error("NetCDF error: {0}")]
    Library(#[from] netcdf::Error),

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Unparseable CF time units
    #[error("invalid time units '{0}'")]
    TimeUnits(String),

    /// Content read fine but failed a pipeline check
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<NetCdfError> for PipelineError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::Pipeline(inner) => inner,
            NetCdfError::FileNotFound(ref path) => {
                PipelineError::io(Stage::Load, path.display().to_string(), err.to_string())
            }
            other => PipelineError::io(Stage::Load, "netcdf", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_common::ErrorKind;

    #[test]
    fn test_missing_file_is_resource_error() {
        let err: PipelineError = NetCdfError::FileNotFound(PathBuf::from("toa.nc")).into();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert_eq!(err.stage(), Some(Stage::Load));
    }

    #[test]
    fn test_pipeline_errors_pass_through() {
        let inner = PipelineError::schema(Stage::Fuse, "sst", "unknown");
        let err: PipelineError = NetCdfError::from(inner).into();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }
}
