//! Error types for dataset operations.

use forecast_common::{PipelineError, Stage};
use thiserror::Error;

/// Errors that can occur while building or transforming a dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// An axis name outside the canonical set.
    #[error("unknown axis '{0}'")]
    UnknownAxis(String),

    /// A field's axes are not a subsequence of the canonical order.
    #[error("field '{field}' axes {axes:?} are not in canonical order")]
    AxisOrder { field: String, axes: Vec<String> },

    /// Field rank does not match its declared axes.
    #[error("field '{field}' declares {axes} axes but has rank {ndim}")]
    RankMismatch {
        field: String,
        axes: usize,
        ndim: usize,
    },

    /// Field extent along an axis disagrees with the coordinate vector.
    #[error("field '{field}' has length {actual} along '{axis}', coordinate has {expected}")]
    AxisLength {
        field: String,
        axis: String,
        expected: usize,
        actual: usize,
    },

    /// A field spans an axis the dataset has no coordinate for.
    #[error("field '{field}' spans '{axis}' but the dataset has no such coordinate")]
    MissingCoordinate { field: String, axis: String },

    /// Coordinate values are not strictly ascending or fall outside their domain.
    #[error("coordinate '{axis}' is invalid: {message}")]
    InvalidCoordinate { axis: String, message: String },

    /// Required field is absent.
    #[error("missing field '{0}'")]
    MissingField(String),

    /// Field not allowed by the schema.
    #[error("unexpected field '{0}'")]
    UnexpectedField(String),

    /// Field spans different axes than the schema requires.
    #[error("field '{field}' spans {actual:?}, schema requires {expected:?}")]
    SchemaAxes {
        field: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// A static field varies across batch/time slices.
    #[error("static field '{0}' varies across batch/time slices")]
    StaticVaries(String),

    /// Array shape construction failed.
    #[error("array shape error for '{field}': {message}")]
    Shape { field: String, message: String },
}

impl DatasetError {
    /// Attach the pipeline stage and convert into a [`PipelineError`].
    pub fn at(self, stage: Stage) -> PipelineError {
        match self {
            DatasetError::UnknownAxis(name) => {
                PipelineError::schema(stage, name, "not a canonical axis")
            }
            DatasetError::AxisOrder { ref field, .. } => {
                let field = field.clone();
                PipelineError::schema(stage, field, self.to_string())
            }
            DatasetError::MissingField(ref name) | DatasetError::UnexpectedField(ref name) => {
                let name = name.clone();
                PipelineError::schema(stage, name, self.to_string())
            }
            DatasetError::SchemaAxes { ref field, .. }
            | DatasetError::MissingCoordinate { ref field, .. } => {
                let field = field.clone();
                PipelineError::schema(stage, field, self.to_string())
            }
            DatasetError::RankMismatch { field, axes, ndim } => {
                PipelineError::shape(stage, field, vec![axes], vec![ndim])
            }
            DatasetError::AxisLength {
                field,
                axis,
                expected,
                actual,
            } => PipelineError::shape(
                stage,
                format!("{}.{}", field, axis),
                vec![expected],
                vec![actual],
            ),
            DatasetError::InvalidCoordinate { ref axis, .. } => {
                let axis = axis.clone();
                PipelineError::coordinate(stage, axis, self.to_string())
            }
            DatasetError::StaticVaries(ref field) => {
                let field = field.clone();
                PipelineError::coordinate(stage, field, self.to_string())
            }
            DatasetError::Shape { ref field, .. } => {
                let field = field.clone();
                PipelineError::shape(stage, field, Vec::new(), Vec::new())
            }
        }
    }

    pub(crate) fn invalid_coordinate(axis: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            axis: axis.into(),
            message: message.into(),
        }
    }
}

/// Result type for dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_common::ErrorKind;

    #[test]
    fn test_axis_length_maps_to_shape_error() {
        let err = DatasetError::AxisLength {
            field: "temperature".to_string(),
            axis: "time".to_string(),
            expected: 2,
            actual: 3,
        }
        .at(Stage::Fuse);
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(err.to_string().contains("temperature.time"));
    }

    #[test]
    fn test_missing_field_maps_to_schema_error() {
        let err = DatasetError::MissingField("land_sea_mask".to_string()).at(Stage::Template);
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.stage(), Some(Stage::Template));
    }
}
