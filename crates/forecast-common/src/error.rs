//! Error types for the forecast preparation pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias using PipelineError.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Load,
    Calendar,
    Solar,
    Fuse,
    Template,
    Predict,
    Compare,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Calendar => "calendar",
            Stage::Solar => "solar",
            Stage::Fuse => "fuse",
            Stage::Template => "template",
            Stage::Predict => "predict",
            Stage::Compare => "compare",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse error classes used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unexpected or missing variable/axis name.
    Schema,
    /// Axis length, dtype, resolution or coordinate disagreement.
    Shape,
    /// Not enough samples, or no calendar-pattern match.
    DataInsufficiency,
    /// Source unavailable or unreadable.
    Resource,
    /// Malformed caller input (timestamps, configuration).
    Validation,
}

/// Primary error type for pipeline operations.
///
/// Every variant names the stage that failed and, where there is one, the
/// field or axis that triggered it.
#[derive(Debug, Error)]
pub enum PipelineError {
    // === Schema ===
    #[error("[{stage}] schema mismatch on '{name}': {message}")]
    SchemaMismatch {
        stage: Stage,
        name: String,
        message: String,
    },

    // === Shape / coordinates ===
    #[error("[{stage}] shape mismatch on '{name}': expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        stage: Stage,
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("[{stage}] coordinate mismatch on '{name}': {message}")]
    CoordinateMismatch {
        stage: Stage,
        name: String,
        message: String,
    },

    // === Data insufficiency ===
    #[error("[{stage}] insufficient data for '{name}': {message}")]
    InsufficientData {
        stage: Stage,
        name: String,
        message: String,
    },

    #[error("[{stage}] missing calendar pattern {key} in radiation table")]
    MissingCalendarPattern { stage: Stage, key: String },

    // === Validation ===
    #[error("[{stage}] invalid timestamp: {0}", stage = Stage::Calendar)]
    InvalidTimestamp(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // === Resource ===
    #[error("[{stage}] I/O failure on '{name}': {message}")]
    Io {
        stage: Stage,
        name: String,
        message: String,
    },
}

impl PipelineError {
    pub fn schema(stage: Stage, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            stage,
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn shape(
        stage: Stage,
        name: impl Into<String>,
        expected: impl Into<Vec<usize>>,
        actual: impl Into<Vec<usize>>,
    ) -> Self {
        Self::ShapeMismatch {
            stage,
            name: name.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn coordinate(stage: Stage, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CoordinateMismatch {
            stage,
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn insufficient(stage: Stage, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InsufficientData {
            stage,
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn io(stage: Stage, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            stage,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into the pipeline's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::SchemaMismatch { .. } => ErrorKind::Schema,
            PipelineError::ShapeMismatch { .. } | PipelineError::CoordinateMismatch { .. } => {
                ErrorKind::Shape
            }
            PipelineError::InsufficientData { .. }
            | PipelineError::MissingCalendarPattern { .. } => ErrorKind::DataInsufficiency,
            PipelineError::InvalidTimestamp(_) | PipelineError::InvalidConfig(_) => {
                ErrorKind::Validation
            }
            PipelineError::Io { .. } => ErrorKind::Resource,
        }
    }

    /// Stage the error was raised in, if it is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::SchemaMismatch { stage, .. }
            | PipelineError::ShapeMismatch { stage, .. }
            | PipelineError::CoordinateMismatch { stage, .. }
            | PipelineError::InsufficientData { stage, .. }
            | PipelineError::MissingCalendarPattern { stage, .. }
            | PipelineError::Io { stage, .. } => Some(*stage),
            PipelineError::InvalidTimestamp(_) => Some(Stage::Calendar),
            PipelineError::InvalidConfig(_) => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::io(Stage::Load, "filesystem", err.to_string())
    }
}
