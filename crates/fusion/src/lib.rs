//! Reanalysis fusion library.
//!
//! Turns the three raw provider downloads into the canonical model-input
//! dataset and builds the template datasets the model needs alongside it.
//!
//! # Architecture
//!
//! ```text
//! single-accum ──(windowing)──┐
//! single-instant ─────────────┼──(rename, batch, merge)──> sort ──> features ──> statics ──> validate
//! pressure-levels ────────────┘
//! ```
//!
//! Large reference data (the solar forcing table) is owned by a
//! [`PipelineContext`] built once and passed by reference to every stage.

pub mod accumulate;
pub mod config;
pub mod context;
mod features;
pub mod fuser;
pub mod model;
pub mod request;
pub mod source;
pub mod tables;
pub mod templates;

// Re-exports
pub use accumulate::accumulate_windows;
pub use config::FusionConfig;
pub use context::PipelineContext;
pub use fuser::{Fuser, RawSources};
pub use model::{run_prediction, Predictor};
pub use request::{RetrieveJob, SourceProvider, SourceRequest};
pub use source::{RawCoord, RawDataset, RawVariable, SourceKind};
pub use templates::{forcing_template, target_template};
