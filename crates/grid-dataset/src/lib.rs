//! Canonical Grid Dataset Model
//!
//! A [`Dataset`] is an ordered mapping from field name to an n-dimensional
//! `f32` array plus one coordinate vector per axis. Axes always appear in the
//! canonical order
//!
//! ```text
//! batch -> time -> level -> lat -> lon
//! ```
//!
//! and every field declares which subset of them it spans. A
//! [`CanonicalSchema`] pins down the field-to-axes map, the pressure levels
//! and (optionally) the horizontal grid, and is checked at every stage
//! boundary so shape contracts are enforced rather than implied.
//!
//! # Example
//!
//! ```ignore
//! use grid_dataset::{Axis, Coordinates, Dataset, Field};
//!
//! let mut ds = Dataset::new(coords);
//! ds.insert("2m_temperature", Field::new(vec![Axis::Batch, Axis::Time, Axis::Lat, Axis::Lon], data)?)?;
//! ds.sort_ascending(Axis::Lat)?;
//! ds.validate(&CanonicalSchema::model_inputs(grid))?;
//! ```

pub mod dataset;
pub mod error;
pub mod schema;
pub mod types;

// Re-export commonly used types at crate root
pub use dataset::{ascending_order, Dataset};
pub use error::{DatasetError, Result};
pub use schema::{
    axes_for, CanonicalSchema, ATMOSPHERIC_VARS, FORCING_VARS, STATIC_VARS, SURFACE_VARS,
};
pub use types::{Axis, Coordinates, Field};
