//! Grid comparison for forecast validation.
//!
//! This crate provides tools to:
//! - Bring a predicted and a reference `(time, lat, lon)` series onto the
//!   same layout (time stride and window, latitude flip and trim, longitude
//!   roll, spatial subsets)
//! - Compute the root-mean-square error over the aligned series, excluding
//!   NaN pairs
//! - Report shape disagreements strictly, or crop to the common sub-shape
//!   when the caller opts in

pub mod align;
pub mod compare;
pub mod config;

pub use align::AlignTransform;
pub use compare::{field_series, rmse, Comparator, Comparison};
pub use config::{CompareConfig, MismatchPolicy};
