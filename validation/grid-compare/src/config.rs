//! Comparator configuration.

use serde::{Deserialize, Serialize};

use crate::align::AlignTransform;

/// What to do when the aligned series still differ in shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Fail with a shape mismatch.
    #[default]
    Strict,
    /// Log a warning and compare the common leading sub-shape.
    Permissive,
}

/// Alignment of both sides plus the mismatch policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    pub predicted: AlignTransform,
    pub reference: AlignTransform,
    pub policy: MismatchPolicy,
}

impl CompareConfig {
    /// Hourly archive against an hourly reanalysis download: every sixth
    /// step of both, first `steps` of them; the reanalysis is flipped to
    /// ascending latitude and its last (north pole) row dropped.
    pub fn archive_vs_reanalysis(steps: usize) -> Self {
        Self {
            predicted: AlignTransform {
                time_stride: 6,
                time_window: Some(steps),
                ..AlignTransform::default()
            },
            reference: AlignTransform {
                time_stride: 6,
                time_window: Some(steps),
                flip_lat: true,
                trim_trailing_lat: 1,
                ..AlignTransform::default()
            },
            policy: MismatchPolicy::Strict,
        }
    }
}
