//! Fusion configuration.

use chrono::{DateTime, Duration, Utc};
use forcings::LeapDayPolicy;
use forecast_common::{PipelineError, PipelineResult, DEFAULT_STEP_HOURS};
use serde::{Deserialize, Serialize};

/// Settings for the fuser and the template generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Accumulated samples summed into one instantaneous step.
    pub accumulation_window: usize,
    /// Hours between model steps.
    pub step_hours: i64,
    /// How Feb 29 is resolved against the radiation table.
    pub leap_day_policy: LeapDayPolicy,
    /// Fields reduced to a single lat/lon slice.
    pub static_fields: Vec<String>,
    /// Provider metadata variables dropped before renaming.
    pub dropped_metadata: Vec<String>,
    /// Initialization instant; defaults to the last input timestamp.
    pub init_time: Option<DateTime<Utc>>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            accumulation_window: 6,
            step_hours: DEFAULT_STEP_HOURS,
            leap_day_policy: LeapDayPolicy::Strict,
            static_fields: vec![
                "geopotential_at_surface".to_string(),
                "land_sea_mask".to_string(),
            ],
            dropped_metadata: vec!["expver".to_string(), "number".to_string()],
            init_time: None,
        }
    }
}

impl FusionConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.accumulation_window == 0 {
            return Err(PipelineError::InvalidConfig(
                "accumulation_window must be at least 1".to_string(),
            ));
        }
        if self.step_hours <= 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "step_hours must be positive, got {}",
                self.step_hours
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> Duration {
        Duration::hours(self.step_hours)
    }

    pub fn is_dropped(&self, name: &str) -> bool {
        self.dropped_metadata.iter().any(|m| m == name)
    }

    pub fn is_static(&self, name: &str) -> bool {
        self.static_fields.iter().any(|s| s == name)
    }
}
