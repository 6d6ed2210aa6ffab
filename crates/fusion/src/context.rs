//! Explicitly owned pipeline state.

use chrono::Duration;
use forcings::SolarForcingTable;
use forecast_common::{LatLonGrid, PipelineError, PipelineResult, Stage};
use tracing::info;

use crate::config::FusionConfig;
use crate::fuser::Fuser;

/// Everything loaded once and reused across stages: the radiation table,
/// the target grid and the fusion settings.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    config: FusionConfig,
    grid: LatLonGrid,
    solar: SolarForcingTable,
}

impl PipelineContext {
    /// Build a context, checking the radiation table covers `grid`.
    pub fn new(
        config: FusionConfig,
        grid: LatLonGrid,
        solar: SolarForcingTable,
    ) -> PipelineResult<Self> {
        config.validate()?;

        if !grid.matches(solar.lat(), solar.lon()) {
            return Err(PipelineError::shape(
                Stage::Solar,
                "radiation_table",
                vec![grid.nlat, grid.nlon],
                vec![solar.lat().len(), solar.lon().len()],
            ));
        }

        let solar = solar.with_policy(config.leap_day_policy);
        info!(
            nlat = grid.nlat,
            nlon = grid.nlon,
            table_rows = solar.len(),
            "Pipeline context ready"
        );

        Ok(Self {
            config,
            grid,
            solar,
        })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn grid(&self) -> &LatLonGrid {
        &self.grid
    }

    pub fn solar(&self) -> &SolarForcingTable {
        &self.solar
    }

    pub fn step(&self) -> Duration {
        self.config.step()
    }

    pub fn fuser(&self) -> Fuser<'_> {
        Fuser::new(self)
    }
}
