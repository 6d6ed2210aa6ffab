//! Template datasets for the forecast period.
//!
//! Lead times are `(i + 1) * step` for `i in 0..steps`. The forcing template
//! takes the first forecast valid time as its start, so the initialization
//! instant is `start - step` and step `i` is valid at `start + i * step`.

use chrono::{DateTime, Utc};
use forecast_common::{
    lead_times, ForecastClock, LatLonGrid, PipelineError, PipelineResult, Stage,
};
use grid_dataset::{
    Axis, CanonicalSchema, Coordinates, Dataset, ATMOSPHERIC_VARS, SURFACE_VARS,
};
use ndarray::{ArrayD, IxDyn};
use tracing::info;

use crate::config::FusionConfig;
use crate::context::PipelineContext;
use crate::features::{attach_calendar, attach_solar};

fn check_steps(steps: usize) -> PipelineResult<()> {
    if steps == 0 {
        return Err(PipelineError::InvalidConfig(
            "template needs at least one step".to_string(),
        ));
    }
    Ok(())
}

/// Target template: every predicted field, zero-filled.
///
/// Depends only on the grid and the step settings, so no radiation table is
/// needed. Callers NaN-fill it ([`Dataset::nan_filled`]) before handing it to
/// the model; see [`crate::run_prediction`].
pub fn target_template(
    config: &FusionConfig,
    grid: &LatLonGrid,
    steps: usize,
) -> PipelineResult<Dataset> {
    config.validate()?;
    check_steps(steps)?;
    let coords = Coordinates::new(
        lead_times(steps, config.step_hours),
        Some(forecast_common::PRESSURE_LEVELS_37.to_vec()),
        grid.lat_coords(),
        grid.lon_coords(),
    );
    let mut ds = Dataset::new(coords);

    let surface = [1, steps, grid.nlat, grid.nlon];
    let atmospheric = [1, steps, forecast_common::PRESSURE_LEVELS_37.len(), grid.nlat, grid.nlon];
    for name in SURFACE_VARS {
        ds.insert_array(name, Axis::surface(), ArrayD::zeros(IxDyn(&surface)))
            .map_err(|e| e.at(Stage::Template))?;
    }
    for name in ATMOSPHERIC_VARS {
        ds.insert_array(name, Axis::atmospheric(), ArrayD::zeros(IxDyn(&atmospheric)))
            .map_err(|e| e.at(Stage::Template))?;
    }

    ds.validate(&CanonicalSchema::targets(Some(*grid)))
        .map_err(|e| e.at(Stage::Template))?;
    info!(steps, fields = ds.len(), "Built target template");
    Ok(ds)
}

/// Forcing template: solar forcing and calendar features for `steps` steps
/// starting at `start`.
pub fn forcing_template(
    ctx: &PipelineContext,
    start: DateTime<Utc>,
    steps: usize,
) -> PipelineResult<Dataset> {
    check_steps(steps)?;
    let grid = ctx.grid();
    let clock = ForecastClock::new(start - ctx.step());
    let offsets = lead_times(steps, ctx.config().step_hours);
    let times = clock.absolute(&offsets);

    let coords = Coordinates::new(offsets, None, grid.lat_coords(), grid.lon_coords());
    let mut ds = Dataset::new(coords).with_reference_time(clock.init);

    let toa = ctx.solar().resolve(&times, &ds.coords().lat, &ds.coords().lon)?;
    attach_solar(&mut ds, toa, Stage::Template)?;
    attach_calendar(&mut ds, &forcings::encode(&times), Stage::Template)?;

    ds.validate(&CanonicalSchema::forcings(Some(*grid)))
        .map_err(|e| e.at(Stage::Template))?;
    info!(
        steps,
        start = %start,
        init = %clock.init,
        "Built forcing template"
    );
    Ok(ds)
}
