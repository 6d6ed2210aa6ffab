//! Attaching the synthetic forcing fields to a dataset.

use forcings::{CalendarFeatures, TOA_FIELD};
use forecast_common::{PipelineError, PipelineResult, Stage};
use grid_dataset::{Axis, Dataset, Field};
use ndarray::{Array2, Array3};

/// Add the four calendar fields: year progress over `(batch, time)`, day
/// progress tiled across `lon` as `(batch, time, lon)`.
pub(crate) fn attach_calendar(
    ds: &mut Dataset,
    features: &CalendarFeatures,
    stage: Stage,
) -> PipelineResult<()> {
    let nt = features.len();
    let nlon = ds.coords().lon.len();

    for (name, values) in features.year_progress() {
        let data = Array2::from_shape_vec((1, nt), values.to_vec())
            .map_err(|e| PipelineError::schema(stage, name, e.to_string()))?;
        ds.insert_array(name, vec![Axis::Batch, Axis::Time], data.into_dyn())
            .map_err(|e| e.at(stage))?;
    }

    for (name, values) in features.day_progress() {
        let data = Array3::from_shape_fn((1, nt, nlon), |(_, t, _)| values[t]);
        ds.insert_array(name, vec![Axis::Batch, Axis::Time, Axis::Lon], data.into_dyn())
            .map_err(|e| e.at(stage))?;
    }

    Ok(())
}

/// Add resolved `(time, lat, lon)` radiation as a `(batch, time, lat, lon)`
/// field.
pub(crate) fn attach_solar(ds: &mut Dataset, values: Array3<f32>, stage: Stage) -> PipelineResult<()> {
    let data = values.insert_axis(ndarray::Axis(0)).into_dyn();
    let field = Field::new(Axis::surface(), data)
        .map_err(|e| e.at(stage))?
        .with_attr("units", "W/m^2")
        .with_attr("description", "Top of atmosphere incident solar radiation");
    ds.insert(TOA_FIELD, field).map_err(|e| e.at(stage))
}
