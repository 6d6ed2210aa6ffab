//! Contract with the external forecasting model.
//!
//! The model is opaque: it receives the inputs, a NaN-filled targets template
//! and the forcings, and returns predictions on the template's coordinates.

use forecast_common::{PipelineError, PipelineResult, Stage};
use grid_dataset::Dataset;
use tracing::info;

/// A single synchronous model invocation.
pub trait Predictor {
    fn predict(
        &self,
        inputs: &Dataset,
        targets_template: &Dataset,
        forcings: &Dataset,
    ) -> PipelineResult<Dataset>;
}

impl<F> Predictor for F
where
    F: Fn(&Dataset, &Dataset, &Dataset) -> PipelineResult<Dataset>,
{
    fn predict(
        &self,
        inputs: &Dataset,
        targets_template: &Dataset,
        forcings: &Dataset,
    ) -> PipelineResult<Dataset> {
        self(inputs, targets_template, forcings)
    }
}

/// Run the model once and check the predictions against the template.
///
/// The template's values are replaced by NaN before the call. Predictions
/// must carry the template's fields and echo its `time`, `level`, `lat` and
/// `lon` coordinates.
pub fn run_prediction<P: Predictor + ?Sized>(
    predictor: &P,
    inputs: &Dataset,
    targets_template: &Dataset,
    forcings: &Dataset,
) -> PipelineResult<Dataset> {
    let template = targets_template.nan_filled();
    let predictions = predictor.predict(inputs, &template, forcings)?;

    for name in template.names() {
        let expected = template.field(name).map_err(|e| e.at(Stage::Predict))?;
        let actual = predictions.field(name).map_err(|e| e.at(Stage::Predict))?;
        if expected.shape() != actual.shape() {
            return Err(PipelineError::shape(
                Stage::Predict,
                name,
                expected.shape(),
                actual.shape(),
            ));
        }
    }
    template
        .check_same_coords(&predictions)
        .map_err(|e| e.at(Stage::Predict))?;

    info!(
        fields = predictions.len(),
        steps = predictions.coords().time.len(),
        "Model predictions accepted"
    );
    Ok(predictions)
}
