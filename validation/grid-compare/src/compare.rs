//! Root-mean-square error between aligned series.

use forecast_common::{PipelineError, PipelineResult, Stage};
use grid_dataset::{Axis as GridAxis, Dataset};
use ndarray::{s, Array3, ArrayView3, Axis, Ix3};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{CompareConfig, MismatchPolicy};

/// Result of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub rmse: f64,
    /// RMSE of each time step, `None` where the step had no finite pair.
    pub step_rmse: Vec<Option<f64>>,
    /// Finite pairs entering the mean.
    pub pairs: usize,
    /// Pairs skipped because either side was NaN.
    pub excluded: usize,
    /// Compared `(time, lat, lon)` shape.
    pub shape: [usize; 3],
}

/// RMSE over two equally shaped series, excluding pairs where either side
/// is NaN.
pub fn rmse(predicted: ArrayView3<f32>, reference: ArrayView3<f32>) -> PipelineResult<Comparison> {
    if predicted.shape() != reference.shape() {
        return Err(PipelineError::shape(
            Stage::Compare,
            "series",
            reference.shape(),
            predicted.shape(),
        ));
    }

    let mut sum = 0.0_f64;
    let mut pairs = 0usize;
    let mut excluded = 0usize;
    let mut step_rmse = Vec::with_capacity(predicted.len_of(Axis(0)));

    for (p, r) in predicted.outer_iter().zip(reference.outer_iter()) {
        let mut step_sum = 0.0_f64;
        let mut step_pairs = 0usize;
        for (&a, &b) in p.iter().zip(r.iter()) {
            if a.is_nan() || b.is_nan() {
                excluded += 1;
                continue;
            }
            let d = a as f64 - b as f64;
            step_sum += d * d;
            step_pairs += 1;
        }
        step_rmse.push((step_pairs > 0).then(|| (step_sum / step_pairs as f64).sqrt()));
        sum += step_sum;
        pairs += step_pairs;
    }

    if pairs == 0 {
        return Err(PipelineError::insufficient(
            Stage::Compare,
            "series",
            "no pair of finite values to compare",
        ));
    }

    let shape = predicted.shape();
    Ok(Comparison {
        rmse: (sum / pairs as f64).sqrt(),
        step_rmse,
        pairs,
        excluded,
        shape: [shape[0], shape[1], shape[2]],
    })
}

/// `(time, lat, lon)` series of a surface field, taken at batch index 0.
pub fn field_series(ds: &Dataset, name: &str) -> PipelineResult<Array3<f32>> {
    let field = ds.field(name).map_err(|e| e.at(Stage::Compare))?;
    let wanted = [GridAxis::Batch, GridAxis::Time, GridAxis::Lat, GridAxis::Lon];
    if field.axes() != wanted.as_slice() {
        return Err(PipelineError::schema(
            Stage::Compare,
            name,
            "only (batch, time, lat, lon) fields can be compared",
        ));
    }
    field
        .data()
        .index_axis(Axis(0), 0)
        .to_owned()
        .into_dimensionality::<Ix3>()
        .map_err(|e| PipelineError::schema(Stage::Compare, name, e.to_string()))
}

/// Aligns both sides according to a [`CompareConfig`] and computes RMSE.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: CompareConfig,
}

impl Comparator {
    pub fn new(config: CompareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn compare(
        &self,
        predicted: ArrayView3<f32>,
        reference: ArrayView3<f32>,
    ) -> PipelineResult<Comparison> {
        let predicted = self.config.predicted.apply("predicted", predicted)?;
        let reference = self.config.reference.apply("reference", reference)?;

        let result = if predicted.shape() == reference.shape() {
            rmse(predicted.view(), reference.view())?
        } else {
            match self.config.policy {
                MismatchPolicy::Strict => {
                    return Err(PipelineError::shape(
                        Stage::Compare,
                        "aligned",
                        reference.shape(),
                        predicted.shape(),
                    ))
                }
                MismatchPolicy::Permissive => {
                    let (nt, nlat, nlon) = common_shape(predicted.dim(), reference.dim());
                    warn!(
                        predicted = ?predicted.shape(),
                        reference = ?reference.shape(),
                        common = ?[nt, nlat, nlon],
                        "Aligned shapes differ; comparing common sub-shape"
                    );
                    rmse(
                        predicted.slice(s![..nt, ..nlat, ..nlon]),
                        reference.slice(s![..nt, ..nlat, ..nlon]),
                    )?
                }
            }
        };

        info!(
            rmse = result.rmse,
            pairs = result.pairs,
            excluded = result.excluded,
            shape = ?result.shape,
            "Comparison complete"
        );
        Ok(result)
    }
}

fn common_shape(
    a: (usize, usize, usize),
    b: (usize, usize, usize),
) -> (usize, usize, usize) {
    (a.0.min(b.0), a.1.min(b.1), a.2.min(b.2))
}
