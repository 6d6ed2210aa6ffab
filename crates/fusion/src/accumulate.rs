//! Accumulation windowing.
//!
//! The accumulated source is sampled more often than the instantaneous ones.
//! Consecutive runs of `window` samples are summed into one step labelled by
//! the run's last instant; a trailing run shorter than `window` is dropped.
//! NaN samples count as zero, so a window of all-NaN sums to 0.

use chrono::{DateTime, Utc};
use forecast_common::{PipelineError, PipelineResult, Stage};
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use tracing::debug;

/// Sum `data` along `axis` in complete windows of `window` samples.
///
/// Returns the label (last instant) of every complete window and the summed
/// array, whose `axis` has one entry per window.
pub fn accumulate_windows(
    name: &str,
    times: &[DateTime<Utc>],
    data: &ArrayD<f32>,
    axis: usize,
    window: usize,
) -> PipelineResult<(Vec<DateTime<Utc>>, ArrayD<f32>)> {
    if window == 0 {
        return Err(PipelineError::InvalidConfig(
            "accumulation window must be at least 1".to_string(),
        ));
    }
    if axis >= data.ndim() || data.shape()[axis] != times.len() {
        return Err(PipelineError::shape(
            Stage::Fuse,
            format!("{}.time", name),
            vec![times.len()],
            data.shape(),
        ));
    }

    let complete = times.len() / window;
    if complete == 0 {
        return Err(PipelineError::insufficient(
            Stage::Fuse,
            name,
            format!(
                "{} samples cannot fill an accumulation window of {}",
                times.len(),
                window
            ),
        ));
    }

    let leftover = times.len() % window;
    if leftover > 0 {
        debug!(
            field = %name,
            dropped = leftover,
            "Dropping trailing partial accumulation window"
        );
    }

    let mut shape = data.shape().to_vec();
    shape[axis] = complete;
    let mut out = ArrayD::<f32>::zeros(IxDyn(&shape));

    for w in 0..complete {
        let start = w * window;
        let block = data.slice_axis(Axis(axis), Slice::from(start..start + window));
        let sums = block.fold_axis(Axis(axis), 0.0_f32, |acc, &v| {
            if v.is_nan() {
                *acc
            } else {
                acc + v
            }
        });
        out.index_axis_mut(Axis(axis), w).assign(&sums);
    }

    let labels = (1..=complete).map(|w| times[w * window - 1]).collect();
    Ok((labels, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hourly(n: usize) -> Vec<DateTime<Utc>> {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 11, 0, 0, 0).unwrap();
        (0..n).map(|i| t0 + Duration::hours(i as i64)).collect()
    }

    #[test]
    fn test_all_ones_sum_to_window() {
        let times = hourly(15);
        let data = ArrayD::<f32>::ones(IxDyn(&[15, 2, 3]));
        let (labels, out) = accumulate_windows("tp", &times, &data, 0, 6).unwrap();
        assert_eq!(out.shape(), &[2, 2, 3]);
        assert!(out.iter().all(|&v| v == 6.0));
        // Three trailing samples are dropped, not padded.
        assert_eq!(labels, vec![times[5], times[11]]);
    }

    #[test]
    fn test_window_along_inner_axis() {
        let times = hourly(4);
        let data = ArrayD::from_shape_fn(IxDyn(&[1, 4, 1]), |idx| idx[1] as f32);
        let (_, out) = accumulate_windows("tp", &times, &data, 1, 2).unwrap();
        assert_eq!(out.shape(), &[1, 2, 1]);
        assert_eq!(out[[0, 0, 0]], 1.0);
        assert_eq!(out[[0, 1, 0]], 5.0);
    }

    #[test]
    fn test_nan_samples_skipped() {
        let times = hourly(2);
        let mut data = ArrayD::<f32>::ones(IxDyn(&[2, 1]));
        data[[1, 0]] = f32::NAN;
        let (_, out) = accumulate_windows("tp", &times, &data, 0, 2).unwrap();
        assert_eq!(out[[0, 0]], 1.0);
    }

    #[test]
    fn test_too_few_samples() {
        let times = hourly(5);
        let data = ArrayD::<f32>::ones(IxDyn(&[5, 1]));
        let err = accumulate_windows("tp", &times, &data, 0, 6).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData { .. }));
    }

    #[test]
    fn test_time_length_mismatch() {
        let times = hourly(6);
        let data = ArrayD::<f32>::ones(IxDyn(&[5, 1]));
        let err = accumulate_windows("tp", &times, &data, 0, 6).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch { .. }));
    }
}
