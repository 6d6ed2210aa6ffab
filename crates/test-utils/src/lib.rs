//! Test support for the forecast-prep workspace.
//!
//! - [`fixtures`]: the reference day, grids, level order and provider codes
//! - [`generators`]: synthetic series whose values encode their position or
//!   timestamp, so tests can check where a value ended up
//! - [`paths`]: locating optional real downloads
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, index_coded, require_download};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve one or more real downloads, or skip the test.
///
/// Evaluates to the path for a single name and to a `Vec<PathBuf>` for
/// several. The test returns early when any of them is absent.
///
/// ```ignore
/// let toa = require_download!("toa.nc");
/// let inputs = require_download!("single-instant.nc", "single-accum.nc");
/// ```
#[macro_export]
macro_rules! require_download {
    ($name:expr) => {{
        match $crate::find_download($name) {
            Some(path) => path,
            None => {
                eprintln!("SKIPPED: download '{}' not found (set {})", $name, $crate::TEST_DATA_ENV);
                return;
            }
        }
    }};
    ($($name:expr),+ $(,)?) => {{
        let mut found = Vec::new();
        $( found.push($crate::require_download!($name)); )+
        found
    }};
}

/// Approximate equality on `f64`; two NaNs compare equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right, epsilon) = ($left as f64, $right as f64, $epsilon as f64);
        let both_nan = left.is_nan() && right.is_nan();
        if !both_nan && !((left - right).abs() <= epsilon) {
            panic!(
                "approx assertion failed: {:?} vs {:?} (tolerance {:?})",
                left, right, epsilon
            );
        }
    }};
}

/// [`assert_approx_eq!`] applied pairwise over two sequences of equal length.
#[macro_export]
macro_rules! assert_all_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: Vec<f64> = $left.into_iter().map(|v| v as f64).collect();
        let right: Vec<f64> = $right.into_iter().map(|v| v as f64).collect();
        assert_eq!(left.len(), right.len(), "sequence lengths differ");
        let epsilon = $epsilon as f64;
        for (i, (l, r)) in left.iter().zip(&right).enumerate() {
            let close = (l.is_nan() && r.is_nan()) || (l - r).abs() <= epsilon;
            if !close {
                panic!("approx assertion failed at index {}: {:?} vs {:?}", i, l, r);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_within_tolerance() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5_f32, -5.500001_f32, 1e-4);
    }

    #[test]
    fn test_approx_nan_pair() {
        assert_approx_eq!(f64::NAN, f32::NAN, 0.0);
    }

    #[test]
    #[should_panic(expected = "approx assertion failed")]
    fn test_approx_nan_against_number() {
        assert_approx_eq!(f64::NAN, 1.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "at index 1")]
    fn test_all_approx_reports_index() {
        assert_all_approx_eq!(vec![1.0_f32, 2.0], vec![1.0_f32, 2.5], 0.1);
    }
}
