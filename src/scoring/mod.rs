//! Statistical estimators behind the proxy quality score.
//!
//! Every estimator is a pure function over in-memory sequences and returns an
//! [`Estimate`], so callers always get a usable value even for empty or
//! degenerate input.

pub mod anomaly;
pub mod composite;
pub mod confidence;
pub mod diagnostics;
pub mod estimate;
pub mod recency;
pub mod reliability;

pub use estimate::{Degradation, Estimate};

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation around `mean`, divided by `n - ddof`.
pub(crate) fn std_dev(values: &[f64], mean: f64, ddof: usize) -> Option<f64> {
    let n = values.len();
    if n <= ddof {
        return None;
    }
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - ddof) as f64;
    Some(variance.sqrt())
}

pub(crate) fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}
