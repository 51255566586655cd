//! Small numeric primitives shared by the alpha and risk crates.
//!
//! Both the signal processor (z-scoring cross-sectional forecasts) and the
//! factor risk model (standardising a returns matrix before PCA) need the
//! same "mean and population stdev, zero if empty" arithmetic. Kept here so
//! neither crate depends on the other just to share it.

/// Population mean and standard deviation of `values`.
///
/// Returns `(0.0, 0.0)` for an empty slice.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// `true` if `value` is not finite (NaN or +/-infinity).
pub fn is_non_finite(value: f64) -> bool {
    !value.is_finite()
}
