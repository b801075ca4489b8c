//! Small statistics helpers shared by the detectors
//!
//! Every helper degrades to a defined value on empty or zero-mean input
//! rather than producing NaN.

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance, 0 for an empty slice
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Differences between consecutive values
pub fn deltas(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Fixed-interval score: `1 - cv * 10` floored at 0, where `cv` is the
/// coefficient of variation of `intervals`.
///
/// Returns 0 with fewer than two intervals or a non-positive mean. A burst
/// of simultaneous events (every gap 0) therefore scores 0 here, lower than
/// a steady cadence; bursts are caught by gap-based signals such as the
/// timing detector's instantaneous-action share.
pub fn interval_regularity(intervals: &[f64]) -> f64 {
    if intervals.len() < 2 {
        return 0.0;
    }
    let avg = mean(intervals);
    if avg <= 0.0 {
        return 0.0;
    }
    let normalized = std_dev(intervals) / avg;
    (1.0 - normalized * 10.0).max(0.0)
}

/// Evenness score: `1 - std/mean` clamped to [0, 1].
///
/// All-equal values are perfectly even (1), including all zeros; any other
/// zero-mean input scores 0.
pub fn evenness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let spread = std_dev(values);
    if avg.abs() < f64::EPSILON {
        return if spread < f64::EPSILON { 1.0 } else { 0.0 };
    }
    (1.0 - spread / avg).clamp(0.0, 1.0)
}
