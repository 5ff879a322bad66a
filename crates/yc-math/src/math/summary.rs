//! Summary statistics over f64 slices.
//!
//! All functions tolerate empty input by returning NaN (or an empty result for
//! `histogram`) rather than panicking; callers that need hard errors validate
//! sizes before reaching this layer.

use serde::{Deserialize, Serialize};

/// Arithmetic mean. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population (1/n) variance. NaN for empty input.
pub fn variance_population(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Population (1/n) standard deviation. NaN for empty input.
pub fn std_population(values: &[f64]) -> f64 {
    variance_population(values).sqrt()
}

/// Sample (1/(n-1)) variance. NaN for fewer than two values.
pub fn variance_sample(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample (1/(n-1)) standard deviation. NaN for fewer than two values.
pub fn std_sample(values: &[f64]) -> f64 {
    variance_sample(values).sqrt()
}

/// Monte-Carlo standard error of the mean: sample sd / sqrt(n).
pub fn standard_error(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    std_sample(values) / (values.len() as f64).sqrt()
}

/// Empirical percentile with linear interpolation between order statistics.
///
/// # Arguments
/// * `values` - Observations (need not be sorted; a sorted copy is made)
/// * `p` - Percentile in [0, 100], clamped
///
/// # Returns
/// * The interpolated percentile, NaN for empty input
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() || p.is_nan() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// One bin of an equal-width histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Equal-width histogram over `values`.
///
/// Returns an empty vector for empty input or `n_bins == 0`. A degenerate
/// range (all values equal) collapses to a single bin holding everything.
/// The top bin is closed on both ends so the maximum is never dropped.
pub fn histogram(values: &[f64], n_bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || n_bins == 0 {
        return Vec::new();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }
    if min == max {
        return vec![HistogramBin {
            lo: min,
            hi: max,
            count: values.len(),
        }];
    }
    let width = (max - min) / n_bins as f64;
    let mut bins: Vec<HistogramBin> = (0..n_bins)
        .map(|i| HistogramBin {
            lo: min + i as f64 * width,
            hi: min + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width) as usize).min(n_bins - 1);
        bins[idx].count += 1;
    }
    bins
}
