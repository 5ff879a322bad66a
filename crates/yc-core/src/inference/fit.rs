//! Maximum-likelihood fitting and bootstrap confidence intervals.

use crate::rng::RandomStream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use yc_math::{mean, percentile, std_population};

/// Fitted Normal parameters. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionParams {
    pub mean: f64,
    pub std: f64,
}

/// Errors raised during fitting and bootstrap.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("insufficient data for {stage}: need at least {required} observations, got {actual}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        actual: usize,
    },
    #[error("invalid parameter {field}: {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },
}

/// Maximum-likelihood Normal fit.
///
/// Closed form: the arithmetic mean and the population (1/n) standard
/// deviation of the sample.
pub fn fit_mle(sample: &[f64]) -> Result<DistributionParams, FitError> {
    if sample.is_empty() {
        return Err(FitError::InsufficientData {
            stage: "mle_fit",
            required: 1,
            actual: 0,
        });
    }
    Ok(DistributionParams {
        mean: mean(sample),
        std: std_population(sample),
    })
}

/// Estimator for [`bootstrap_confidence_interval`]: maps a resample to named
/// parameter values.
pub type Estimator = dyn Fn(&[f64]) -> Vec<(&'static str, f64)>;

/// The Normal MLE as a bootstrap estimator.
pub fn normal_estimator(sample: &[f64]) -> Vec<(&'static str, f64)> {
    vec![("mean", mean(sample)), ("std", std_population(sample))]
}

/// Bootstrap confidence intervals for an arbitrary estimator.
///
/// Resamples `sample` with replacement `n_resamples` times, applies the
/// estimator to each resample, and returns the empirical central
/// `confidence_level` interval per parameter.
///
/// # Errors
/// * `InsufficientData` if the sample has fewer than two observations
/// * `InvalidParameter` for `n_resamples == 0` or a confidence level outside (0, 1)
pub fn bootstrap_confidence_interval(
    sample: &[f64],
    estimator: &Estimator,
    n_resamples: usize,
    confidence_level: f64,
    seed: u64,
) -> Result<BTreeMap<&'static str, (f64, f64)>, FitError> {
    if sample.len() < 2 {
        return Err(FitError::InsufficientData {
            stage: "bootstrap",
            required: 2,
            actual: sample.len(),
        });
    }
    if n_resamples == 0 {
        return Err(FitError::InvalidParameter {
            field: "n_resamples",
            message: "must be at least 1".to_string(),
        });
    }
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(FitError::InvalidParameter {
            field: "confidence_level",
            message: format!("must lie in (0, 1), got {confidence_level}"),
        });
    }

    let mut stream = RandomStream::new(seed);
    let mut resample = vec![0.0; sample.len()];
    let mut estimates: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();
    for _ in 0..n_resamples {
        for slot in resample.iter_mut() {
            *slot = sample[stream.resample_index(sample.len())];
        }
        for (name, value) in estimator(&resample) {
            estimates.entry(name).or_default().push(value);
        }
    }

    let tail = (1.0 - confidence_level) / 2.0 * 100.0;
    let intervals = estimates
        .into_iter()
        .map(|(name, values)| {
            let low = percentile(&values, tail);
            let high = percentile(&values, 100.0 - tail);
            (name, (low, high))
        })
        .collect();
    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mle_mean_is_arithmetic_mean() {
        let sample = [310.0, 295.0, 330.0, 285.0, 305.0];
        let fitted = fit_mle(&sample).unwrap();
        let expected = sample.iter().sum::<f64>() / sample.len() as f64;
        assert!((fitted.mean - expected).abs() < 1e-12);
    }

    #[test]
    fn mle_std_is_population_std() {
        let sample = [1.0, 2.0, 3.0, 4.0];
        let fitted = fit_mle(&sample).unwrap();
        assert!((fitted.std - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn mle_rejects_empty_sample() {
        assert!(matches!(
            fit_mle(&[]),
            Err(FitError::InsufficientData { actual: 0, .. })
        ));
    }

    #[test]
    fn bootstrap_low_never_exceeds_high() {
        let sample = [300.0, 310.0, 290.0, 305.0, 320.0, 295.0, 285.0, 315.0];
        let intervals =
            bootstrap_confidence_interval(&sample, &normal_estimator, 500, 0.95, 99).unwrap();
        for (name, (low, high)) in intervals {
            assert!(low <= high, "{name}: {low} > {high}");
        }
    }

    #[test]
    fn bootstrap_interval_shrinks_with_sample_size() {
        let mut stream = RandomStream::new(7);
        let small: Vec<f64> = (0..10)
            .map(|_| stream.normal(300.0, 30.0).unwrap())
            .collect();
        let large: Vec<f64> = (0..500)
            .map(|_| stream.normal(300.0, 30.0).unwrap())
            .collect();

        let small_ci =
            bootstrap_confidence_interval(&small, &normal_estimator, 400, 0.95, 1).unwrap();
        let large_ci =
            bootstrap_confidence_interval(&large, &normal_estimator, 400, 0.95, 1).unwrap();

        let width = |ci: &BTreeMap<&'static str, (f64, f64)>, name| {
            let (low, high) = ci[name];
            high - low
        };
        assert!(width(&large_ci, "mean") < width(&small_ci, "mean"));
        assert!(width(&large_ci, "std") < width(&small_ci, "std"));
    }

    #[test]
    fn bootstrap_rejects_undersized_sample() {
        assert!(matches!(
            bootstrap_confidence_interval(&[300.0], &normal_estimator, 100, 0.95, 0),
            Err(FitError::InsufficientData { required: 2, .. })
        ));
    }

    #[test]
    fn bootstrap_rejects_bad_confidence_level() {
        let sample = [1.0, 2.0, 3.0];
        for level in [0.0, 1.0, 1.5, f64::NAN] {
            assert!(matches!(
                bootstrap_confidence_interval(&sample, &normal_estimator, 100, level, 0),
                Err(FitError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn bootstrap_is_deterministic_given_seed() {
        let sample = [300.0, 310.0, 290.0, 305.0];
        let a = bootstrap_confidence_interval(&sample, &normal_estimator, 200, 0.9, 5).unwrap();
        let b = bootstrap_confidence_interval(&sample, &normal_estimator, 200, 0.9, 5).unwrap();
        assert_eq!(a, b);
    }
}
