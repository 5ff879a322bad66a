//! Characteristic-value selection by the MOTE order-statistic rule.
//!
//! MOTE (Minimum Of Three Equivalent) picks a conservative characteristic
//! value from a small test series: the lowest result of n = 3..5 tests, the
//! second-lowest of n = 6..10, the third-lowest of n = 11..15. The rank
//! formula `ceil(n / 5)` reproduces that table on its whole domain and is
//! held at rank 3 for larger series.

use crate::rng::RandomStream;
use serde::Serialize;
use thiserror::Error;

/// Fewest tests the rule is defined for.
pub const MIN_TESTS: usize = 3;

/// Errors raised during characteristic-value selection.
#[derive(Debug, Error)]
pub enum MoteError {
    #[error("insufficient data for MOTE: need at least {required} tests, got {actual}")]
    InsufficientData { required: usize, actual: usize },
}

/// 1-based order-statistic rank for a series of `n` tests.
pub fn mote_rank(n: usize) -> Result<usize, MoteError> {
    if n < MIN_TESTS {
        return Err(MoteError::InsufficientData {
            required: MIN_TESTS,
            actual: n,
        });
    }
    Ok(n.div_ceil(5).min(3))
}

/// Characteristic value of a test series: its `mote_rank`-th lowest result.
pub fn mote(sample: &[f64]) -> Result<f64, MoteError> {
    let rank = mote_rank(sample.len())?;
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(sorted[rank - 1])
}

/// One point of the MOTE-versus-series-size scatter.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MotePoint {
    pub n_tests: usize,
    pub mote: f64,
}

/// Scatter of characteristic values over subsampled series sizes.
///
/// For each series size from [`MIN_TESTS`] up to `min(15, len)`, draws
/// `n_resamples` random subsets (without replacement) of the measurements and
/// records the MOTE of each, showing how the characteristic value stabilizes
/// as a test program grows.
pub fn mote_scatter(
    measurements: &[f64],
    n_resamples: usize,
    seed: u64,
) -> Result<Vec<MotePoint>, MoteError> {
    if measurements.len() < MIN_TESTS {
        return Err(MoteError::InsufficientData {
            required: MIN_TESTS,
            actual: measurements.len(),
        });
    }
    let mut stream = RandomStream::new(seed);
    let mut indices: Vec<usize> = (0..measurements.len()).collect();
    let mut points = Vec::new();
    for n_tests in MIN_TESTS..=measurements.len().min(15) {
        for _ in 0..n_resamples {
            // Partial Fisher-Yates: the first n_tests slots become the subset.
            for slot in 0..n_tests {
                let pick = slot + stream.resample_index(indices.len() - slot);
                indices.swap(slot, pick);
            }
            let subset: Vec<f64> = indices[..n_tests]
                .iter()
                .map(|i| measurements[*i])
                .collect();
            points.push(MotePoint {
                n_tests,
                mote: mote(&subset)?,
            });
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_matches_rule_at_every_boundary() {
        // lowest of 3-5, second-lowest of 6-10, third-lowest of 11-15
        assert_eq!(mote_rank(3).unwrap(), 1);
        assert_eq!(mote_rank(5).unwrap(), 1);
        assert_eq!(mote_rank(6).unwrap(), 2);
        assert_eq!(mote_rank(10).unwrap(), 2);
        assert_eq!(mote_rank(11).unwrap(), 3);
        assert_eq!(mote_rank(15).unwrap(), 3);
    }

    #[test]
    fn rank_saturates_for_long_series() {
        assert_eq!(mote_rank(16).unwrap(), 3);
        assert_eq!(mote_rank(100).unwrap(), 3);
    }

    #[test]
    fn too_few_tests_rejected() {
        assert!(matches!(
            mote_rank(2),
            Err(MoteError::InsufficientData { required: 3, actual: 2 })
        ));
        assert!(mote(&[300.0, 310.0]).is_err());
    }

    #[test]
    fn mote_picks_expected_order_statistic() {
        let five = [320.0, 290.0, 310.0, 305.0, 340.0];
        assert_eq!(mote(&five).unwrap(), 290.0);

        let six = [320.0, 290.0, 310.0, 305.0, 340.0, 335.0];
        assert_eq!(mote(&six).unwrap(), 305.0);
    }

    #[test]
    fn scatter_covers_each_series_size() {
        let measurements: Vec<f64> = (0..12).map(|i| 300.0 + i as f64).collect();
        let points = mote_scatter(&measurements, 4, 17).unwrap();
        assert_eq!(points.len(), (3..=12).count() * 4);
        for point in &points {
            assert!(point.n_tests >= 3 && point.n_tests <= 12);
            assert!(measurements.contains(&point.mote));
        }
    }

    #[test]
    fn scatter_is_deterministic() {
        let measurements: Vec<f64> = (0..10).map(|i| 280.0 + 3.0 * i as f64).collect();
        let a = mote_scatter(&measurements, 3, 5).unwrap();
        let b = mote_scatter(&measurements, 3, 5).unwrap();
        assert_eq!(
            a.iter().map(|p| p.mote).collect::<Vec<_>>(),
            b.iter().map(|p| p.mote).collect::<Vec<_>>()
        );
    }
}
