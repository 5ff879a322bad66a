//! Property-based tests for yc-math summary statistics.

use proptest::prelude::*;
use yc_math::{histogram, mean, normal_log_pdf, percentile, std_population};

fn finite_samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 1..200)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Percentiles never leave the observed range.
    #[test]
    fn percentile_is_bounded(xs in finite_samples(), p in 0.0f64..100.0) {
        let lo = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let q = percentile(&xs, p);
        prop_assert!(q >= lo - 1e-9);
        prop_assert!(q <= hi + 1e-9);
    }

    /// The mean lies within the observed range.
    #[test]
    fn mean_is_bounded(xs in finite_samples()) {
        let lo = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let m = mean(&xs);
        prop_assert!(m >= lo - 1e-9);
        prop_assert!(m <= hi + 1e-9);
    }

    /// Standard deviation is nonnegative and finite for finite input.
    #[test]
    fn std_is_nonnegative(xs in finite_samples()) {
        let sd = std_population(&xs);
        prop_assert!(sd >= 0.0);
        prop_assert!(sd.is_finite());
    }

    /// Histograms never gain or lose observations.
    #[test]
    fn histogram_mass_is_conserved(xs in finite_samples(), n_bins in 1usize..64) {
        let total: usize = histogram(&xs, n_bins).iter().map(|b| b.count).sum();
        prop_assert_eq!(total, xs.len());
    }

    /// Normal log density is finite on its valid domain.
    #[test]
    fn normal_log_pdf_is_finite(
        x in -1.0e4f64..1.0e4,
        mean in -1.0e4f64..1.0e4,
        sd in 1.0e-3f64..1.0e4,
    ) {
        prop_assert!(normal_log_pdf(x, mean, sd).is_finite());
    }
}
