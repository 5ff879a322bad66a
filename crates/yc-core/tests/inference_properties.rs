//! Property-based tests for fitting, seed derivation, and sampling.

use proptest::prelude::*;
use yc_core::inference::{bootstrap_confidence_interval, fit_mle, mote_rank, normal_estimator};
use yc_core::rng::{derive_seed, RandomStream};

fn sample_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1000.0, 2..64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// MLE mean is exactly the arithmetic mean.
    #[test]
    fn mle_mean_matches_arithmetic_mean(sample in sample_strategy()) {
        let fitted = fit_mle(&sample).expect("fit failed");
        let expected = sample.iter().sum::<f64>() / sample.len() as f64;
        prop_assert!((fitted.mean - expected).abs() < 1e-9);
        prop_assert!(fitted.std >= 0.0);
    }

    /// Bootstrap intervals are ordered for every parameter.
    #[test]
    fn bootstrap_intervals_are_ordered(
        sample in sample_strategy(),
        seed in any::<u64>(),
    ) {
        let intervals =
            bootstrap_confidence_interval(&sample, &normal_estimator, 100, 0.95, seed)
                .expect("bootstrap failed");
        for (name, (low, high)) in intervals {
            prop_assert!(low <= high, "{name}: {low} > {high}");
        }
    }

    /// Seed derivation is pure and index-sensitive.
    #[test]
    fn derive_seed_is_pure(master in any::<u64>(), index in 0u64..1000) {
        prop_assert_eq!(
            derive_seed(master, "chain", index),
            derive_seed(master, "chain", index)
        );
        prop_assert_ne!(
            derive_seed(master, "chain", index),
            derive_seed(master, "chain", index + 1)
        );
        prop_assert_ne!(
            derive_seed(master, "chain", index),
            derive_seed(master, "voi-batch", index)
        );
    }

    /// The MOTE rank formula reproduces the published rule on 3..=15.
    #[test]
    fn mote_rank_matches_rule(n in 3usize..=15) {
        let expected = match n {
            3..=5 => 1,
            6..=10 => 2,
            _ => 3,
        };
        prop_assert_eq!(mote_rank(n).unwrap(), expected);
    }

    /// Truncated normal draws never cross the lower bound.
    #[test]
    fn truncated_normal_respects_bound(
        seed in any::<u64>(),
        mean in -100.0f64..500.0,
        sd in 0.5f64..100.0,
        lower in -50.0f64..400.0,
    ) {
        let mut stream = RandomStream::new(seed);
        for _ in 0..20 {
            let draw = stream.truncated_normal_lower(mean, sd, lower).expect("draw failed");
            prop_assert!(draw >= lower);
        }
    }
}
