//! Property-based tests for decisioning and value of information.

use proptest::prelude::*;
use yc_config::DecisionPolicy;
use yc_core::decision::{expected_costs, perfect_information};
use yc_core::inference::hierarchical::{PosteriorEnsemble, PosteriorSample};

fn yields_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..800.0, 1..256)
}

fn synthetic_ensemble(yields: &[f64]) -> PosteriorEnsemble {
    PosteriorEnsemble {
        samples: yields
            .iter()
            .enumerate()
            .map(|(i, y)| PosteriorSample {
                chain_id: 0,
                iteration_id: i,
                mu: 300.0,
                sigma: 50.0,
                predicted_yield: *y,
            })
            .collect(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Failure probabilities are proper probabilities and the optimal action
    /// never costs more than any other.
    #[test]
    fn expected_costs_are_coherent(yields in yields_strategy()) {
        let result = expected_costs(&yields, &DecisionPolicy::default()).expect("decision failed");
        let optimal = result.optimal();
        for outcome in &result.outcomes {
            prop_assert!((0.0..=1.0).contains(&outcome.p_fail));
            prop_assert!(outcome.expected_cost.is_finite());
            prop_assert!(optimal.expected_cost <= outcome.expected_cost);
        }
    }

    /// Decisioning is a pure function of its inputs.
    #[test]
    fn expected_costs_is_deterministic(yields in yields_strategy()) {
        let policy = DecisionPolicy::default();
        let a = expected_costs(&yields, &policy).expect("first run failed");
        let b = expected_costs(&yields, &policy).expect("second run failed");
        prop_assert_eq!(a, b);
    }

    /// Information never has negative value: the prior-optimal action is
    /// always still available once the truth is revealed.
    #[test]
    fn evpi_is_nonnegative(yields in yields_strategy()) {
        let info = perfect_information(&synthetic_ensemble(&yields), &DecisionPolicy::default())
            .expect("EVPI failed");
        prop_assert!(info.evpi >= -1e-9, "EVPI {} negative", info.evpi);
        prop_assert_eq!(info.samples.len(), yields.len());
    }
}
