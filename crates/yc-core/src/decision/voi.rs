//! Expected value of perfect and imperfect information.
//!
//! Both computations compare the expected cost of deciding now against the
//! expected cost of deciding after more data:
//!
//! ```text
//! EVPI      = min_a E[cost(a)]  -  E_s[ min_a cost(a, s) ]
//! EVI(eps') = min_a E[cost(a)]  -  E_batches[ min_a E[cost(a) | batch, eps'] ]
//! ```
//!
//! EVPI treats each predictive draw as a perfectly revealed true strength and
//! is an upper bound on the value of any real test. The EVI sweep simulates
//! whole rounds of `n_tests` future measurements at a candidate precision,
//! re-runs the posterior on the augmented measurement set, and averages the
//! resulting minimum expected costs.

use crate::decision::expected_cost::{expected_costs, DecisionError};
use crate::events::{event_names, Phase, ProgressEmitter, ProgressEvent};
use crate::inference::hierarchical::{
    HierarchicalYieldModel, NoiseSpec, PosteriorEnsemble, PosteriorError,
};
use crate::rng::derive_seed;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use yc_config::{DecisionPolicy, SweepSettings};
use yc_math::{mean, standard_error};

use super::expected_cost::Action;

/// One hypothetical perfectly-revealed strength and the decision it implies.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiSample {
    pub hypothetical_measurement: f64,
    pub chosen_action: Action,
    pub expected_cost: f64,
}

/// EVPI summary plus the per-hypothetical samples behind it.
#[derive(Debug, Clone, Serialize)]
pub struct PerfectInformation {
    /// Minimum expected cost when deciding on the current posterior alone.
    pub prior_expected_cost: f64,
    /// Mean of the per-hypothetical minimum costs.
    pub posterior_mean_cost: f64,
    pub evpi: f64,
    pub samples: Vec<VoiSample>,
}

/// One point of the imperfect-information sweep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiSweepPoint {
    /// Candidate measurement noise (standard deviation, MPa).
    pub measurement_sd: f64,
    pub mean_expected_cost: f64,
    /// Monte-Carlo standard error over batches; 0 when only one batch ran.
    pub mc_standard_error: f64,
    pub value_of_information: f64,
    pub n_batches: usize,
}

/// Errors raised during value-of-information analysis.
#[derive(Debug, Error)]
pub enum VoiError {
    #[error("insufficient data for value-of-information: {message}")]
    InsufficientData { message: String },
    #[error("decision evaluation failed during {stage}")]
    Decision {
        stage: &'static str,
        #[source]
        source: DecisionError,
    },
    #[error("posterior update failed for batch {batch} at noise sd {noise_sd}")]
    Posterior {
        batch: usize,
        noise_sd: f64,
        #[source]
        source: PosteriorError,
    },
}

/// Expected value of perfect information over an ensemble's predictive draws.
///
/// Never negative up to floating-point rounding: the prior-optimal action is
/// always available for every hypothetical outcome.
pub fn perfect_information(
    ensemble: &PosteriorEnsemble,
    policy: &DecisionPolicy,
) -> Result<PerfectInformation, VoiError> {
    let yields = ensemble.predicted_yields();
    let baseline = expected_costs(&yields, policy).map_err(|source| VoiError::Decision {
        stage: "evpi_baseline",
        source,
    })?;
    let prior_expected_cost = baseline.optimal().expected_cost;

    let mut samples = Vec::with_capacity(yields.len());
    for strength in &yields {
        let result =
            expected_costs(std::slice::from_ref(strength), policy).map_err(|source| {
                VoiError::Decision {
                    stage: "evpi_hypothetical",
                    source,
                }
            })?;
        let optimal = result.optimal();
        samples.push(VoiSample {
            hypothetical_measurement: *strength,
            chosen_action: optimal.action,
            expected_cost: optimal.expected_cost,
        });
    }

    let costs: Vec<f64> = samples.iter().map(|s| s.expected_cost).collect();
    let posterior_mean_cost = mean(&costs);
    Ok(PerfectInformation {
        prior_expected_cost,
        posterior_mean_cost,
        evpi: prior_expected_cost - posterior_mean_cost,
        samples,
    })
}

/// Sweep the expected value of imperfect information over candidate test
/// precisions.
///
/// The prior ensemble's predictive draws are partitioned into disjoint
/// batches of `n_tests`; each batch plays the role of one future test round.
/// Per batch the measurement set is augmented with the batch (noise vector
/// extended with `n_tests` copies of the candidate sd) and the posterior is
/// re-sampled with the sweep's inner budget. Batch seeds derive from
/// `(master_seed, "voi-batch", level * n_batches + batch)`, so the sweep is
/// reproducible under any parallel schedule.
#[allow(clippy::too_many_arguments)]
pub fn sweep(
    model: &HierarchicalYieldModel,
    measurements: &[f64],
    noise: &NoiseSpec,
    prior_ensemble: &PosteriorEnsemble,
    policy: &DecisionPolicy,
    settings: &SweepSettings,
    master_seed: u64,
    emitter: Option<&dyn ProgressEmitter>,
) -> Result<Vec<VoiSweepPoint>, VoiError> {
    let yields = prior_ensemble.predicted_yields();
    let baseline = expected_costs(&yields, policy).map_err(|source| VoiError::Decision {
        stage: "sweep_baseline",
        source,
    })?;
    let prior_expected_cost = baseline.optimal().expected_cost;

    let available = yields.len() / settings.n_tests;
    let n_batches = settings
        .max_batches
        .map_or(available, |cap| available.min(cap));
    if n_batches == 0 {
        return Err(VoiError::InsufficientData {
            message: format!(
                "ensemble of {} predictive draws cannot fill one batch of {}",
                yields.len(),
                settings.n_tests
            ),
        });
    }

    let base_noise = noise
        .expand(measurements.len())
        .map_err(|source| VoiError::Posterior {
            batch: 0,
            noise_sd: f64::NAN,
            source,
        })?;

    if let Some(emitter) = emitter {
        emitter.emit(
            ProgressEvent::new(event_names::SWEEP_STARTED, Phase::Voi)
                .with_progress(0, Some(settings.candidate_noise_sds.len() as u64))
                .with_detail("n_batches", n_batches),
        );
    }

    let mut points = Vec::with_capacity(settings.candidate_noise_sds.len());
    for (level, noise_sd) in settings.candidate_noise_sds.iter().enumerate() {
        let costs: Result<Vec<f64>, VoiError> = (0..n_batches)
            .into_par_iter()
            .map(|batch| {
                let hypothetical = &yields[batch * settings.n_tests..(batch + 1) * settings.n_tests];
                let mut augmented = Vec::with_capacity(measurements.len() + settings.n_tests);
                augmented.extend_from_slice(measurements);
                augmented.extend_from_slice(hypothetical);
                let mut augmented_noise = base_noise.clone();
                augmented_noise.extend(std::iter::repeat_n(*noise_sd, settings.n_tests));

                let seed = derive_seed(
                    master_seed,
                    "voi-batch",
                    (level * n_batches + batch) as u64,
                );
                let updated = model
                    .posterior_sample(
                        &augmented,
                        &NoiseSpec::PerObservation(augmented_noise),
                        &settings.inner_sampler,
                        seed,
                        None,
                    )
                    .map_err(|source| VoiError::Posterior {
                        batch,
                        noise_sd: *noise_sd,
                        source,
                    })?;
                let result = expected_costs(&updated.predicted_yields(), policy).map_err(
                    |source| VoiError::Decision {
                        stage: "sweep_batch",
                        source,
                    },
                )?;
                Ok(result.optimal().expected_cost)
            })
            .collect();
        let costs = costs?;

        let mean_expected_cost = mean(&costs);
        let mc_standard_error = if costs.len() >= 2 {
            standard_error(&costs)
        } else {
            0.0
        };
        points.push(VoiSweepPoint {
            measurement_sd: *noise_sd,
            mean_expected_cost,
            mc_standard_error,
            value_of_information: prior_expected_cost - mean_expected_cost,
            n_batches,
        });

        if let Some(emitter) = emitter {
            emitter.emit(
                ProgressEvent::new(event_names::SWEEP_LEVEL_COMPLETE, Phase::Voi)
                    .with_progress(
                        level as u64 + 1,
                        Some(settings.candidate_noise_sds.len() as u64),
                    )
                    .with_detail("noise_sd", noise_sd),
            );
        }
    }

    if let Some(emitter) = emitter {
        emitter.emit(ProgressEvent::new(event_names::SWEEP_COMPLETE, Phase::Voi));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::hierarchical::PosteriorSample;
    use yc_config::{SamplerSettings, YieldPriors};

    fn synthetic_ensemble(yields: &[f64]) -> PosteriorEnsemble {
        let samples = yields
            .iter()
            .enumerate()
            .map(|(i, y)| PosteriorSample {
                chain_id: 0,
                iteration_id: i,
                mu: 300.0,
                sigma: 50.0,
                predicted_yield: *y,
            })
            .collect();
        PosteriorEnsemble { samples }
    }

    #[test]
    fn evpi_is_nonnegative_for_bimodal_ensemble() {
        // Half the mass can be rescued by change_operation, half is safe
        // as-is; knowing which side you are on is worth real money.
        let yields: Vec<f64> = (0..500)
            .map(|i| if i % 2 == 0 { 250.0 } else { 400.0 })
            .collect();
        let info =
            perfect_information(&synthetic_ensemble(&yields), &DecisionPolicy::default()).unwrap();
        assert!(info.evpi >= 0.0, "EVPI {} negative", info.evpi);
        assert!(info.evpi > 0.0, "bimodal ensemble should make information valuable");
        assert_eq!(info.samples.len(), yields.len());
    }

    #[test]
    fn evpi_is_zero_when_decision_is_already_settled() {
        let yields = vec![400.0; 200];
        let info =
            perfect_information(&synthetic_ensemble(&yields), &DecisionPolicy::default()).unwrap();
        assert_eq!(info.evpi, 0.0);
        assert!(info
            .samples
            .iter()
            .all(|s| s.chosen_action == Action::NoAction));
    }

    #[test]
    fn evpi_rejects_empty_ensemble() {
        let empty = PosteriorEnsemble { samples: Vec::new() };
        assert!(matches!(
            perfect_information(&empty, &DecisionPolicy::default()),
            Err(VoiError::Decision { .. })
        ));
    }

    #[test]
    fn sweep_rejects_ensemble_smaller_than_one_batch() {
        let model = HierarchicalYieldModel::new(YieldPriors::default());
        let settings = SweepSettings {
            n_tests: 6,
            ..SweepSettings::default()
        };
        let tiny = synthetic_ensemble(&[350.0, 360.0]);
        let result = sweep(
            &model,
            &[340.0],
            &NoiseSpec::Scalar(5.0),
            &tiny,
            &DecisionPolicy::default(),
            &settings,
            0,
            None,
        );
        assert!(matches!(result, Err(VoiError::InsufficientData { .. })));
    }

    #[test]
    fn sweep_is_monotone_within_monte_carlo_tolerance() {
        let model = HierarchicalYieldModel::new(YieldPriors::default());
        let measurements = [305.0, 312.0, 298.0, 308.0, 303.0, 310.0];
        let noise = NoiseSpec::Scalar(5.0);
        let outer = SamplerSettings {
            n_chains: 2,
            n_draws_per_chain: 200,
            n_warmup: 200,
        };
        let ensemble = model
            .posterior_sample(&measurements, &noise, &outer, 13, None)
            .unwrap();

        let settings = SweepSettings {
            candidate_noise_sds: vec![1.0, 30.0],
            n_tests: 6,
            max_batches: Some(10),
            inner_sampler: SamplerSettings {
                n_chains: 2,
                n_draws_per_chain: 150,
                n_warmup: 150,
            },
        };
        let points = sweep(
            &model,
            &measurements,
            &noise,
            &ensemble,
            &DecisionPolicy::default(),
            &settings,
            13,
            None,
        )
        .unwrap();

        assert_eq!(points.len(), 2);
        for point in &points {
            assert!(point.value_of_information.is_finite());
            assert_eq!(point.n_batches, 10);
        }
        let precise = &points[0];
        let coarse = &points[1];
        let tolerance = 3.0 * (precise.mc_standard_error + coarse.mc_standard_error);
        assert!(
            precise.value_of_information >= coarse.value_of_information - tolerance,
            "EVI({}) = {} < EVI({}) = {} beyond tolerance {}",
            precise.measurement_sd,
            precise.value_of_information,
            coarse.measurement_sd,
            coarse.value_of_information,
            tolerance
        );
    }

    #[test]
    fn sweep_is_deterministic_for_fixed_seed() {
        let model = HierarchicalYieldModel::new(YieldPriors::default());
        let measurements = [305.0, 312.0, 298.0];
        let noise = NoiseSpec::Scalar(5.0);
        let outer = SamplerSettings {
            n_chains: 1,
            n_draws_per_chain: 60,
            n_warmup: 100,
        };
        let ensemble = model
            .posterior_sample(&measurements, &noise, &outer, 5, None)
            .unwrap();
        let settings = SweepSettings {
            candidate_noise_sds: vec![5.0],
            n_tests: 6,
            max_batches: Some(5),
            inner_sampler: SamplerSettings {
                n_chains: 1,
                n_draws_per_chain: 80,
                n_warmup: 80,
            },
        };
        let run = |seed| {
            sweep(
                &model,
                &measurements,
                &noise,
                &ensemble,
                &DecisionPolicy::default(),
                &settings,
                seed,
                None,
            )
            .unwrap()
        };
        let a = run(99);
        let b = run(99);
        assert_eq!(a[0].mean_expected_cost.to_bits(), b[0].mean_expected_cost.to_bits());
        assert_eq!(a[0].value_of_information.to_bits(), b[0].value_of_information.to_bits());
    }
}
