//! Hierarchical yield-strength model and posterior sampling.
//!
//! Generative structure:
//!
//! ```text
//! mu    ~ Normal(mu_mean, mu_sd)            population mean
//! sigma ~ Exponential(sigma_rate)           population spread
//! y_i   ~ Normal(mu, sigma)                 latent true strengths
//! m_i   ~ Normal(y_i, epsilon_i)            noisy measurements, known noise
//! ```
//!
//! The joint posterior over `(mu, sigma, y_1..y_N)` is sampled with
//! Metropolis-within-Gibbs: the full conditionals of `mu` and each `y_i` are
//! conjugate Normals and are sampled exactly; `sigma` carries an Exponential
//! prior and moves by random-walk Metropolis on `ln sigma`.
//!
//! Chains are independent given their derived seeds and run in parallel;
//! results are concatenated in chain order, so the ensemble is identical
//! however the chains are scheduled.

use crate::events::{event_names, Phase, ProgressEmitter, ProgressEvent};
use crate::rng::{derive_seed, RandomStream, SampleError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use yc_config::{SamplerSettings, YieldPriors};
use yc_math::{exponential_log_pdf, mean, normal_log_pdf, std_sample};

/// Scale of the random-walk proposal on `ln sigma`.
const LOG_SIGMA_STEP: f64 = 0.25;

/// Per-observation measurement noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NoiseSpec {
    /// One known noise sd for every measurement.
    Scalar(f64),
    /// A noise sd per measurement, e.g. historical data at 5.0 MPa mixed
    /// with synthetic future tests at another precision.
    PerObservation(Vec<f64>),
}

impl NoiseSpec {
    /// Expand to one sd per measurement, validating domain and length.
    pub fn expand(&self, n_measurements: usize) -> Result<Vec<f64>, PosteriorError> {
        let noise = match self {
            NoiseSpec::Scalar(sd) => vec![*sd; n_measurements],
            NoiseSpec::PerObservation(sds) => {
                if sds.len() != n_measurements {
                    return Err(PosteriorError::NoiseLengthMismatch {
                        noise_len: sds.len(),
                        measurement_len: n_measurements,
                    });
                }
                sds.clone()
            }
        };
        for sd in &noise {
            if !sd.is_finite() || *sd <= 0.0 {
                return Err(PosteriorError::InvalidParameter {
                    field: "noise_sd",
                    message: format!("must be positive and finite, got {sd}"),
                });
            }
        }
        Ok(noise)
    }
}

/// One retained posterior draw.
///
/// `predicted_yield` is a predictive sample from
/// `Normal(mu, sigma)` truncated to `[0, inf)`, re-drawn independently for
/// every retained iteration. Decision logic consumes this quantity, not the
/// latent parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PosteriorSample {
    pub chain_id: usize,
    pub iteration_id: usize,
    pub mu: f64,
    pub sigma: f64,
    pub predicted_yield: f64,
}

/// Ordered collection of posterior draws, `n_chains * n_draws_per_chain` long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorEnsemble {
    pub samples: Vec<PosteriorSample>,
}

impl PosteriorEnsemble {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The predictive yield-strength samples, in draw order.
    pub fn predicted_yields(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.predicted_yield).collect()
    }

    /// Joint `(mu, sigma)` pairs, in draw order.
    pub fn mu_sigma_pairs(&self) -> Vec<(f64, f64)> {
        self.samples.iter().map(|s| (s.mu, s.sigma)).collect()
    }

    /// Draws of one chain, in iteration order.
    pub fn chain(&self, chain_id: usize) -> Vec<&PosteriorSample> {
        self.samples
            .iter()
            .filter(|s| s.chain_id == chain_id)
            .collect()
    }

    pub fn n_chains(&self) -> usize {
        self.samples
            .iter()
            .map(|s| s.chain_id + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Errors raised during posterior sampling.
#[derive(Debug, Error)]
pub enum PosteriorError {
    #[error("insufficient data: posterior update needs at least one measurement")]
    InsufficientData,
    #[error("invalid parameter {field}: {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },
    #[error("noise vector length {noise_len} does not match {measurement_len} measurements")]
    NoiseLengthMismatch {
        noise_len: usize,
        measurement_len: usize,
    },
    #[error("non-finite posterior density in chain {chain} at iteration {iteration}")]
    Divergence { chain: usize, iteration: usize },
}

impl From<SampleError> for PosteriorError {
    fn from(err: SampleError) -> Self {
        match err {
            SampleError::InvalidParameter { field, value, .. } => PosteriorError::InvalidParameter {
                field,
                message: format!("out of domain: {value}"),
            },
        }
    }
}

/// The hierarchical model, parameterized by its priors.
#[derive(Debug, Clone)]
pub struct HierarchicalYieldModel {
    priors: YieldPriors,
}

impl HierarchicalYieldModel {
    pub fn new(priors: YieldPriors) -> Self {
        Self { priors }
    }

    pub fn priors(&self) -> &YieldPriors {
        &self.priors
    }

    /// Sample the joint posterior over `(mu, sigma, y_1..y_N)`.
    ///
    /// Runs `settings.n_chains` independent chains (seed =
    /// `derive_seed(master_seed, "chain", k)`) in parallel, discards
    /// `settings.n_warmup` iterations each, and retains
    /// `settings.n_draws_per_chain` draws with one predictive yield sample
    /// per draw.
    ///
    /// # Errors
    /// * `InsufficientData` for an empty measurement set
    /// * `InvalidParameter` / `NoiseLengthMismatch` for bad noise input
    /// * `Divergence` if the joint log density turns non-finite after warmup
    pub fn posterior_sample(
        &self,
        measurements: &[f64],
        noise: &NoiseSpec,
        settings: &SamplerSettings,
        master_seed: u64,
        emitter: Option<&dyn ProgressEmitter>,
    ) -> Result<PosteriorEnsemble, PosteriorError> {
        if measurements.is_empty() {
            return Err(PosteriorError::InsufficientData);
        }
        let noise = noise.expand(measurements.len())?;

        if let Some(emitter) = emitter {
            emitter.emit(
                ProgressEvent::new(event_names::POSTERIOR_STARTED, Phase::Posterior)
                    .with_progress(0, Some(settings.n_chains as u64))
                    .with_detail("n_measurements", measurements.len()),
            );
        }

        let chains: Result<Vec<Vec<PosteriorSample>>, PosteriorError> = (0..settings.n_chains)
            .into_par_iter()
            .map(|chain_id| {
                let seed = derive_seed(master_seed, "chain", chain_id as u64);
                let draws =
                    self.run_chain(measurements, &noise, settings, chain_id, seed)?;
                if let Some(emitter) = emitter {
                    emitter.emit(
                        ProgressEvent::new(event_names::POSTERIOR_CHAIN_COMPLETE, Phase::Posterior)
                            .with_progress(chain_id as u64 + 1, Some(settings.n_chains as u64)),
                    );
                }
                Ok(draws)
            })
            .collect();

        let samples: Vec<PosteriorSample> = chains?.into_iter().flatten().collect();
        if let Some(emitter) = emitter {
            emitter.emit(
                ProgressEvent::new(event_names::POSTERIOR_COMPLETE, Phase::Posterior)
                    .with_detail("n_draws", samples.len()),
            );
        }
        Ok(PosteriorEnsemble { samples })
    }

    /// Draw `n` prior-predictive yield strengths.
    ///
    /// Each draw samples `(mu, sigma)` from the priors and one truncated
    /// Normal yield from them.
    pub fn prior_predictive(&self, n: usize, seed: u64) -> Result<Vec<f64>, PosteriorError> {
        let mut stream = RandomStream::new(seed);
        let mut draws = Vec::with_capacity(n);
        for _ in 0..n {
            let mu = stream.normal(self.priors.mu_mean, self.priors.mu_sd)?;
            let sigma = stream.exponential(self.priors.sigma_rate)?;
            draws.push(stream.truncated_normal_lower(mu, sigma, 0.0)?);
        }
        Ok(draws)
    }

    fn run_chain(
        &self,
        measurements: &[f64],
        noise: &[f64],
        settings: &SamplerSettings,
        chain_id: usize,
        seed: u64,
    ) -> Result<Vec<PosteriorSample>, PosteriorError> {
        let mut stream = RandomStream::new(seed);
        let n = measurements.len();
        let priors = &self.priors;

        // Start at the data: sample mean, sample spread (prior mean spread
        // when a single measurement gives no spread information).
        let mut mu = mean(measurements);
        let sample_sd = std_sample(measurements);
        let mut sigma = if sample_sd.is_finite() && sample_sd > 0.0 {
            sample_sd
        } else {
            1.0 / priors.sigma_rate
        };
        let mut latent = measurements.to_vec();

        let mu_prior_precision = 1.0 / (priors.mu_sd * priors.mu_sd);
        let total = settings.n_warmup + settings.n_draws_per_chain;
        let mut draws = Vec::with_capacity(settings.n_draws_per_chain);

        for iteration in 0..total {
            // Latent strengths: conjugate Normal update per observation.
            let sigma_precision = 1.0 / (sigma * sigma);
            for i in 0..n {
                let noise_precision = 1.0 / (noise[i] * noise[i]);
                let precision = sigma_precision + noise_precision;
                let conditional_mean =
                    (mu * sigma_precision + measurements[i] * noise_precision) / precision;
                latent[i] = stream.normal(conditional_mean, (1.0 / precision).sqrt())?;
            }

            // Population mean: conjugate Normal update.
            let latent_sum: f64 = latent.iter().sum();
            let precision = mu_prior_precision + n as f64 * sigma_precision;
            let conditional_mean =
                (priors.mu_mean * mu_prior_precision + latent_sum * sigma_precision) / precision;
            mu = stream.normal(conditional_mean, (1.0 / precision).sqrt())?;

            // Population spread: random-walk Metropolis on ln sigma.
            let proposal = sigma * (LOG_SIGMA_STEP * stream.normal(0.0, 1.0)?).exp();
            let current_target = log_sigma_target(sigma, mu, &latent, priors.sigma_rate);
            let proposal_target = log_sigma_target(proposal, mu, &latent, priors.sigma_rate);
            if stream.uniform().ln() < proposal_target - current_target {
                sigma = proposal;
            }

            if iteration < settings.n_warmup {
                continue;
            }

            let iteration_id = iteration - settings.n_warmup;
            let log_density =
                joint_log_density(mu, sigma, &latent, measurements, noise, priors);
            if !log_density.is_finite() {
                return Err(PosteriorError::Divergence {
                    chain: chain_id,
                    iteration: iteration_id,
                });
            }

            let predicted_yield = stream.truncated_normal_lower(mu, sigma, 0.0)?;
            draws.push(PosteriorSample {
                chain_id,
                iteration_id,
                mu,
                sigma,
                predicted_yield,
            });
        }
        Ok(draws)
    }
}

/// Unnormalized log conditional of sigma given `(mu, y)`, on the sigma scale
/// with the ln-sigma Jacobian folded in.
fn log_sigma_target(sigma: f64, mu: f64, latent: &[f64], sigma_rate: f64) -> f64 {
    if sigma <= 0.0 || !sigma.is_finite() {
        return f64::NEG_INFINITY;
    }
    let mut target = exponential_log_pdf(sigma, sigma_rate) + sigma.ln();
    for y in latent {
        target += normal_log_pdf(*y, mu, sigma);
    }
    target
}

/// Joint log density of the full state, used as the divergence check.
fn joint_log_density(
    mu: f64,
    sigma: f64,
    latent: &[f64],
    measurements: &[f64],
    noise: &[f64],
    priors: &YieldPriors,
) -> f64 {
    let mut density = normal_log_pdf(mu, priors.mu_mean, priors.mu_sd)
        + exponential_log_pdf(sigma, priors.sigma_rate);
    for ((y, m), eps) in latent.iter().zip(measurements).zip(noise) {
        density += normal_log_pdf(*y, mu, sigma) + normal_log_pdf(*m, *y, *eps);
    }
    density
}
