//! Sampler and value-of-information sweep settings.

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

/// MCMC budget for one posterior run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    /// Number of independent chains.
    pub n_chains: usize,

    /// Retained draws per chain.
    pub n_draws_per_chain: usize,

    /// Discarded warmup iterations per chain.
    pub n_warmup: usize,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            n_chains: 4,
            n_draws_per_chain: 1000,
            n_warmup: 1000,
        }
    }
}

impl SamplerSettings {
    /// Total retained draws across all chains.
    pub fn total_draws(&self) -> usize {
        self.n_chains * self.n_draws_per_chain
    }

    pub fn validate(&self) -> ValidationResult<()> {
        for (field, value) in [
            ("sampler.n_chains", self.n_chains),
            ("sampler.n_draws_per_chain", self.n_draws_per_chain),
        ] {
            if value == 0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Settings for the expected-value-of-information sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Candidate measurement-noise levels (standard deviation, MPa).
    pub candidate_noise_sds: Vec<f64>,

    /// Number of hypothetical measurements per simulated test round.
    pub n_tests: usize,

    /// Upper bound on batches per noise level. `None` uses every disjoint
    /// batch the ensemble can supply.
    #[serde(default)]
    pub max_batches: Option<usize>,

    /// MCMC budget for the per-batch posterior updates. The inner loop runs
    /// once per batch per noise level, so this is usually much smaller than
    /// the outer sampler budget.
    pub inner_sampler: SamplerSettings,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            candidate_noise_sds: vec![1.0, 5.0, 10.0, 20.0, 30.0],
            n_tests: 6,
            max_batches: Some(40),
            inner_sampler: SamplerSettings {
                n_chains: 2,
                n_draws_per_chain: 250,
                n_warmup: 250,
            },
        }
    }
}

impl SweepSettings {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.candidate_noise_sds.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "sweep.candidate_noise_sds".to_string(),
                message: "must list at least one noise level".to_string(),
            });
        }
        for sd in &self.candidate_noise_sds {
            if !sd.is_finite() || *sd <= 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: "sweep.candidate_noise_sds".to_string(),
                    message: format!("noise levels must be positive and finite, got {sd}"),
                });
            }
        }
        if self.n_tests == 0 {
            return Err(ValidationError::InvalidValue {
                field: "sweep.n_tests".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_batches == Some(0) {
            return Err(ValidationError::InvalidValue {
                field: "sweep.max_batches".to_string(),
                message: "must be at least 1 when set".to_string(),
            });
        }
        self.inner_sampler.validate()
    }
}
