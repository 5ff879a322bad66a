//! Prior configuration for the hierarchical yield model.

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

/// Hyperparameters of the hierarchical yield-strength model.
///
/// The generative structure is:
///
/// ```text
/// mu    ~ Normal(mu_mean, mu_sd)
/// sigma ~ Exponential(sigma_rate)
/// y_i   ~ Normal(mu, sigma)
/// m_i   ~ Normal(y_i, epsilon_i)
/// ```
///
/// where `epsilon_i` defaults to `measurement_noise_sd` for historical data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YieldPriors {
    /// Prior mean of the population mean yield strength (MPa).
    pub mu_mean: f64,

    /// Prior standard deviation of the population mean (MPa).
    pub mu_sd: f64,

    /// Rate of the Exponential prior on the population standard deviation.
    /// A rate of 0.02 puts the prior mean spread at 50 MPa.
    pub sigma_rate: f64,

    /// Known standard deviation of the measurement process (MPa).
    pub measurement_noise_sd: f64,
}

impl Default for YieldPriors {
    fn default() -> Self {
        Self {
            mu_mean: 300.0,
            mu_sd: 100.0,
            sigma_rate: 1.0 / 50.0,
            measurement_noise_sd: 5.0,
        }
    }
}

impl YieldPriors {
    pub fn validate(&self) -> ValidationResult<()> {
        for (field, value) in [
            ("priors.mu_mean", self.mu_mean),
            ("priors.mu_sd", self.mu_sd),
            ("priors.sigma_rate", self.sigma_rate),
            ("priors.measurement_noise_sd", self.measurement_noise_sd),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("must be finite, got {value}"),
                });
            }
        }
        for (field, value) in [
            ("priors.mu_sd", self.mu_sd),
            ("priors.sigma_rate", self.sigma_rate),
            ("priors.measurement_noise_sd", self.measurement_noise_sd),
        ] {
            if value <= 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("must be positive, got {value}"),
                });
            }
        }
        Ok(())
    }
}
