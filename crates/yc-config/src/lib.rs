//! Yieldcast configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the prior, decision-policy, and sampler settings
//! - TOML loading with built-in defaults
//! - Semantic validation

pub mod policy;
pub mod priors;
pub mod settings;
pub mod validate;

pub use policy::{ActionCost, CostTable, DecisionPolicy};
pub use priors::YieldPriors;
pub use settings::{SamplerSettings, SweepSettings};
pub use validate::{ValidationError, ValidationResult};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

fn default_schema_version() -> String {
    CONFIG_SCHEMA_VERSION.to_string()
}

/// Complete configuration: priors, decision policy, sampler and sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub priors: YieldPriors,

    #[serde(default)]
    pub policy: DecisionPolicy,

    #[serde(default)]
    pub sampler: SamplerSettings,

    #[serde(default)]
    pub sweep: SweepSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            description: None,
            priors: YieldPriors::default(),
            policy: DecisionPolicy::default(),
            sampler: SamplerSettings::default(),
            sweep: SweepSettings::default(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file and validate it.
    pub fn load_from_path(path: &Path) -> ValidationResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ValidationError::IoError(format!("{}: {e}", path.display())))?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| ValidationError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic validation of all sections.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.schema_version != CONFIG_SCHEMA_VERSION {
            return Err(ValidationError::VersionMismatch {
                expected: CONFIG_SCHEMA_VERSION.to_string(),
                actual: self.schema_version.clone(),
            });
        }
        self.priors.validate()?;
        self.policy.validate()?;
        self.sampler.validate()?;
        self.sweep.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().expect("defaults must be valid");
    }

    #[test]
    fn toml_round_trip() {
        let config = Config::default();
        let raw = toml::to_string(&config).expect("serialize");
        let parsed: Config = toml::from_str(&raw).expect("parse");
        parsed.validate().expect("round-tripped config is valid");
        assert_eq!(parsed.priors.mu_mean, config.priors.mu_mean);
        assert_eq!(parsed.sweep.candidate_noise_sds, config.sweep.candidate_noise_sds);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [policy]
            threshold_mpa = 275.0
            "#,
        )
        .expect("parse");
        assert_eq!(parsed.policy.threshold_mpa, 275.0);
        assert_eq!(parsed.priors.mu_mean, YieldPriors::default().mu_mean);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let config = Config {
            schema_version: "0.9.0".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::VersionMismatch { .. })
        ));
    }
}
