//! Optional on-disk cache for posterior ensembles.
//!
//! Posterior sampling dominates runtime, so repeated runs over the same
//! inputs can reuse the stored ensemble. The cache key fingerprints every
//! input that affects the draw: measurements, noise, priors, sampler budget,
//! and the master seed. Any change misses and triggers a fresh run;
//! correctness never depends on the cache.

use crate::inference::hierarchical::{NoiseSpec, PosteriorEnsemble};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use yc_config::{SamplerSettings, YieldPriors};

/// Errors raised by cache I/O.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cache entry at {path} is not valid JSON: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A cached ensemble with provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedEnsemble {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub ensemble: PosteriorEnsemble,
}

/// Directory-backed ensemble cache.
#[derive(Debug, Clone)]
pub struct EnsembleCache {
    dir: PathBuf,
}

impl EnsembleCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Fingerprint of every input that shapes a posterior run.
    pub fn key(
        measurements: &[f64],
        noise: &NoiseSpec,
        priors: &YieldPriors,
        settings: &SamplerSettings,
        master_seed: u64,
    ) -> String {
        let mut fp = Fingerprint::new();
        for m in measurements {
            fp.write_f64(*m);
        }
        match noise {
            NoiseSpec::Scalar(sd) => {
                fp.write_u64(1);
                fp.write_f64(*sd);
            }
            NoiseSpec::PerObservation(sds) => {
                fp.write_u64(2);
                for sd in sds {
                    fp.write_f64(*sd);
                }
            }
        }
        fp.write_f64(priors.mu_mean);
        fp.write_f64(priors.mu_sd);
        fp.write_f64(priors.sigma_rate);
        fp.write_f64(priors.measurement_noise_sd);
        fp.write_u64(settings.n_chains as u64);
        fp.write_u64(settings.n_draws_per_chain as u64);
        fp.write_u64(settings.n_warmup as u64);
        fp.write_u64(master_seed);
        format!("{:016x}", fp.finish())
    }

    /// Load the ensemble for `key`, or `None` on a miss.
    pub fn load(&self, key: &str) -> Result<Option<PosteriorEnsemble>, CacheError> {
        let path = self.entry_path(key);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let cached: CachedEnsemble =
            serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Some(cached.ensemble))
    }

    /// Store an ensemble under `key`, returning the entry path.
    pub fn store(&self, key: &str, ensemble: &PosteriorEnsemble) -> Result<PathBuf, CacheError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        let path = self.entry_path(key);
        let cached = CachedEnsemble {
            key: key.to_string(),
            created_at: Utc::now(),
            ensemble: ensemble.clone(),
        };
        let raw = serde_json::to_string(&cached).map_err(|source| CacheError::Corrupt {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(&path, raw).map_err(|source| CacheError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("ensemble-{key}.json"))
    }
}

/// 64-bit FNV-1a accumulator. No integrity claim is attached to the key; a
/// collision only costs a spurious recompute.
struct Fingerprint {
    state: u64,
}

impl Fingerprint {
    fn new() -> Self {
        Self {
            state: 0xcbf2_9ce4_8422_2325,
        }
    }

    fn write_u64(&mut self, value: u64) {
        for byte in value.to_le_bytes() {
            self.state ^= u64::from(byte);
            self.state = self.state.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }

    fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    fn finish(&self) -> u64 {
        self.state
    }
}
