//! Deterministic, seedable random sampling.
//!
//! Every stochastic operation in the engine draws from a [`RandomStream`]
//! seeded through [`derive_seed`], a pure function of the master seed, a stage
//! label, and an index. Parallel execution order therefore never affects
//! reported numbers: two runs with the same master seed and the same draw
//! sequence are bit-identical.

use rand::Rng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp1, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;

/// Truncation point (in sd units) above which rejection from the parent
/// Normal becomes too wasteful and the exponential proposal takes over.
const FAR_TAIL_ALPHA: f64 = 2.0;

/// Errors raised for out-of-domain distribution parameters.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("invalid parameter for {distribution}: {field} = {value}")]
    InvalidParameter {
        distribution: &'static str,
        field: &'static str,
        value: f64,
    },
}

/// Derive a stream seed from the master seed, a stage label, and an index.
///
/// Pure and platform-independent: identical inputs always give identical
/// outputs, and distinct (stage, index) pairs give well-separated streams.
/// This is what makes chain/batch parallelism reproducible.
pub fn derive_seed(master_seed: u64, stage: &str, index: u64) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

    let mut label = FNV_OFFSET;
    for byte in stage.as_bytes() {
        label ^= u64::from(*byte);
        label = label.wrapping_mul(FNV_PRIME);
    }

    // SplitMix64 finalizer over the combined state.
    let mut z = master_seed
        ^ label.rotate_left(32)
        ^ index.wrapping_mul(GOLDEN);
    z = z.wrapping_add(GOLDEN);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// A seeded stream of distribution draws.
#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: Xoshiro256PlusPlus,
}

impl RandomStream {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Draw from Normal(mean, sd).
    pub fn normal(&mut self, mean: f64, sd: f64) -> Result<f64, SampleError> {
        check_finite("normal", "mean", mean)?;
        check_positive("normal", "sd", sd)?;
        let z: f64 = StandardNormal.sample(&mut self.rng);
        Ok(mean + sd * z)
    }

    /// Draw from Exponential(rate).
    pub fn exponential(&mut self, rate: f64) -> Result<f64, SampleError> {
        check_positive("exponential", "rate", rate)?;
        let e: f64 = Exp1.sample(&mut self.rng);
        Ok(e / rate)
    }

    /// Uniform draw in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform index in [0, n). Used for bootstrap resampling.
    pub fn resample_index(&mut self, n: usize) -> usize {
        self.rng.random_range(0..n)
    }

    /// Draw from Normal(mean, sd) truncated to [lower, inf).
    ///
    /// Allocation-free: no per-draw distribution object. Below
    /// [`FAR_TAIL_ALPHA`] standardized truncation this rejects from the
    /// parent Normal; deeper in the tail it switches to Robert's shifted
    /// exponential proposal, which keeps the acceptance rate bounded away
    /// from zero however extreme the truncation.
    pub fn truncated_normal_lower(
        &mut self,
        mean: f64,
        sd: f64,
        lower: f64,
    ) -> Result<f64, SampleError> {
        check_finite("truncated_normal", "mean", mean)?;
        check_positive("truncated_normal", "sd", sd)?;
        check_finite("truncated_normal", "lower", lower)?;

        let alpha = (lower - mean) / sd;
        if alpha < FAR_TAIL_ALPHA {
            loop {
                let z: f64 = StandardNormal.sample(&mut self.rng);
                if z >= alpha {
                    return Ok(mean + sd * z);
                }
            }
        }
        // Robert (1995): propose z = alpha + Exp(lambda), accept with
        // exp(-(z - lambda)^2 / 2).
        let lambda = (alpha + (alpha * alpha + 4.0).sqrt()) / 2.0;
        loop {
            let e: f64 = Exp1.sample(&mut self.rng);
            let z = alpha + e / lambda;
            let rho = (-(z - lambda) * (z - lambda) / 2.0).exp();
            if self.rng.random::<f64>() <= rho {
                return Ok(mean + sd * z);
            }
        }
    }
}

fn check_finite(
    distribution: &'static str,
    field: &'static str,
    value: f64,
) -> Result<(), SampleError> {
    if !value.is_finite() {
        return Err(SampleError::InvalidParameter {
            distribution,
            field,
            value,
        });
    }
    Ok(())
}

fn check_positive(
    distribution: &'static str,
    field: &'static str,
    value: f64,
) -> Result<(), SampleError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SampleError::InvalidParameter {
            distribution,
            field,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomStream::new(42);
        let mut b = RandomStream::new(42);
        for _ in 0..100 {
            assert_eq!(
                a.normal(300.0, 50.0).unwrap().to_bits(),
                b.normal(300.0, 50.0).unwrap().to_bits()
            );
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = RandomStream::new(1);
        let mut b = RandomStream::new(2);
        let xs: Vec<f64> = (0..10).map(|_| a.uniform()).collect();
        let ys: Vec<f64> = (0..10).map(|_| b.uniform()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn derive_seed_is_stable() {
        let s1 = derive_seed(7, "chain", 0);
        let s2 = derive_seed(7, "chain", 0);
        assert_eq!(s1, s2);
    }

    #[test]
    fn derive_seed_separates_stage_and_index() {
        let base = derive_seed(7, "chain", 0);
        assert_ne!(base, derive_seed(7, "chain", 1));
        assert_ne!(base, derive_seed(7, "voi-batch", 0));
        assert_ne!(base, derive_seed(8, "chain", 0));
    }

    #[test]
    fn normal_rejects_bad_sd() {
        let mut stream = RandomStream::new(0);
        assert!(stream.normal(0.0, 0.0).is_err());
        assert!(stream.normal(0.0, -1.0).is_err());
        assert!(stream.normal(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn exponential_rejects_bad_rate() {
        let mut stream = RandomStream::new(0);
        assert!(stream.exponential(0.0).is_err());
        assert!(stream.exponential(-0.5).is_err());
    }

    #[test]
    fn exponential_mean_matches_rate() {
        let mut stream = RandomStream::new(11);
        let rate = 0.02;
        let n = 20_000;
        let total: f64 = (0..n)
            .map(|_| stream.exponential(rate).unwrap())
            .sum();
        let mean = total / n as f64;
        assert!((mean - 50.0).abs() < 2.0, "mean {mean} far from 50");
    }

    #[test]
    fn truncated_draws_respect_lower_bound() {
        let mut stream = RandomStream::new(3);
        for _ in 0..5000 {
            let v = stream.truncated_normal_lower(300.0, 50.0, 0.0).unwrap();
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn truncated_far_tail_uses_exponential_proposal() {
        // alpha = 10 standard deviations: plain rejection would stall.
        let mut stream = RandomStream::new(4);
        for _ in 0..1000 {
            let v = stream.truncated_normal_lower(-10.0, 1.0, 0.0).unwrap();
            assert!(v >= 0.0);
            assert!(v < 2.0, "far-tail draw {v} should hug the bound");
        }
    }

    #[test]
    fn resample_index_stays_in_range() {
        let mut stream = RandomStream::new(5);
        for _ in 0..1000 {
            assert!(stream.resample_index(7) < 7);
        }
    }
}
