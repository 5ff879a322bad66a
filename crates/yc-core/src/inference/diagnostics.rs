//! Chain mixing diagnostics.
//!
//! Convergence is not gated anywhere in the engine; these are reported as
//! plain data so callers can inspect mixing when they care.

use crate::inference::hierarchical::PosteriorEnsemble;
use serde::Serialize;
use yc_math::{mean, variance_population};

/// Longest autocorrelation lag considered by the ESS estimate.
const MAX_ESS_LAG: usize = 50;

/// Mixing summary for one scalar parameter.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParameterDiagnostics {
    /// Effective sample size summed over chains.
    pub ess: f64,
    /// Split potential-scale-reduction factor. Near 1.0 when chains agree.
    pub split_r_hat: f64,
}

/// Mixing summary for the two population parameters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EnsembleDiagnostics {
    pub mu: ParameterDiagnostics,
    pub sigma: ParameterDiagnostics,
}

/// Compute ESS and split-R-hat for `mu` and `sigma` across chains.
///
/// Returns `None` for an empty ensemble or chains too short to split.
pub fn ensemble_diagnostics(ensemble: &PosteriorEnsemble) -> Option<EnsembleDiagnostics> {
    if ensemble.is_empty() {
        return None;
    }
    let n_chains = ensemble.n_chains();
    let mu_chains: Vec<Vec<f64>> = (0..n_chains)
        .map(|c| ensemble.chain(c).iter().map(|s| s.mu).collect())
        .collect();
    let sigma_chains: Vec<Vec<f64>> = (0..n_chains)
        .map(|c| ensemble.chain(c).iter().map(|s| s.sigma).collect())
        .collect();

    Some(EnsembleDiagnostics {
        mu: parameter_diagnostics(&mu_chains)?,
        sigma: parameter_diagnostics(&sigma_chains)?,
    })
}

fn parameter_diagnostics(chains: &[Vec<f64>]) -> Option<ParameterDiagnostics> {
    if chains.iter().any(|c| c.len() < 4) {
        return None;
    }
    let ess = chains.iter().map(|c| chain_ess(c)).sum();
    Some(ParameterDiagnostics {
        ess,
        split_r_hat: split_r_hat(chains),
    })
}

/// Autocorrelation-truncated ESS of one chain.
fn chain_ess(chain: &[f64]) -> f64 {
    let n = chain.len();
    if n < 2 {
        return n as f64;
    }
    let m = mean(chain);
    let var = variance_population(chain);
    if var < 1e-12 {
        return n as f64;
    }
    let mut sum_rho = 0.0;
    for lag in 1..=MAX_ESS_LAG.min(n / 2) {
        let rho = autocorrelation(chain, lag, m, var);
        if rho < 0.05 {
            break;
        }
        sum_rho += rho;
    }
    n as f64 / (1.0 + 2.0 * sum_rho)
}

fn autocorrelation(chain: &[f64], lag: usize, mean: f64, var: f64) -> f64 {
    let n = chain.len();
    if lag >= n {
        return 0.0;
    }
    let cov: f64 = (0..(n - lag))
        .map(|i| (chain[i] - mean) * (chain[i + lag] - mean))
        .sum::<f64>()
        / (n - lag) as f64;
    cov / var
}

/// Split each chain in half and compute the classic R-hat over the halves.
fn split_r_hat(chains: &[Vec<f64>]) -> f64 {
    let halves: Vec<&[f64]> = chains
        .iter()
        .flat_map(|c| {
            let mid = c.len() / 2;
            [&c[..mid], &c[mid..]]
        })
        .collect();
    let m = halves.len() as f64;
    let n = halves.iter().map(|h| h.len()).min().unwrap_or(0) as f64;
    if n < 2.0 {
        return f64::NAN;
    }

    let half_means: Vec<f64> = halves.iter().map(|h| mean(h)).collect();
    let grand_mean = mean(&half_means);
    let between = n / (m - 1.0)
        * half_means
            .iter()
            .map(|hm| (hm - grand_mean) * (hm - grand_mean))
            .sum::<f64>();
    let within = halves
        .iter()
        .map(|h| {
            let hm = mean(h);
            h.iter().map(|x| (x - hm) * (x - hm)).sum::<f64>() / (h.len() as f64 - 1.0)
        })
        .sum::<f64>()
        / m;
    if within < 1e-12 {
        return 1.0;
    }
    (((n - 1.0) / n * within + between / n) / within).sqrt()
}
