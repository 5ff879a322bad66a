//! Figure payloads: the data behind each report chart, no rendering.

use crate::decision::{Action, VoiSample, VoiSweepPoint};
use crate::inference::hierarchical::PosteriorEnsemble;
use crate::inference::MotePoint;
use serde::Serialize;
use yc_config::DecisionPolicy;
use yc_math::{histogram, HistogramBin};

/// Binned histogram of one sample set.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramFigure {
    pub label: String,
    pub bins: Vec<HistogramBin>,
}

pub fn histogram_figure(label: &str, values: &[f64], n_bins: usize) -> HistogramFigure {
    HistogramFigure {
        label: label.to_string(),
        bins: histogram(values, n_bins),
    }
}

/// Prior-predictive versus posterior-predictive, binned on the same scale.
#[derive(Debug, Clone, Serialize)]
pub struct PredictiveComparisonFigure {
    pub prior: HistogramFigure,
    pub posterior: HistogramFigure,
}

pub fn predictive_comparison(
    prior_draws: &[f64],
    posterior_draws: &[f64],
    n_bins: usize,
) -> PredictiveComparisonFigure {
    PredictiveComparisonFigure {
        prior: histogram_figure("prior_predictive", prior_draws, n_bins),
        posterior: histogram_figure("posterior_predictive", posterior_draws, n_bins),
    }
}

/// Joint (mu, sigma) posterior scatter.
#[derive(Debug, Clone, Serialize)]
pub struct JointScatterFigure {
    pub points: Vec<(f64, f64)>,
}

pub fn joint_scatter(ensemble: &PosteriorEnsemble) -> JointScatterFigure {
    JointScatterFigure {
        points: ensemble.mu_sigma_pairs(),
    }
}

/// Step-function cost line for one action, enough for a renderer to draw
/// cost versus revealed strength.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActionCostLine {
    pub action: Action,
    pub fixed_cost: f64,
    /// Revealed strength below which this action still fails.
    pub failure_below: f64,
    /// Cost on the failing side of the line.
    pub cost_if_fail: f64,
}

/// Value-of-perfect-information jitter plot: one point per hypothetical
/// revealed strength, plus the per-action cost lines.
#[derive(Debug, Clone, Serialize)]
pub struct VopiJitterFigure {
    pub samples: Vec<VoiSample>,
    pub cost_lines: Vec<ActionCostLine>,
    pub prior_expected_cost: f64,
}

pub fn vopi_jitter(
    samples: Vec<VoiSample>,
    policy: &DecisionPolicy,
    prior_expected_cost: f64,
) -> VopiJitterFigure {
    let entries = [
        (Action::NoAction, policy.cost_table.no_action),
        (
            Action::IncreaseResistance,
            policy.cost_table.increase_resistance,
        ),
        (Action::ChangeOperation, policy.cost_table.change_operation),
    ];
    VopiJitterFigure {
        samples,
        cost_lines: entries
            .into_iter()
            .map(|(action, cost)| ActionCostLine {
                action,
                fixed_cost: cost.fixed_cost,
                failure_below: policy.threshold_mpa / cost.strength_multiplier,
                cost_if_fail: cost.fixed_cost + policy.cost_of_failure,
            })
            .collect(),
        prior_expected_cost,
    }
}

/// Point-range plot of the value-of-information sweep.
#[derive(Debug, Clone, Serialize)]
pub struct VoiSweepFigure {
    pub points: Vec<VoiSweepPoint>,
}

/// MOTE-versus-series-size scatter.
#[derive(Debug, Clone, Serialize)]
pub struct MoteScatterFigure {
    pub points: Vec<MotePoint>,
}

pub fn mote_figure(points: Vec<MotePoint>) -> MoteScatterFigure {
    MoteScatterFigure { points }
}
