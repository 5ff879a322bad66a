//! Expected-cost decisioning over predictive strength samples.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use yc_config::{ActionCost, DecisionPolicy};

/// Candidate actions for the redesign decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    NoAction,
    IncreaseResistance,
    ChangeOperation,
}

impl Action {
    pub const ALL: [Action; 3] = [
        Action::NoAction,
        Action::IncreaseResistance,
        Action::ChangeOperation,
    ];

    /// Less invasive actions win cost ties.
    fn tie_break_rank(&self) -> u8 {
        match self {
            Action::NoAction => 0,
            Action::IncreaseResistance => 1,
            Action::ChangeOperation => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::NoAction => "no_action",
            Action::IncreaseResistance => "increase_resistance",
            Action::ChangeOperation => "change_operation",
        }
    }

    fn cost_entry(&self, policy: &DecisionPolicy) -> ActionCost {
        match self {
            Action::NoAction => policy.cost_table.no_action,
            Action::IncreaseResistance => policy.cost_table.increase_resistance,
            Action::ChangeOperation => policy.cost_table.change_operation,
        }
    }
}

/// Expected cost of one action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecisionOutcome {
    pub action: Action,
    /// Monte-Carlo estimate of the failure probability under this action.
    pub p_fail: f64,
    pub expected_cost: f64,
}

/// Outcomes for all actions, in canonical action order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    pub outcomes: Vec<DecisionOutcome>,
}

impl DecisionResult {
    /// Outcomes sorted by expected cost ascending, ties broken toward the
    /// less invasive action.
    pub fn sorted_by_cost(&self) -> Vec<DecisionOutcome> {
        let mut sorted = self.outcomes.clone();
        sorted.sort_by(|a, b| {
            a.expected_cost
                .partial_cmp(&b.expected_cost)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.action.tie_break_rank().cmp(&b.action.tie_break_rank()))
        });
        sorted
    }

    /// The minimum-expected-cost action.
    pub fn optimal(&self) -> DecisionOutcome {
        self.sorted_by_cost()[0]
    }
}

/// Errors raised during decisioning.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("insufficient data: expected-cost evaluation needs at least one strength sample")]
    InsufficientData,
    #[error("invalid parameter {field}: {message}")]
    InvalidParameter {
        field: &'static str,
        message: String,
    },
}

/// Compute the expected cost of each action over predictive strength samples.
///
/// For each action the samples are scaled by its strength multiplier, the
/// fraction falling below the failure threshold estimates `p_fail`, and
/// `expected_cost = fixed_cost + p_fail * cost_of_failure`.
pub fn expected_costs(
    strength_samples: &[f64],
    policy: &DecisionPolicy,
) -> Result<DecisionResult, DecisionError> {
    if strength_samples.is_empty() {
        return Err(DecisionError::InsufficientData);
    }
    if !policy.threshold_mpa.is_finite() {
        return Err(DecisionError::InvalidParameter {
            field: "threshold_mpa",
            message: format!("must be finite, got {}", policy.threshold_mpa),
        });
    }

    let mut outcomes = Vec::with_capacity(Action::ALL.len());
    for action in Action::ALL {
        let entry = action.cost_entry(policy);
        if !entry.strength_multiplier.is_finite() || entry.strength_multiplier <= 0.0 {
            return Err(DecisionError::InvalidParameter {
                field: "strength_multiplier",
                message: format!(
                    "{} multiplier must be positive, got {}",
                    action.name(),
                    entry.strength_multiplier
                ),
            });
        }
        let failures = strength_samples
            .iter()
            .filter(|s| **s * entry.strength_multiplier < policy.threshold_mpa)
            .count();
        let p_fail = failures as f64 / strength_samples.len() as f64;
        outcomes.push(DecisionOutcome {
            action,
            p_fail,
            expected_cost: entry.fixed_cost + p_fail * policy.cost_of_failure,
        });
    }
    Ok(DecisionResult { outcomes })
}
