//! Tabular payloads.

use crate::collect::MeasurementSet;
use crate::decision::Action;
use serde::Serialize;
use yc_config::DecisionPolicy;

/// The raw measurement table, as read.
#[derive(Debug, Clone, Serialize)]
pub struct RawDataTable {
    pub rows: MeasurementSet,
}

/// One row of the decision-inputs table.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionInputRow {
    pub action: Action,
    pub fixed_cost: f64,
    pub strength_multiplier: f64,
}

/// Decision inputs: threshold, failure cost, and the per-action cost table.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionInputsTable {
    pub threshold_mpa: f64,
    pub cost_of_failure: f64,
    pub rows: Vec<DecisionInputRow>,
}

/// Build the decision-inputs table from a policy.
pub fn decision_inputs_table(policy: &DecisionPolicy) -> DecisionInputsTable {
    let entries = [
        (Action::NoAction, policy.cost_table.no_action),
        (
            Action::IncreaseResistance,
            policy.cost_table.increase_resistance,
        ),
        (Action::ChangeOperation, policy.cost_table.change_operation),
    ];
    DecisionInputsTable {
        threshold_mpa: policy.threshold_mpa,
        cost_of_failure: policy.cost_of_failure,
        rows: entries
            .into_iter()
            .map(|(action, cost)| DecisionInputRow {
                action,
                fixed_cost: cost.fixed_cost,
                strength_multiplier: cost.strength_multiplier,
            })
            .collect(),
    }
}
