//! Decision policy configuration types.

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

/// Complete decision policy: failure threshold, failure cost, and the
/// per-action cost table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Yield strength (MPa) below which the component fails in service.
    pub threshold_mpa: f64,

    /// Cost incurred when the component fails.
    pub cost_of_failure: f64,

    pub cost_table: CostTable,
}

/// Cost entries for each candidate action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostTable {
    pub no_action: ActionCost,
    pub increase_resistance: ActionCost,
    pub change_operation: ActionCost,
}

/// Fixed cost and effective-strength multiplier for one action.
///
/// The multiplier models a redesign that raises effective capacity, so
/// anything other than `no_action` carries a factor above 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActionCost {
    pub fixed_cost: f64,
    pub strength_multiplier: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            threshold_mpa: 300.0,
            cost_of_failure: 1_000_000.0,
            cost_table: CostTable::default(),
        }
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            no_action: ActionCost {
                fixed_cost: 0.0,
                strength_multiplier: 1.0,
            },
            increase_resistance: ActionCost {
                fixed_cost: 100_000.0,
                strength_multiplier: 1.1,
            },
            change_operation: ActionCost {
                fixed_cost: 50_000.0,
                strength_multiplier: 1.25,
            },
        }
    }
}

impl DecisionPolicy {
    pub fn validate(&self) -> ValidationResult<()> {
        if !self.threshold_mpa.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: "policy.threshold_mpa".to_string(),
                message: format!("must be finite, got {}", self.threshold_mpa),
            });
        }
        if !self.cost_of_failure.is_finite() || self.cost_of_failure < 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "policy.cost_of_failure".to_string(),
                message: format!("must be finite and nonnegative, got {}", self.cost_of_failure),
            });
        }
        for (name, entry) in [
            ("no_action", &self.cost_table.no_action),
            ("increase_resistance", &self.cost_table.increase_resistance),
            ("change_operation", &self.cost_table.change_operation),
        ] {
            if !entry.fixed_cost.is_finite() || entry.fixed_cost < 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("policy.cost_table.{name}.fixed_cost"),
                    message: format!("must be finite and nonnegative, got {}", entry.fixed_cost),
                });
            }
            if !entry.strength_multiplier.is_finite() || entry.strength_multiplier <= 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: format!("policy.cost_table.{name}.strength_multiplier"),
                    message: format!("must be positive, got {}", entry.strength_multiplier),
                });
            }
        }
        Ok(())
    }
}
