//! Expected-cost decisioning and value-of-information analysis.

pub mod expected_cost;
pub mod voi;

pub use expected_cost::{expected_costs, Action, DecisionError, DecisionOutcome, DecisionResult};
pub use voi::{perfect_information, sweep, PerfectInformation, VoiSample, VoiSweepPoint};
