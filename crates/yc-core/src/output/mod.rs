//! Plain serializable payloads for external rendering.
//!
//! The engine never draws tables or charts; it hands the underlying data to
//! whatever renders the report. Everything here is a thin, serde-friendly
//! wrapper around the core entities.

pub mod figures;
pub mod tables;

pub use figures::{
    histogram_figure, joint_scatter, mote_figure, predictive_comparison, vopi_jitter,
    ActionCostLine, HistogramFigure, JointScatterFigure, MoteScatterFigure,
    PredictiveComparisonFigure, VoiSweepFigure, VopiJitterFigure,
};
pub use tables::{decision_inputs_table, DecisionInputRow, DecisionInputsTable, RawDataTable};
