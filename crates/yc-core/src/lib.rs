//! Yieldcast Core Library
//!
//! Decision-analytic simulation engine for yield-strength redesign:
//! - Measurement ingestion and MLE/bootstrap fitting
//! - Hierarchical posterior sampling over noisy tensile tests
//! - Expected-cost decisioning over the three redesign actions
//! - Expected value of perfect and imperfect information
//!
//! The binary entry point is in `main.rs`.

pub mod cache;
pub mod collect;
pub mod decision;
pub mod events;
pub mod inference;
pub mod logging;
pub mod output;
pub mod rng;
