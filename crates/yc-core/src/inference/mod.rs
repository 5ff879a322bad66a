//! Fitting, hierarchical posterior sampling, and related statistics.

pub mod diagnostics;
pub mod fit;
pub mod hierarchical;
pub mod mote;

pub use diagnostics::{ensemble_diagnostics, EnsembleDiagnostics};
pub use fit::{bootstrap_confidence_interval, fit_mle, normal_estimator, DistributionParams};
pub use hierarchical::{
    HierarchicalYieldModel, NoiseSpec, PosteriorEnsemble, PosteriorError, PosteriorSample,
};
pub use mote::{mote, mote_rank, mote_scatter, MotePoint};
