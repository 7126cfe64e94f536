//! Regnet: gene regulatory network inference and perturbation simulation
//!
//! An interaction network is inferred from a genes x samples expression
//! matrix by per-gene L1-regularized regression, then simulated as a
//! continuous-time dynamical system under single-gene inhibitions.
//!
//! # Components
//!
//! - [`regnet_inference`]: per-gene LassoCV fits assembled into an
//!   [`InteractionMatrix`]
//! - [`regnet_dynamics`]: forward-Euler simulation, perturbation atlas and
//!   stability batch over a [`NetworkView`]
//! - [`network`]: label-preserving conversion between the two
//! - [`pipeline`]: both stages wired together from a [`PipelineConfig`]
//! - [`normalize`] and [`scoring`]: count preprocessing and pathway scores
//!
//! ## Example Usage
//!
//! ```rust
//! use regnet::{
//!     build_view, simulate, InhibitionSet, InteractionMatrix, SeedPolicy, SimulationParams,
//! };
//! use ndarray::array;
//!
//! let matrix = InteractionMatrix::new(
//!     vec!["A".into(), "B".into(), "C".into()],
//!     array![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
//! ).unwrap();
//! let view = build_view(&matrix).unwrap();
//!
//! let inhibited = InhibitionSet::from_genes(&view, &["B"]).unwrap();
//! let mut rng = SeedPolicy::new(42).rng_for(0);
//! let params = SimulationParams::default();
//! let trajectory = simulate(&view, &inhibited, None, &params, &mut rng).unwrap();
//! assert_eq!(trajectory.len(), 100);
//! assert!(trajectory.gene(1).iter().all(|&x| x == 0.0));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod network;
pub mod normalize;
pub mod pipeline;
pub mod scoring;

pub use config::{AtlasConfig, PipelineConfig, StabilityConfig};
pub use error::{RegnetError, RegnetResult};
pub use network::{build_view, reorder};
pub use pipeline::{run_pipeline, run_pipeline_with_atlas, PipelineReport, PipelineRun};
pub use scoring::{score_samples, PathwayWeights, PhenotypeScores};

pub use regnet_inference::{
    infer, infer_with_diagnostics, ExpressionMatrix, GeneFitSummary, InferenceConfig,
    InferenceError, InteractionMatrix, NetworkFit,
};

pub use regnet_dynamics::{
    run_full_atlas, run_perturbation_atlas, run_stability_batch, simulate, DynamicsError,
    GeneStability, InhibitionSet, KnockdownEffects, NetworkView, PerturbationAtlas, SeedPolicy,
    SimulationParams, StabilitySummary, Trajectory,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), "0.3.0");
    }
}
