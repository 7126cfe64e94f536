//! Network dynamics simulation
//!
//! Forward-Euler integration of dx/dt = -λx + σ(Wx) over an interaction
//! network, with inhibited genes clamped to zero. Batch drivers build a
//! single-gene inhibition atlas and replicate-run stability summaries; each
//! run owns its state and seeded generator, so batches parallelize freely.

pub mod atlas;
pub mod common;
pub mod error;
pub mod simulate;
pub mod stability;

pub use atlas::{run_full_atlas, run_perturbation_atlas, KnockdownEffects, PerturbationAtlas};
pub use common::{InhibitionSet, NetworkView, SeedPolicy, SimulationParams};
pub use error::{DynamicsError, DynamicsResult};
pub use simulate::{sigmoid, simulate, RunPhase, Simulation, Trajectory};
pub use stability::{run_stability_batch, GeneStability, StabilitySummary};
