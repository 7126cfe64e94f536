//! Gene-gene interaction network inference
//!
//! Each gene is regressed on every other gene with an L1-penalized linear
//! model whose strength is chosen by k-fold cross-validation. The fitted
//! coefficients become one row of a square, asymmetric interaction matrix.

pub mod algorithms;
pub mod common;
pub mod error;
pub mod network;

/// Re-export common types
pub use common::*;
pub use error::{InferenceError, InferenceResult};
pub use network::{infer, infer_with_diagnostics, GeneFitSummary, NetworkFit};
