//! Error types for network inference

use thiserror::Error;

/// Errors raised while building or fitting an interaction network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Too few genes or samples for cross-validated fitting
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// NaN or infinite value in a numeric input
    #[error("Non-finite input: {0}")]
    NonFiniteInput(String),

    /// Configuration value out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Shapes or label lists that do not line up
    #[error("Dimension mismatch: expected {expected}, got {actual} ({context})")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The same gene identifier appears twice in a labeled matrix
    #[error("Duplicate gene identifier: {0}")]
    DuplicateGene(String),

    /// Coordinate descent did not reach the duality-gap tolerance
    #[error(
        "Coordinate descent did not converge at alpha {alpha:.3e} after {iterations} iterations"
    )]
    ConvergenceFailed { alpha: f64, iterations: usize },

    /// The regression for one gene failed; carries the gene that failed
    #[error("Fit failed for gene {gene} (index {index}): {source}")]
    GeneFit {
        index: usize,
        gene: String,
        #[source]
        source: Box<InferenceError>,
    },
}

pub type InferenceResult<T> = Result<T, InferenceError>;
