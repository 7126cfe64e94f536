//! Error types for network simulation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DynamicsError {
    /// Non-positive decay rate, step size or step count; empty gene list; zero replicates
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// NaN or infinite value in a weight or initial state
    #[error("Non-finite input: {0}")]
    NonFiniteInput(String),

    /// Matrix not square, or a label list / state / index that disagrees with it
    #[error("Dimension mismatch: expected {expected}, got {actual} ({context})")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate gene identifier: {0}")]
    DuplicateGene(String),

    #[error("Gene {0} is not part of the network")]
    UnknownGene(String),

    /// One unit of a batch failed; the batch is aborted
    #[error("Run {index} ({label}) failed: {source}")]
    RunFailed {
        index: usize,
        label: String,
        #[source]
        source: Box<DynamicsError>,
    },
}

pub type DynamicsResult<T> = Result<T, DynamicsError>;
