//! Unified error type for the regnet pipeline

use regnet_dynamics::DynamicsError;
use regnet_inference::InferenceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegnetError {
    /// Network inference failed
    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    /// Simulation failed
    #[error("Simulation error: {0}")]
    Dynamics(#[from] DynamicsError),

    /// Invalid input to a preprocessing or scoring step
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// YAML configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RegnetResult<T> = Result<T, RegnetError>;
