//! Error types for automl-studio

use thiserror::Error;

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Main error type for the dataset, training and export layers
#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<polars::error::PolarsError> for StudioError {
    fn from(err: polars::error::PolarsError) -> Self {
        StudioError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        StudioError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for StudioError {
    fn from(err: bincode::Error) -> Self {
        StudioError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for StudioError {
    fn from(err: ndarray::ShapeError) -> Self {
        StudioError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
