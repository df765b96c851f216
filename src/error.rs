//! Error types for the listing-hits pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ListingError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum ListingError {
    #[error("Data error: {0}")]
    Data(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Curation error: {0}")]
    Curation(String),

    #[error("Insufficient features after curation: {retained} retained, {required} required")]
    InsufficientFeatures { retained: usize, required: usize },

    #[error("Preprocessing error: {0}")]
    Preprocessing(String),

    #[error("Unseen category level '{level}' in column '{column}'")]
    UnseenLevel { column: String, level: String },

    #[error("Training error: {0}")]
    Training(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Fit exceeded wall-clock budget of {budget_secs:.3}s after {iterations} iterations")]
    FitTimeout { budget_secs: f64, iterations: usize },

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<polars::error::PolarsError> for ListingError {
    fn from(err: polars::error::PolarsError) -> Self {
        ListingError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for ListingError {
    fn from(err: serde_json::Error) -> Self {
        ListingError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ListingError {
    fn from(err: ndarray::ShapeError) -> Self {
        ListingError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
