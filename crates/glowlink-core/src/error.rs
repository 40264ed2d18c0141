//! Error types for the core domain model
use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid layout configuration
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Invalid scene configuration
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
