//! Error types for the control system
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// DMX/sACN protocol error
    #[error("DMX error: {0}")]
    DmxError(String),

    /// Scene configuration error
    #[error("Scene error: {0}")]
    SceneError(String),

    /// Core domain error
    #[error(transparent)]
    CoreError(#[from] glowlink_core::CoreError),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
