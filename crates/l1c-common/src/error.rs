//! Error types for the scene model.

use thiserror::Error;

/// Result type alias using SceneError.
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors raised by scene and band operations.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Band not found in scene: {0}")]
    BandNotFound(String),

    #[error("Band {0} is not a two-dimensional image")]
    NotTwoDimensional(String),

    #[error("Invalid slot time: {0}")]
    InvalidTime(String),
}
