//! Error types for the level1c crate.

use geometry::GeometryError;
use l1c_common::SceneError;
use thiserror::Error;

/// Errors that abort the conversion of one scan unit.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The reference band is absent, so no canonical header can be built.
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// A timing attribute the output cannot be built without.
    #[error("Missing required attribute '{attribute}' on band '{band}'")]
    MissingAttribute { band: String, attribute: String },

    #[error("Unsupported sensor: expected {expected}, found {found:?}")]
    UnsupportedSensor { expected: String, found: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read scene: {0}")]
    Read(String),

    #[error("Failed to write scene: {0}")]
    Write(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;
