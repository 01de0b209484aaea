//! Error types for geometry computations.

use thiserror::Error;

/// Result type alias using GeometryError.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised by the geometry engine.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The observer-look collaborator or the reader disagrees with the
    /// altitude unit convention the engine was written against.
    #[error("Ephemeris altitude convention mismatch: {0}")]
    EphemerisConventionMismatch(String),

    #[error("Longitude grid has shape {lons:?} but latitude grid has shape {lats:?}")]
    ShapeMismatch { lons: Vec<usize>, lats: Vec<usize> },

    #[error("Satellite position not available: {0}")]
    MissingSatellitePosition(String),
}
