//! Viewing geometry for satellite scenes.
//!
//! Computes per-pixel solar and satellite angles from a timestamp, a
//! satellite position and a longitude/latitude grid, and generates the
//! longitude/latitude grid of geostationary full-disk areas.
//!
//! The observer-look computation is behind the [`ObserverLook`] trait. A
//! [`GeometryEngine`] refuses to start unless the look collaborator passes
//! the altitude-unit probe in [`convention`].

pub mod angles;
pub mod convention;
pub mod error;
pub mod geostationary;
pub mod observer;
pub mod solar;

pub use angles::{azimuth_difference, sanitize_lonlats, AngleSet, GeometryEngine, INVALID_COORDINATE};
pub use convention::{verify_altitude_convention, AltitudeScale};
pub use error::{GeometryError, GeometryResult};
pub use geostationary::GeostationaryArea;
pub use observer::{AltitudeUnit, LookAngles, ObserverLook, SatellitePosition, TopocentricLook};
pub use solar::{sun_earth_distance_correction, SolarEphemeris};
