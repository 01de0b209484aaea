//! Observer look angles: where a satellite appears in the sky of a ground point.
//!
//! The look computation is the one collaborator whose altitude unit has
//! changed between library revisions, so it sits behind [`ObserverLook`]
//! and is probed by [`crate::convention`] before the engine trusts it.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::solar::gmst;

/// WGS84 equatorial radius in kilometres.
const WGS84_A_KM: f64 = 6378.137;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Sub-satellite point and altitude.
///
/// Readers deliver the altitude in metres; the engine rescales it to the
/// unit the look collaborator expects before calling it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatellitePosition {
    /// Degrees east.
    pub longitude: f64,
    /// Degrees north.
    pub latitude: f64,
    pub altitude: f64,
}

impl SatellitePosition {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
        }
    }

    /// Same position with the altitude multiplied by `factor`.
    pub fn scaled_altitude(&self, factor: f64) -> Self {
        Self {
            altitude: self.altitude * factor,
            ..*self
        }
    }
}

/// Azimuth and elevation of the satellite seen from the ground, degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    /// Clockwise from north, in [0, 360).
    pub azimuth: f64,
    pub elevation: f64,
}

impl LookAngles {
    /// Satellite zenith angle: `90 - elevation`.
    pub fn zenith(&self) -> f64 {
        90.0 - self.elevation
    }
}

/// Computes look angles from a ground point towards a satellite.
///
/// Implementations must be pure; the engine calls them once per pixel,
/// possibly from several threads.
pub trait ObserverLook: Send + Sync {
    /// `lon`/`lat` in degrees, `alt` in the same unit as `satellite.altitude`.
    fn look(
        &self,
        satellite: &SatellitePosition,
        time: &DateTime<Utc>,
        lon: f64,
        lat: f64,
        alt: f64,
    ) -> LookAngles;
}

/// Unit in which a look implementation interprets altitude arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AltitudeUnit {
    #[default]
    Kilometers,
    Meters,
}

impl AltitudeUnit {
    fn to_km(self, alt: f64) -> f64 {
        match self {
            AltitudeUnit::Kilometers => alt,
            AltitudeUnit::Meters => alt * 0.001,
        }
    }
}

/// Topocentric look computation on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopocentricLook {
    unit: AltitudeUnit,
}

impl TopocentricLook {
    pub fn new(unit: AltitudeUnit) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> AltitudeUnit {
        self.unit
    }
}

/// Earth-centred inertial position in kilometres of a geodetic point.
fn observer_position(sidereal: f64, lon_deg: f64, lat_deg: f64, alt_km: f64) -> Vector3<f64> {
    let lat = lat_deg.to_radians();
    let theta = (sidereal + lon_deg.to_radians()).rem_euclid(TAU);
    let c = 1.0 / (1.0 + WGS84_F * (WGS84_F - 2.0) * lat.sin().powi(2)).sqrt();
    let sq = c * (1.0 - WGS84_F).powi(2);
    let achcp = (WGS84_A_KM * c + alt_km) * lat.cos();
    Vector3::new(
        achcp * theta.cos(),
        achcp * theta.sin(),
        (WGS84_A_KM * sq + alt_km) * lat.sin(),
    )
}

impl ObserverLook for TopocentricLook {
    fn look(
        &self,
        satellite: &SatellitePosition,
        time: &DateTime<Utc>,
        lon: f64,
        lat: f64,
        alt: f64,
    ) -> LookAngles {
        let sidereal = gmst(time);
        let sat = observer_position(
            sidereal,
            satellite.longitude,
            satellite.latitude,
            self.unit.to_km(satellite.altitude),
        );
        let ground = observer_position(sidereal, lon, lat, self.unit.to_km(alt));
        let range = sat - ground;

        let lat_rad = lat.to_radians();
        let theta = (sidereal + lon.to_radians()).rem_euclid(TAU);
        let (sin_lat, cos_lat) = lat_rad.sin_cos();
        let (sin_theta, cos_theta) = theta.sin_cos();

        // South, east, zenith components of the range vector.
        let top_s = sin_lat * cos_theta * range.x + sin_lat * sin_theta * range.y - cos_lat * range.z;
        let top_e = -sin_theta * range.x + cos_theta * range.y;
        let top_z = cos_lat * cos_theta * range.x + cos_lat * sin_theta * range.y + sin_lat * range.z;

        let mut azimuth = (-top_e / top_s).atan();
        if top_s > 0.0 {
            azimuth += PI;
        }
        if azimuth < 0.0 {
            azimuth += TAU;
        }
        let elevation = (top_z / range.norm()).clamp(-1.0, 1.0).asin();

        LookAngles {
            azimuth: azimuth.to_degrees(),
            elevation: elevation.to_degrees(),
        }
    }
}

impl<L: ObserverLook + ?Sized> ObserverLook for Box<L> {
    fn look(
        &self,
        satellite: &SatellitePosition,
        time: &DateTime<Utc>,
        lon: f64,
        lat: f64,
        alt: f64,
    ) -> LookAngles {
        (**self).look(satellite, time, lon, lat, alt)
    }
}
