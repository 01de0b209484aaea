//! Altitude-unit probe for the observer-look collaborator.
//!
//! Readers report the satellite altitude in metres. Depending on its
//! revision, the look computation reads altitude in kilometres or metres.
//! The probe places a satellite over (0°, 0°) and looks at it from
//! (16°E, 58°N) with two altitudes three orders of magnitude apart: a
//! kilometre-based look sees the 36 000 000 satellite high in the sky
//! and the 36 000 one near the horizon.

use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, error};

use crate::error::{GeometryError, GeometryResult};
use crate::observer::{ObserverLook, SatellitePosition};

/// Ground point used by the probe (longitude, latitude), degrees.
pub const PROBE_GROUND: (f64, f64) = (16.0, 58.0);

/// Probe altitudes, in the collaborator's unit.
pub const PROBE_HIGH_ALTITUDE: f64 = 36_000.0 * 1000.0;
pub const PROBE_LOW_ALTITUDE: f64 = 36_000.0;

/// Elevation the high probe must exceed.
pub const MIN_HIGH_ELEVATION: f64 = 30.0;
/// Elevation the low probe must stay below.
pub const MAX_LOW_ELEVATION: f64 = 23.0;

/// Reader altitudes at or below this value cannot be metres.
pub const MIN_READER_ALTITUDE_METRES: f64 = 38_000.0;

/// Factor applied to reader altitudes before calling the look collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeScale(pub f64);

impl AltitudeScale {
    /// Metres to kilometres.
    pub const METRES_TO_KM: AltitudeScale = AltitudeScale(0.001);

    pub fn apply(&self, position: &SatellitePosition) -> SatellitePosition {
        position.scaled_altitude(self.0)
    }
}

/// Fixed instant for the probe. Elevation of a satellite above the equator
/// does not depend on the time, only the rotation angle does.
fn probe_time() -> GeometryResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0)
        .single()
        .ok_or_else(|| GeometryError::EphemerisConventionMismatch("invalid probe time".to_string()))
}

/// Probe the look collaborator and return the altitude scale to use.
///
/// Succeeds only when the high probe is plausible (> 30°) and the low one
/// is not (< 23°), which means the collaborator expects kilometres.
pub fn verify_altitude_convention<L: ObserverLook + ?Sized>(look: &L) -> GeometryResult<AltitudeScale> {
    let time = probe_time()?;
    let (lon, lat) = PROBE_GROUND;

    let high = look.look(&SatellitePosition::new(0.0, 0.0, PROBE_HIGH_ALTITUDE), &time, lon, lat, 0.0);
    let low = look.look(&SatellitePosition::new(0.0, 0.0, PROBE_LOW_ALTITUDE), &time, lon, lat, 0.0);

    debug!(
        high_elevation = high.elevation,
        low_elevation = low.elevation,
        "Observer look altitude probe"
    );

    if high.elevation > MIN_HIGH_ELEVATION && low.elevation < MAX_LOW_ELEVATION {
        return Ok(AltitudeScale::METRES_TO_KM);
    }

    error!(
        high_elevation = high.elevation,
        low_elevation = low.elevation,
        "Observer look does not interpret altitude in kilometres"
    );
    Err(GeometryError::EphemerisConventionMismatch(format!(
        "probe elevations {:.2}° (altitude {}) and {:.2}° (altitude {}), expected > {}° and < {}°",
        high.elevation,
        PROBE_HIGH_ALTITUDE,
        low.elevation,
        PROBE_LOW_ALTITUDE,
        MIN_HIGH_ELEVATION,
        MAX_LOW_ELEVATION
    )))
}

/// Reject reader altitudes that are not plausibly metres.
pub fn check_reader_altitude(position: &SatellitePosition) -> GeometryResult<()> {
    if position.altitude > MIN_READER_ALTITUDE_METRES {
        Ok(())
    } else {
        Err(GeometryError::EphemerisConventionMismatch(format!(
            "satellite altitude {} does not look like metres",
            position.altitude
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::{AltitudeUnit, LookAngles, TopocentricLook};

    #[test]
    fn test_kilometre_look_passes() {
        let scale = verify_altitude_convention(&TopocentricLook::new(AltitudeUnit::Kilometers)).unwrap();
        assert_eq!(scale, AltitudeScale::METRES_TO_KM);
    }

    #[test]
    fn test_metre_look_is_rejected() {
        let result = verify_altitude_convention(&TopocentricLook::new(AltitudeUnit::Meters));
        assert!(matches!(result, Err(GeometryError::EphemerisConventionMismatch(_))));
    }

    /// A look whose answers are swapped relative to the kilometre branch.
    struct SwappedLook;

    impl ObserverLook for SwappedLook {
        fn look(&self, satellite: &SatellitePosition, _: &DateTime<Utc>, _: f64, _: f64, _: f64) -> LookAngles {
            let elevation = if satellite.altitude > 1.0e6 { 10.0 } else { 45.0 };
            LookAngles {
                azimuth: 180.0,
                elevation,
            }
        }
    }

    #[test]
    fn test_swapped_probe_is_rejected() {
        assert!(matches!(
            verify_altitude_convention(&SwappedLook),
            Err(GeometryError::EphemerisConventionMismatch(_))
        ));
    }

    #[test]
    fn test_reader_altitude_must_be_metres() {
        assert!(check_reader_altitude(&SatellitePosition::new(0.0, 0.0, 35_785_831.0)).is_ok());
        assert!(check_reader_altitude(&SatellitePosition::new(0.0, 0.0, 35_785.831)).is_err());
    }

    #[test]
    fn test_scale_converts_to_km() {
        let pos = AltitudeScale::METRES_TO_KM.apply(&SatellitePosition::new(9.5, 0.0, 35_785_831.0));
        assert!((pos.altitude - 35_785.831).abs() < 1e-9);
        assert_eq!(pos.longitude, 9.5);
    }
}
