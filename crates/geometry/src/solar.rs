//! Low-precision solar ephemeris.
//!
//! Accurate to roughly 0.01 degrees between 1950 and 2050, which is well
//! below the 0.01 degree packing step of the angle variables.

use chrono::{DateTime, Utc};
use std::f64::consts::TAU;

/// Unix timestamp of the J2000 epoch (2000-01-01T12:00:00Z).
const J2000_UNIX_SECONDS: f64 = 946_728_000.0;

const SECONDS_PER_DAY: f64 = 86_400.0;
const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Fractional days since the J2000 epoch.
pub fn days_since_j2000(time: &DateTime<Utc>) -> f64 {
    let seconds = time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) * 1e-9;
    (seconds - J2000_UNIX_SECONDS) / SECONDS_PER_DAY
}

fn centuries_since_j2000(time: &DateTime<Utc>) -> f64 {
    days_since_j2000(time) / DAYS_PER_CENTURY
}

/// Greenwich mean sidereal time in radians, in [0, 2π).
pub fn gmst(time: &DateTime<Utc>) -> f64 {
    let ut1 = centuries_since_j2000(time);
    let theta = 67_310.548_41
        + ut1 * (876_600.0 * 3600.0 + 8_640_184.812_866 + ut1 * (0.093_104 - ut1 * 6.2e-6));
    (theta / 240.0).to_radians().rem_euclid(TAU)
}

/// Ecliptic longitude of the sun in radians.
fn sun_ecliptic_longitude(t: f64) -> f64 {
    let mean_anomaly =
        (357.529_10 + 35_999.050_30 * t - 0.000_155_9 * t * t - 0.000_000_48 * t * t * t).to_radians();
    let mean_longitude = (280.466_45 + 36_000.769_83 * t + 0.000_303_2 * t * t).to_radians();
    let equation_of_center = ((1.914_600 - 0.004_817 * t - 0.000_014 * t * t) * mean_anomaly.sin()
        + (0.019_993 - 0.000_101 * t) * (2.0 * mean_anomaly).sin()
        + 0.000_290 * (3.0 * mean_anomaly).sin())
    .to_radians();
    mean_longitude + equation_of_center
}

/// Sun-earth distance correction factor for reflectances.
///
/// `1 - 0.0167 * cos(2π (d - 3) / 365.25636)` with `d` the J2000 day count.
pub fn sun_earth_distance_correction(time: &DateTime<Utc>) -> f64 {
    1.0 - 0.0167 * (TAU * (days_since_j2000(time) - 3.0) / 365.256_36).cos()
}

/// Solar position for one instant.
///
/// Right ascension, declination and sidereal time only depend on time, so
/// they are computed once per scene and reused for every pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarEphemeris {
    /// Right ascension in radians.
    pub right_ascension: f64,
    /// Declination in radians.
    pub declination: f64,
    /// Greenwich mean sidereal time in radians.
    pub gmst: f64,
}

impl SolarEphemeris {
    pub fn at(time: &DateTime<Utc>) -> Self {
        let t = centuries_since_j2000(time);
        let obliquity = (23.0 + 26.0 / 60.0 + 21.448 / 3600.0
            - (46.8150 * t + 0.000_59 * t * t - 0.001_813 * t * t * t) / 3600.0)
            .to_radians();
        let ecliptic_lon = sun_ecliptic_longitude(t);

        let x = ecliptic_lon.cos();
        let y = obliquity.cos() * ecliptic_lon.sin();
        let z = obliquity.sin() * ecliptic_lon.sin();
        let r = (1.0 - z * z).sqrt();

        Self {
            right_ascension: 2.0 * y.atan2(x + r),
            declination: z.atan2(r),
            gmst: gmst(time),
        }
    }

    fn hour_angle(&self, lon_rad: f64) -> f64 {
        self.gmst + lon_rad - self.right_ascension
    }

    fn cos_zenith(&self, lon_deg: f64, lat_deg: f64) -> f64 {
        let lat = lat_deg.to_radians();
        let h = self.hour_angle(lon_deg.to_radians());
        lat.sin() * self.declination.sin() + lat.cos() * self.declination.cos() * h.cos()
    }

    /// Solar altitude and azimuth in radians.
    ///
    /// Azimuth is measured from north, positive towards east, in [-π, π].
    pub fn alt_az(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let h = self.hour_angle(lon_deg.to_radians());
        let dec = self.declination;
        let altitude = (lat.sin() * dec.sin() + lat.cos() * dec.cos() * h.cos()).asin();
        let azimuth = (-h.sin()).atan2(lat.cos() * dec.tan() - lat.sin() * h.cos());
        (altitude, azimuth)
    }

    /// Solar zenith angle in degrees, in [0, 180].
    pub fn zenith_deg(&self, lon_deg: f64, lat_deg: f64) -> f64 {
        self.cos_zenith(lon_deg, lat_deg).clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Solar azimuth in degrees from north, in [-180, 180].
    pub fn azimuth_deg(&self, lon_deg: f64, lat_deg: f64) -> f64 {
        self.alt_az(lon_deg, lat_deg).1.to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MAX_DECLINATION: f64 = 23.44 * std::f64::consts::PI / 180.0;

    #[test]
    fn test_j2000_epoch() {
        let epoch = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(days_since_j2000(&epoch), 0.0);
        let next = Utc.with_ymd_and_hms(2000, 1, 2, 0, 0, 0).unwrap();
        assert!((days_since_j2000(&next) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_gmst_in_range() {
        let t = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap();
        let g = gmst(&t);
        assert!((0.0..TAU).contains(&g));
    }

    #[test]
    fn test_declination_near_solstice() {
        let t = Utc.with_ymd_and_hms(2020, 6, 21, 12, 0, 0).unwrap();
        let eph = SolarEphemeris::at(&t);
        assert!((eph.declination - MAX_DECLINATION).abs() < 0.2_f64.to_radians());
    }

    #[test]
    fn test_equinox_noon_sun_overhead_at_equator() {
        // Around the March equinox the sun stands almost at zenith at the
        // equator near the longitude where it is local noon.
        let t = Utc.with_ymd_and_hms(2020, 3, 20, 12, 0, 0).unwrap();
        let eph = SolarEphemeris::at(&t);
        let zenith = eph.zenith_deg(0.0, 0.0);
        assert!(zenith < 3.0, "zenith at subsolar point was {zenith}");

        let night = eph.zenith_deg(180.0, 0.0);
        assert!(night > 177.0, "zenith at antisolar point was {night}");
    }

    #[test]
    fn test_morning_sun_in_the_east() {
        let t = Utc.with_ymd_and_hms(2020, 3, 20, 6, 0, 0).unwrap();
        let eph = SolarEphemeris::at(&t);
        let azimuth = eph.azimuth_deg(0.0, 45.0);
        assert!(azimuth > 45.0 && azimuth < 135.0, "azimuth was {azimuth}");
    }

    #[test]
    fn test_distance_correction_bounds() {
        let perihelion = Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap();
        let aphelion = Utc.with_ymd_and_hms(2020, 7, 4, 0, 0, 0).unwrap();
        assert!(sun_earth_distance_correction(&perihelion) < 0.985);
        assert!(sun_earth_distance_correction(&aphelion) > 1.015);
    }
}
