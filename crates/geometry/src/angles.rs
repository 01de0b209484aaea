//! Per-pixel viewing geometry.

use chrono::{DateTime, Utc};
use ndarray::{Array2, Zip};
use tracing::{debug, info};

use crate::convention::{check_reader_altitude, verify_altitude_convention, AltitudeScale};
use crate::error::{GeometryError, GeometryResult};
use crate::observer::{ObserverLook, SatellitePosition, TopocentricLook};
use crate::solar::SolarEphemeris;

/// Sentinel written into invalid longitude/latitude cells.
pub const INVALID_COORDINATE: f64 = -999.0;

/// Mark invalid geolocation in place.
///
/// Longitudes beyond ±360° (off-disk pixels come out as infinity) become
/// [`INVALID_COORDINATE`]. Latitudes are invalidated wherever the
/// sanitized longitude exceeds ±90°, which also covers every cell whose
/// longitude was just replaced by the sentinel.
pub fn sanitize_lonlats(lons: &mut Array2<f64>, lats: &mut Array2<f64>) -> GeometryResult<()> {
    check_shapes(lons, lats)?;

    Zip::from(lons).and(lats).for_each(|lon, lat| {
        if !lon.is_finite() || lon.abs() > 360.0 {
            *lon = INVALID_COORDINATE;
        }
        if lon.abs() > 90.0 || !lat.is_finite() {
            *lat = INVALID_COORDINATE;
        }
    });
    Ok(())
}

/// Absolute azimuth difference folded into [0, 180] degrees.
pub fn azimuth_difference(sat_azimuth: f64, sun_azimuth: f64) -> f64 {
    let diff = (sat_azimuth - sun_azimuth).abs().rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

fn check_shapes(lons: &Array2<f64>, lats: &Array2<f64>) -> GeometryResult<()> {
    if lons.shape() != lats.shape() {
        return Err(GeometryError::ShapeMismatch {
            lons: lons.shape().to_vec(),
            lats: lats.shape().to_vec(),
        });
    }
    Ok(())
}

/// Solar and satellite angles for a geolocation grid, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSet {
    pub sun_zenith: Array2<f64>,
    pub sun_azimuth: Array2<f64>,
    pub sat_zenith: Array2<f64>,
    pub sat_azimuth: Array2<f64>,
    pub azimuth_diff: Array2<f64>,
}

impl AngleSet {
    pub fn shape(&self) -> (usize, usize) {
        self.sun_zenith.dim()
    }
}

/// Computes [`AngleSet`]s with a verified observer-look collaborator.
///
/// Construction runs the altitude-unit probe once; an engine that exists
/// has passed it.
#[derive(Debug, Clone)]
pub struct GeometryEngine<L: ObserverLook = TopocentricLook> {
    look: L,
    scale: AltitudeScale,
}

impl<L: ObserverLook> GeometryEngine<L> {
    pub fn new(look: L) -> GeometryResult<Self> {
        let scale = verify_altitude_convention(&look)?;
        info!(altitude_scale = scale.0, "Observer look altitude convention verified");
        Ok(Self { look, scale })
    }

    /// Compute all angles for `lons`/`lats` at `time`.
    ///
    /// `satellite.altitude` is in metres as delivered by the reader. Cells
    /// holding [`INVALID_COORDINATE`] produce unspecified values.
    pub fn compute(
        &self,
        time: &DateTime<Utc>,
        satellite: &SatellitePosition,
        lons: &Array2<f64>,
        lats: &Array2<f64>,
    ) -> GeometryResult<AngleSet> {
        check_shapes(lons, lats)?;
        check_reader_altitude(satellite)?;

        let satellite = self.scale.apply(satellite);
        let ephemeris = SolarEphemeris::at(time);
        let dim = lons.dim();

        debug!(
            rows = dim.0,
            cols = dim.1,
            sat_lon = satellite.longitude,
            sat_alt_km = satellite.altitude,
            "Computing viewing geometry"
        );

        let mut sun_zenith = Array2::zeros(dim);
        let mut sun_azimuth = Array2::zeros(dim);
        let mut sat_zenith = Array2::zeros(dim);
        let mut sat_azimuth = Array2::zeros(dim);

        Zip::from(&mut sun_zenith)
            .and(&mut sun_azimuth)
            .and(&mut sat_zenith)
            .and(&mut sat_azimuth)
            .and(lons)
            .and(lats)
            .for_each(|sunz, suna, satz, sata, &lon, &lat| {
                *sunz = ephemeris.zenith_deg(lon, lat);
                *suna = ephemeris.azimuth_deg(lon, lat);
                let look = self.look.look(&satellite, time, lon, lat, 0.0);
                *satz = look.zenith();
                *sata = look.azimuth;
            });

        let azimuth_diff = Zip::from(&sat_azimuth)
            .and(&sun_azimuth)
            .map_collect(|&sata, &suna| azimuth_difference(sata, suna));

        Ok(AngleSet {
            sun_zenith,
            sun_azimuth,
            sat_zenith,
            sat_azimuth,
            azimuth_diff,
        })
    }
}
