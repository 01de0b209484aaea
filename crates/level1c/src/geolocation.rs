//! Geolocation and viewing geometry of a reference band.

use chrono::{DateTime, Utc};
use geometry::{sanitize_lonlats, AngleSet, GeometryEngine, GeometryError, ObserverLook, SatellitePosition};
use l1c_common::{AttrValue, Attributes, Band};
use ndarray::Array2;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ConversionError, Result};

/// Key prefixes in `orbital_parameters`, most precise first.
const POSITION_SOURCES: [&str; 3] = ["satellite_actual", "satellite_nominal", "projection"];

/// Satellite position from a band's `orbital_parameters` attribute.
///
/// Uses the first complete triple of `*_longitude`, `*_latitude` and
/// `*_altitude` among actual, nominal and projection values.
pub fn satellite_position(attrs: &Attributes) -> std::result::Result<SatellitePosition, GeometryError> {
    let params = attrs.get_map("orbital_parameters").ok_or_else(|| {
        GeometryError::MissingSatellitePosition("no orbital_parameters attribute".to_string())
    })?;

    let value = |key: String| params.get(&key).and_then(AttrValue::as_f64);

    POSITION_SOURCES
        .iter()
        .find_map(|prefix| {
            let lon = value(format!("{prefix}_longitude"))?;
            let lat = value(format!("{prefix}_latitude"))?;
            let alt = value(format!("{prefix}_altitude"))?;
            debug!(source = %prefix, lon, lat, alt, "Satellite position");
            Some(SatellitePosition::new(lon, lat, alt))
        })
        .ok_or_else(|| {
            GeometryError::MissingSatellitePosition(format!(
                "orbital_parameters has no complete position among {:?}",
                POSITION_SOURCES
            ))
        })
}

/// Orbital parameters map for tests and readers.
pub fn orbital_parameters(prefix: &str, lon: f64, lat: f64, alt: f64) -> BTreeMap<String, AttrValue> {
    [
        (format!("{prefix}_longitude"), AttrValue::Float(lon)),
        (format!("{prefix}_latitude"), AttrValue::Float(lat)),
        (format!("{prefix}_altitude"), AttrValue::Float(alt)),
    ]
    .into_iter()
    .collect()
}

/// Sanitized longitude/latitude grids of a band's geostationary area.
pub fn area_lonlats(name: &str, band: &Band) -> Result<(Array2<f64>, Array2<f64>)> {
    let area = band.area.as_ref().ok_or_else(|| {
        ConversionError::PreconditionViolation(format!("band '{}' has no area definition", name))
    })?;
    let shape = band.shape();
    if shape.len() != 2 || area.dimensions() != (shape[0], shape[1]) {
        return Err(ConversionError::PreconditionViolation(format!(
            "area of band '{}' is {:?} but data is {:?}",
            name,
            area.dimensions(),
            band.shape()
        )));
    }

    let (mut lons, mut lats) = area.lonlats();
    sanitize_lonlats(&mut lons, &mut lats)?;
    Ok((lons, lats))
}

/// Geolocation plus angles for one reference band.
pub struct Geolocation {
    pub lons: Array2<f64>,
    pub lats: Array2<f64>,
    pub angles: AngleSet,
}

/// Compute the viewing geometry of the reference band from its area.
pub fn compute_geolocation<L: ObserverLook>(
    engine: &GeometryEngine<L>,
    name: &str,
    band: &Band,
    start_time: &DateTime<Utc>,
) -> Result<Geolocation> {
    let (lons, lats) = area_lonlats(name, band)?;
    let satellite = satellite_position(&band.attrs)?;
    let angles = engine.compute(start_time, &satellite, &lons, &lats)?;
    Ok(Geolocation { lons, lats, angles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::GeostationaryArea;

    #[test]
    fn test_actual_position_preferred() {
        let mut params = orbital_parameters("satellite_actual", 9.4, 0.1, 35_786_000.0);
        params.extend(orbital_parameters("satellite_nominal", 9.5, 0.0, 35_785_831.0));
        let mut attrs = Attributes::new();
        attrs.insert("orbital_parameters", params);

        let pos = satellite_position(&attrs).unwrap();
        assert_eq!(pos.longitude, 9.4);
        assert_eq!(pos.latitude, 0.1);
    }

    #[test]
    fn test_falls_back_to_projection() {
        let mut params = orbital_parameters("projection", 0.0, 0.0, 35_785_831.0);
        // Incomplete nominal triple is skipped.
        params.insert("satellite_nominal_longitude".to_string(), AttrValue::Float(3.0));
        let mut attrs = Attributes::new();
        attrs.insert("orbital_parameters", params);

        let pos = satellite_position(&attrs).unwrap();
        assert_eq!(pos.longitude, 0.0);
        assert_eq!(pos.altitude, 35_785_831.0);
    }

    #[test]
    fn test_missing_orbital_parameters() {
        assert!(matches!(
            satellite_position(&Attributes::new()),
            Err(GeometryError::MissingSatellitePosition(_))
        ));
    }

    #[test]
    fn test_area_shape_must_match_data() {
        let mut band = Band::new(ndarray::ArrayD::zeros(vec![4, 4]));
        band.area = Some(GeostationaryArea {
            rows: 8,
            cols: 8,
            ..GeostationaryArea::seviri_full_disk(0.0)
        });
        assert!(matches!(
            area_lonlats("IR_108", &band),
            Err(ConversionError::PreconditionViolation(_))
        ));
    }
}
