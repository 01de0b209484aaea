//! Coordinate, angle and scan-line datasets written next to the channels.

use chrono::{DateTime, Utc};
use geometry::AngleSet;
use l1c_common::{Attributes, Band, Scene};
use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::{ConversionError, Result};
use crate::profile::{AngleKind, InstrumentProfile};

/// Reference band attributes repeated on every angle variable.
const ANGLE_REFERENCE_ATTRIBUTES: [&str; 4] =
    ["start_time", "end_time", "orbital_parameters", "georef_offset_corrected"];

pub const LAT: &str = "lat";
pub const LON: &str = "lon";

/// Unix epoch in the units attribute of scan-line timestamps.
pub const SCANLINE_TIME_UNITS: &str = "milliseconds since 1970-01-01";

fn set_time_range(attrs: &mut Attributes, start: DateTime<Utc>, end: DateTime<Utc>) {
    attrs.insert("start_time", start);
    attrs.insert("end_time", end);
}

fn latitude_attrs(attrs: &mut Attributes) {
    attrs.insert("long_name", "latitude coordinate");
    attrs.insert("standard_name", "latitude");
    attrs.insert("units", "degrees_north");
}

fn longitude_attrs(attrs: &mut Attributes) {
    attrs.insert("long_name", "longitude coordinate");
    attrs.insert("standard_name", "longitude");
    attrs.insert("units", "degrees_east");
}

/// Add `lat` and `lon` variables from computed grids.
pub fn add_lonlats(
    scene: &mut Scene,
    lons: &Array2<f64>,
    lats: &Array2<f64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) {
    let mut lat = Band::new(lats.clone().into_dyn());
    latitude_attrs(&mut lat.attrs);
    set_time_range(&mut lat.attrs, start, end);
    scene.insert(LAT, lat);

    let mut lon = Band::new(lons.clone().into_dyn());
    longitude_attrs(&mut lon.attrs);
    set_time_range(&mut lon.attrs, start, end);
    scene.insert(LON, lon);
}

/// Expose reader-provided `latitude`/`longitude` as `lat`/`lon`.
///
/// Variables already present in the scene are renamed; otherwise the
/// reference band's auxiliary coordinates are promoted to variables.
pub fn rename_latitude_longitude(scene: &mut Scene, reference: &str) -> Result<()> {
    for (reader_name, name) in [("latitude", LAT), ("longitude", LON)] {
        if !scene.rename(reader_name, name) && !scene.contains(name) {
            let coord = scene
                .band(reference)?
                .coords
                .aux
                .get(reader_name)
                .cloned()
                .ok_or_else(|| {
                    ConversionError::PreconditionViolation(format!(
                        "no {} variable and no {} coordinate on '{}'",
                        reader_name, reader_name, reference
                    ))
                })?;
            scene.insert(name, Band::new(coord));
        }
    }

    if let Some(lat) = scene.get_mut(LAT) {
        latitude_attrs(&mut lat.attrs);
    }
    if let Some(lon) = scene.get_mut(LON) {
        longitude_attrs(&mut lon.attrs);
    }
    Ok(())
}

fn angle_values(angles: &AngleSet, kind: AngleKind) -> &Array2<f64> {
    match kind {
        AngleKind::SunZenith => &angles.sun_zenith,
        AngleKind::SatZenith => &angles.sat_zenith,
        AngleKind::AzimuthDiff => &angles.azimuth_diff,
        AngleKind::SunAzimuth => &angles.sun_azimuth,
        AngleKind::SatAzimuth => &angles.sat_azimuth,
    }
}

/// Canonical attributes of an angle variable.
fn update_angle_attributes(band: &mut Band, kind: AngleKind, reference: &Attributes, image: usize) {
    let attrs = &mut band.attrs;
    attrs.insert("id_tag", kind.tag());
    attrs.insert("long_name", kind.long_name());
    if let Some(standard_name) = kind.standard_name() {
        attrs.insert("standard_name", standard_name);
    }
    attrs.insert("valid_range", kind.valid_range().to_vec());
    attrs.insert("units", "degree");
    attrs.insert("name", format!("image{}", image));
    for name in ANGLE_REFERENCE_ATTRIBUTES {
        if let Some(value) = reference.get(name) {
            attrs.insert(name, value.clone());
        }
    }
    band.coords.time = reference.get_time("start_time");
}

/// Add computed angle variables, numbered from `first_image`.
pub fn add_angles(
    scene: &mut Scene,
    angles: &AngleSet,
    kinds: &[AngleKind],
    reference: &Attributes,
    first_image: usize,
) {
    for (offset, kind) in kinds.iter().enumerate() {
        let mut band = Band::new(angle_values(angles, *kind).clone().into_dyn());
        update_angle_attributes(&mut band, *kind, reference, first_image + offset);
        scene.insert(kind.tag(), band);
    }
}

/// Rename reader-provided angles to their canonical names.
///
/// Angles the reader did not deliver are skipped with a warning; numbering
/// stays contiguous over the delivered ones.
pub fn rename_reader_angles(
    scene: &mut Scene,
    kinds: &[AngleKind],
    reference: &Attributes,
    first_image: usize,
) {
    let mut image = first_image;
    for kind in kinds {
        let present = scene.rename(kind.reader_name(), kind.tag()) || scene.contains(kind.tag());
        match scene.get_mut(kind.tag()) {
            Some(band) if present => {
                update_angle_attributes(band, *kind, reference, image);
                image += 1;
            }
            _ => warn!(angle = kind.tag(), reader_name = kind.reader_name(), "Angle not provided by reader"),
        }
    }
}

/// Attach the scalar time coordinate to every channel.
///
/// Auxiliary coordinates (per-line times, reader lat/lon) and the area are
/// dropped; channels refer to the `lat`/`lon` variables instead.
pub fn set_channel_coordinates(scene: &mut Scene, profile: &InstrumentProfile, start: DateTime<Utc>) {
    for channel in &profile.channels {
        if let Some(band) = scene.get_mut(&channel.band) {
            band.coords.time = Some(start);
            band.coords.aux.clear();
            band.area = None;
        }
    }
}

/// Turn per-line acquisition times into `scanline_timestamps` and tag `qual_flags`.
///
/// Acquisition times are taken from an `acq_time` variable or, failing
/// that, from the reference band's `acq_time` coordinate.
pub fn update_scanline_series(scene: &mut Scene, reference: &str, start: DateTime<Utc>) -> Result<()> {
    let acq_time = match scene.remove("acq_time") {
        Some(band) => Some(band),
        None => scene
            .band(reference)?
            .coords
            .aux
            .get("acq_time")
            .cloned()
            .map(Band::new),
    };

    if let Some(mut timestamps) = acq_time {
        timestamps.attrs.insert("name", "scanline_timestamps");
        timestamps.attrs.insert("units", SCANLINE_TIME_UNITS);
        timestamps.coords.aux.remove("acq_time");
        debug!(lines = timestamps.data.len(), "Added scan-line timestamps");
        scene.insert("scanline_timestamps", timestamps);
    }

    if let Some(flags) = scene.get_mut("qual_flags") {
        flags.attrs.insert("id_tag", "qual_flags");
        flags.attrs.insert("long_name", "pygac quality flags");
        flags.coords.time = Some(start);
        flags.coords.aux.remove("acq_time");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use l1c_common::AttrValue;
    use ndarray::{array, ArrayD};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap()
    }

    fn angle_set() -> AngleSet {
        let grid = array![[10.0, 20.0], [30.0, 40.0]];
        AngleSet {
            sun_zenith: grid.clone(),
            sun_azimuth: grid.clone() * 2.0,
            sat_zenith: grid.clone() / 2.0,
            sat_azimuth: grid.clone() + 100.0,
            azimuth_diff: grid,
        }
    }

    #[test]
    fn test_add_angles_numbering_and_attrs() {
        let mut scene = Scene::new();
        let mut reference = Attributes::new();
        reference.insert("start_time", t0());
        reference.insert("georef_offset_corrected", true);

        add_angles(
            &mut scene,
            &angle_set(),
            &[AngleKind::SunZenith, AngleKind::SatZenith, AngleKind::AzimuthDiff],
            &reference,
            11,
        );

        let satz = scene.get("satzenith").unwrap();
        assert_eq!(satz.attrs.get_str("name"), Some("image12"));
        assert_eq!(satz.attrs.get_str("units"), Some("degree"));
        assert_eq!(satz.attrs.get_str("standard_name"), Some("platform_zenith_angle"));
        assert_eq!(satz.attrs.get("georef_offset_corrected"), Some(&AttrValue::Bool(true)));
        assert_eq!(satz.coords.time, Some(t0()));
        assert_eq!(satz.data[[0, 0]], 5.0);

        let azidiff = scene.get("azimuthdiff").unwrap();
        assert_eq!(azidiff.attrs.get_str("name"), Some("image13"));
        assert!(!azidiff.attrs.contains("standard_name"));
    }

    #[test]
    fn test_rename_reader_angles_skips_missing() {
        let mut scene = Scene::new();
        scene.insert("solar_zenith_angle", Band::new(ArrayD::zeros(vec![2, 2])));
        scene.insert("sensor_azimuth_angle", Band::new(ArrayD::zeros(vec![2, 2])));

        rename_reader_angles(
            &mut scene,
            &[AngleKind::SunZenith, AngleKind::SatZenith, AngleKind::SatAzimuth],
            &Attributes::new(),
            6,
        );

        assert_eq!(scene.get("sunzenith").unwrap().attrs.get_str("name"), Some("image6"));
        assert_eq!(scene.get("satazimuth").unwrap().attrs.get_str("name"), Some("image7"));
        assert!(!scene.contains("satzenith"));
        assert!(!scene.contains("solar_zenith_angle"));
    }

    #[test]
    fn test_lat_lon_promoted_from_coordinates() {
        let mut scene = Scene::new();
        let mut band = Band::new(ArrayD::zeros(vec![2, 2]));
        band.coords.aux.insert("latitude".to_string(), ArrayD::from_elem(vec![2, 2], 60.0));
        band.coords.aux.insert("longitude".to_string(), ArrayD::from_elem(vec![2, 2], 15.0));
        scene.insert("brightness_temperature_channel_4", band);

        rename_latitude_longitude(&mut scene, "brightness_temperature_channel_4").unwrap();
        let lat = scene.get(LAT).unwrap();
        assert_eq!(lat.attrs.get_str("units"), Some("degrees_north"));
        assert_eq!(lat.data[[1, 1]], 60.0);
        assert_eq!(scene.get(LON).unwrap().data[[0, 0]], 15.0);
    }

    #[test]
    fn test_lat_lon_missing_everywhere() {
        let mut scene = Scene::new();
        scene.insert("ref", Band::new(ArrayD::zeros(vec![2, 2])));
        assert!(matches!(
            rename_latitude_longitude(&mut scene, "ref"),
            Err(ConversionError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_scanline_series_from_reference_coordinate() {
        let mut scene = Scene::new();
        let mut band = Band::new(ArrayD::zeros(vec![2, 3]));
        band.coords.aux.insert(
            "acq_time".to_string(),
            array![1_412_507_700_000.0, 1_412_507_700_500.0].into_dyn(),
        );
        scene.insert("ref", band);
        let mut flags = Band::new(array![0.0, 1.0].into_dyn());
        flags.coords.aux.insert("acq_time".to_string(), array![0.0, 1.0].into_dyn());
        scene.insert("qual_flags", flags);

        update_scanline_series(&mut scene, "ref", t0()).unwrap();

        let ts = scene.get("scanline_timestamps").unwrap();
        assert_eq!(ts.attrs.get_str("name"), Some("scanline_timestamps"));
        assert_eq!(ts.data[[1]], 1_412_507_700_500.0);

        let flags = scene.get("qual_flags").unwrap();
        assert_eq!(flags.attrs.get_str("id_tag"), Some("qual_flags"));
        assert_eq!(flags.coords.time, Some(t0()));
        assert!(flags.coords.aux.is_empty());
    }
}
