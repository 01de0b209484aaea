//! Synthetic scenes shaped like the output of the instrument readers.

use chrono::{DateTime, Duration, TimeZone, Utc};
use geometry::GeostationaryArea;
use l1c_common::{AttrValue, Attributes, Band, Scene};
use ndarray::ArrayD;
use std::collections::BTreeMap;

use crate::generators::{lonlat_grid, ramp, scanline_times};

/// Common time values for testing.
pub mod time {
    use super::*;

    /// Nominal start of the SEVIRI test repeat cycle (2014-10-05 11:15 UTC).
    pub fn seviri_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap() + Duration::milliseconds(412)
    }

    pub fn seviri_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 10, 5, 11, 27, 41).unwrap()
    }

    /// Start of the GAC test orbit (2009-07-01 00:35:17 UTC).
    pub fn gac_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2009, 7, 1, 0, 35, 17).unwrap()
    }

    pub fn gac_end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2009, 7, 1, 1, 23, 12).unwrap()
    }
}

/// SEVIRI 0° service satellite height (metres).
pub const SEVIRI_HEIGHT: f64 = 35_785_831.0;

/// Raw (south-up) extent of a box over southern Europe, in projection metres.
///
/// Rotated by 180° it covers x ∈ [0, 1500 km] and y ∈ [3000, 4500 km].
pub const EUROPE_RAW_EXTENT: [f64; 4] = [1_500_000.0, 4_500_000.0, 0.0, 3_000_000.0];

/// Small SEVIRI area over southern Europe in reader orientation.
pub fn seviri_area(rows: usize, cols: usize) -> GeostationaryArea {
    GeostationaryArea {
        rows,
        cols,
        ..GeostationaryArea::seviri_full_disk(0.0)
    }
    .with_extent(EUROPE_RAW_EXTENT)
}

/// `orbital_parameters` of a geostationary satellite at `lon`.
pub fn geostationary_orbit(lon: f64) -> BTreeMap<String, AttrValue> {
    let mut params = BTreeMap::new();
    for prefix in ["satellite_nominal", "projection"] {
        params.insert(format!("{prefix}_longitude"), AttrValue::Float(lon));
        params.insert(format!("{prefix}_latitude"), AttrValue::Float(0.0));
        params.insert(format!("{prefix}_altitude"), AttrValue::Float(SEVIRI_HEIGHT));
    }
    params
}

/// Attributes the HRIT reader puts on every SEVIRI band.
pub fn seviri_band_attrs(platform: &str, units: &str) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("platform_name", platform);
    attrs.insert("sensor", "seviri");
    attrs.insert("units", units);
    attrs.insert("start_time", time::seviri_start());
    attrs.insert("end_time", time::seviri_end());
    attrs.insert("orbital_parameters", geostationary_orbit(0.0));
    attrs.insert("georef_offset_corrected", true);
    attrs.insert("raw_metadata", "prologue dump");
    attrs
}

/// SEVIRI scene over Europe with two mapped channels and one unmapped one.
///
/// `VIS006` holds reflectances from 20 %, `IR_108` (the reference band)
/// brightness temperatures from 280 K, `HRV` is not a level-1c channel.
pub fn seviri_scene(rows: usize, cols: usize, platform: &str) -> Scene {
    let area = seviri_area(rows, cols);
    let mut scene = Scene::new();
    scene.sensor.insert("seviri".to_string());

    for (name, data, units) in [
        ("VIS006", ramp(rows, cols, 20.0, 1.0), "%"),
        ("IR_108", ramp(rows, cols, 280.0, 1.0), "K"),
        ("HRV", ramp(rows, cols, 5.0, 0.0), "%"),
    ] {
        let mut band = Band::with_attrs(data, seviri_band_attrs(platform, units));
        band.area = Some(area.clone());
        band.coords
            .aux
            .insert("acq_time".to_string(), ArrayD::zeros(vec![rows]));
        scene.insert(name, band);
    }
    scene
}

/// Global attributes the GAC FDR reader repeats on every band.
pub fn gac_band_attrs(units: &str) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("platform_name", "NOAA-19");
    attrs.insert("sensor", "avhrr-3");
    attrs.insert("units", units);
    attrs.insert("start_time", time::gac_start());
    attrs.insert("end_time", time::gac_end());
    attrs.insert("id", "DOI:10.5676/EUM_SAF_CM/FCDR_AVHRR_GAC/V001");
    attrs.insert("licence", "EUMETSAT data policy");
    attrs.insert("product_version", "1.0");
    attrs.insert("history", "Created by pygac-fdr");
    attrs.insert("source", "AVHRR GAC Level 1 Data");
    attrs.insert("title", "AVHRR GAC FDR");
    attrs.insert("orbit_number_start", 2345_i64);
    attrs.insert("comment", "internal");
    attrs.insert("creator_email", "ops@example.org");
    attrs.insert("_satpy_id", "DataID(name='x')");
    attrs.insert("valid_min", 0_i64);
    attrs
}

/// AVHRR GAC FDR scene with reader-provided geolocation and angles.
pub fn gac_scene(rows: usize, cols: usize) -> Scene {
    let (lons, lats) = lonlat_grid(rows, cols, (-10.0, 10.0), (40.0, 60.0));
    let times = scanline_times(&time::gac_start(), rows, 500).into_dyn();

    let mut scene = Scene::new();
    scene.sensor.insert("avhrr-3".to_string());

    let channels = [
        ("reflectance_channel_1", 30.0, "%"),
        ("reflectance_channel_2", 25.0, "%"),
        ("reflectance_channel_3", 10.0, "%"),
        ("brightness_temperature_channel_3", 290.0, "K"),
        ("brightness_temperature_channel_4", 280.0, "K"),
        ("brightness_temperature_channel_5", 279.0, "K"),
    ];
    for (name, start, units) in channels {
        let mut band = Band::with_attrs(ramp(rows, cols, start, 0.5), gac_band_attrs(units));
        band.coords.aux.insert("latitude".to_string(), lats.clone().into_dyn());
        band.coords.aux.insert("longitude".to_string(), lons.clone().into_dyn());
        band.coords.aux.insert("acq_time".to_string(), times.clone());
        scene.insert(name, band);
    }

    for (name, start) in [
        ("solar_zenith_angle", 40.0),
        ("sensor_zenith_angle", 10.0),
        ("solar_azimuth_angle", 120.0),
        ("sensor_azimuth_angle", 250.0),
        ("sun_sensor_azimuth_difference_angle", 130.0),
    ] {
        scene.insert(name, Band::with_attrs(ramp(rows, cols, start, 0.1), gac_band_attrs("degrees")));
    }

    let mut flags = Band::with_attrs(ArrayD::zeros(vec![rows]), gac_band_attrs("1"));
    flags.attrs.insert("coordinates", "acq_time");
    flags.coords.aux.insert("acq_time".to_string(), times);
    scene.insert("qual_flags", flags);

    scene.insert(
        "overlap_free_end",
        Band::with_attrs(ArrayD::from_elem(vec![1], rows as f64), gac_band_attrs("1")),
    );
    scene.insert(
        "midnight_line",
        Band::with_attrs(ArrayD::from_elem(vec![1], f64::NAN), gac_band_attrs("1")),
    );
    scene
}
