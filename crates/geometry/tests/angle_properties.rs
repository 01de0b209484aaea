//! Range properties of the viewing geometry over a SEVIRI full disk.

use chrono::{TimeZone, Utc};
use geometry::{
    sanitize_lonlats, GeometryEngine, GeostationaryArea, SatellitePosition, TopocentricLook, INVALID_COORDINATE,
};

/// Coarse version of the full disk so the test stays fast.
fn coarse_disk() -> GeostationaryArea {
    GeostationaryArea {
        rows: 64,
        cols: 64,
        ..GeostationaryArea::seviri_full_disk(0.0).rotated_180()
    }
}

#[test]
fn test_angle_ranges_over_disk() {
    let area = coarse_disk();
    let (mut lons, mut lats) = area.lonlats();
    sanitize_lonlats(&mut lons, &mut lats).unwrap();

    let engine = GeometryEngine::new(TopocentricLook::default()).unwrap();
    let time = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap();
    let satellite = SatellitePosition::new(0.0, 0.0, 35_785_831.0);
    let angles = engine.compute(&time, &satellite, &lons, &lats).unwrap();

    let mut valid = 0;
    for ((row, col), &lat) in lats.indexed_iter() {
        if lat == INVALID_COORDINATE {
            continue;
        }
        valid += 1;
        let sunz = angles.sun_zenith[[row, col]];
        let satz = angles.sat_zenith[[row, col]];
        let diff = angles.azimuth_diff[[row, col]];
        let suna = angles.sun_azimuth[[row, col]];
        let sata = angles.sat_azimuth[[row, col]];

        assert!((0.0..=180.0).contains(&sunz), "sun zenith {sunz} at ({row}, {col})");
        assert!((0.0..=90.0).contains(&satz), "sat zenith {satz} at ({row}, {col})");
        assert!((0.0..=180.0).contains(&diff), "azimuth diff {diff} at ({row}, {col})");
        assert!((-180.0..=180.0).contains(&suna), "sun azimuth {suna} at ({row}, {col})");
        assert!((0.0..360.0).contains(&sata), "sat azimuth {sata} at ({row}, {col})");
    }
    // Roughly pi/4 of the square grid lies on the disk.
    assert!(valid > 64 * 64 / 2, "only {valid} valid pixels");
}

#[test]
fn test_sat_zenith_grows_away_from_nadir() {
    let engine = GeometryEngine::new(TopocentricLook::default()).unwrap();
    let time = Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap();
    let satellite = SatellitePosition::new(0.0, 0.0, 35_785_831.0);

    let lons = ndarray::array![[0.0, 0.0, 0.0]];
    let lats = ndarray::array![[0.0, 30.0, 60.0]];
    let angles = engine.compute(&time, &satellite, &lons, &lats).unwrap();

    let satz = &angles.sat_zenith;
    assert!(satz[[0, 0]] < 0.01);
    assert!(satz[[0, 0]] < satz[[0, 1]]);
    assert!(satz[[0, 1]] < satz[[0, 2]]);
}

#[test]
fn test_off_disk_pixels_are_sanitized() {
    let area = coarse_disk();
    let (mut lons, mut lats) = area.lonlats();
    sanitize_lonlats(&mut lons, &mut lats).unwrap();

    assert_eq!(lons[[0, 0]], INVALID_COORDINATE);
    assert_eq!(lats[[0, 0]], INVALID_COORDINATE);
    assert!(lons.iter().all(|v| v.is_finite()));
    assert!(lats.iter().all(|v| v.is_finite()));
}
