//! AVHRR GAC FDR scenes through the whole pipeline.

mod common;

use chrono::{TimeZone, Utc};
use common::{RecordingWriter, StaticReader};
use geometry::{sun_earth_distance_correction, AltitudeUnit, TopocentricLook};
use l1c_common::Scene;
use level1c::{ConversionError, Converter, InstrumentProfile, StorageType, WriteRequest};
use std::sync::Arc;
use test_utils::{gac_scene, time};

fn prepare(scene: Scene) -> level1c::Result<WriteRequest> {
    let converter = Converter::new(
        Arc::new(InstrumentProfile::avhrr_gac_fdr()),
        StaticReader { scene: Scene::new() },
        RecordingWriter::default(),
        "/out",
    )?;
    converter.prepare_at(scene, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap())
}

#[test]
fn test_gac_file_name_and_header() {
    let request = prepare(gac_scene(3, 4)).unwrap();
    assert_eq!(
        request.path.file_name().unwrap().to_string_lossy(),
        "S_NWC_avhrr_noaa19_99999_20090701T0035170Z_20090701T0123120Z.nc"
    );

    let header = &request.header;
    assert_eq!(header.get_str("platform"), Some("NOAA-19"));
    assert_eq!(header.get_str("instrument"), Some("AVHRR"));
    assert_eq!(header.get_str("sensor"), Some("avhrr"));
    assert_eq!(header.get_str("source"), Some("AVHRR GAC Level 1 Data"));
    assert_eq!(header.get_str("history"), Some("Created by pygac-fdr"));
    assert_eq!(
        header.get_str("euemtsat_gac_id"),
        Some("DOI:10.5676/EUM_SAF_CM/FCDR_AVHRR_GAC/V001")
    );
    assert_eq!(header.get_str("eumetsat_licence"), Some("EUMETSAT data policy"));
    assert_eq!(header.get_str("eumetsat_product_version"), Some("1.0"));
    assert!(!header.contains("comment"));
}

#[test]
fn test_gac_channels_are_cleaned() {
    let request = prepare(gac_scene(3, 4)).unwrap();
    let band = request.scene.get("brightness_temperature_channel_4").unwrap();
    for removed in ["id", "licence", "comment", "creator_email", "_satpy_id", "history", "source", "title"] {
        assert!(!band.attrs.contains(removed), "{} still on channel", removed);
    }
    assert_eq!(band.attrs.get_str("id_tag"), Some("ch_tb11"));
    assert_eq!(band.attrs.get_str("name"), Some("image4"));
    assert_eq!(band.attrs.get_str("platform"), Some("NOAA-19"));
    assert!(band.coords.aux.is_empty());
}

#[test]
fn test_reflectances_marked_distance_corrected() {
    let request = prepare(gac_scene(3, 4)).unwrap();
    let band = request.scene.get("reflectance_channel_1").unwrap();
    assert_eq!(band.attrs.get_str("sun_earth_distance_correction_applied"), Some("True"));
    assert_eq!(
        band.attrs.get_f64("sun_earth_distance_correction_factor"),
        Some(sun_earth_distance_correction(&time::gac_start()))
    );

    let bt = request.scene.get("brightness_temperature_channel_5").unwrap();
    assert_eq!(bt.attrs.get_str("sun_earth_distance_correction_applied"), Some("False"));
}

#[test]
fn test_reader_angles_and_coordinates_renamed() {
    let request = prepare(gac_scene(3, 4)).unwrap();
    let expected = [
        ("sunzenith", "image6"),
        ("satzenith", "image7"),
        ("azimuthdiff", "image8"),
        ("sunazimuth", "image9"),
        ("satazimuth", "image10"),
    ];
    for (tag, image) in expected {
        let band = request.scene.get(tag).unwrap();
        assert_eq!(band.attrs.get_str("name"), Some(image));
        assert_eq!(band.attrs.get_str("id_tag"), Some(tag));
        assert!(!band.attrs.contains("comment"));
    }
    assert!(!request.scene.contains("solar_zenith_angle"));

    let lat = request.scene.get("lat").unwrap();
    assert_eq!(lat.shape(), &[3, 4]);
    assert_eq!(lat.attrs.get_str("units"), Some("degrees_north"));
    assert_eq!(request.encodings["lat"].dtype, StorageType::Float32);
}

#[test]
fn test_missing_reader_angle_keeps_numbering_contiguous() {
    let mut scene = gac_scene(2, 2);
    scene.remove("sensor_zenith_angle");
    let request = prepare(scene).unwrap();
    assert!(!request.scene.contains("satzenith"));
    assert_eq!(request.scene.get("azimuthdiff").unwrap().attrs.get_str("name"), Some("image7"));
}

#[test]
fn test_ancillary_series() {
    let request = prepare(gac_scene(3, 4)).unwrap();

    let timestamps = request.scene.get("scanline_timestamps").unwrap();
    assert_eq!(timestamps.shape(), &[3]);
    assert_eq!(timestamps.data[[0]], time::gac_start().timestamp_millis() as f64);
    let encoding = &request.encodings["scanline_timestamps"];
    assert_eq!(encoding.dtype, StorageType::Int64);
    assert_eq!(encoding.units.as_deref(), Some("milliseconds since 1970-01-01"));

    let flags = request.scene.get("qual_flags").unwrap();
    assert_eq!(flags.attrs.get_str("id_tag"), Some("qual_flags"));
    assert_eq!(flags.attrs.get_str("long_name"), Some("pygac quality flags"));
    assert!(!flags.attrs.contains("valid_min"));
    assert!(!flags.attrs.contains("coordinates"));
    assert_eq!(flags.coords.time, Some(time::gac_start()));

    let overlap = request.scene.get("overlap_free_end").unwrap();
    assert!(!overlap.attrs.contains("valid_min"));
    assert!(!request.encodings.contains_key("overlap_free_end"));
    assert!(request.scene.contains("midnight_line"));
}

#[test]
fn test_seviri_scene_rejected_by_gac_profile() {
    let mut scene = gac_scene(2, 2);
    scene.sensor.clear();
    scene.sensor.insert("seviri".to_string());
    match prepare(scene) {
        Err(ConversionError::UnsupportedSensor { found, .. }) => assert_eq!(found, vec!["seviri"]),
        other => panic!("expected unsupported sensor, got {:?}", other.map(|r| r.path)),
    }
}

#[test]
fn test_reader_geometry_skips_altitude_check() {
    let converter = Converter::with_observer_look(
        Arc::new(InstrumentProfile::avhrr_gac_fdr()),
        TopocentricLook::new(AltitudeUnit::Meters),
        StaticReader { scene: Scene::new() },
        RecordingWriter::default(),
        "/out",
    )
    .unwrap();
    assert!(converter.prepare(gac_scene(2, 2)).is_ok());
}
