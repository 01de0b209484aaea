//! Attribute normalization.
//!
//! Rewrites the reader's attribute sets into the canonical schema: a global
//! header built from the reference band, canonical tags and defaults on
//! every channel, and cleaned ancillary datasets. Every write is either
//! deterministic or guarded by a presence check, so normalizing a scene
//! twice gives the same result as normalizing it once.

use chrono::{DateTime, Utc};
use geometry::sun_earth_distance_correction;
use l1c_common::{date_created, AttrValue, Attributes, Scene};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{ConversionError, Result};
use crate::profile::{BandCategory, InstrumentProfile};

/// Orbit number written when the real one is not known.
pub const ORBIT_NUMBER_PLACEHOLDER: u32 = 99999;

/// Trailing component of a `>`-separated hierarchical identifier.
///
/// `"X>Y>Z"` becomes `"Z"`; values without a separator are only trimmed.
pub fn strip_hierarchy(value: &str) -> &str {
    value.rsplit('>').next().unwrap_or(value).trim()
}

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Applies an instrument profile's rules to scenes.
#[derive(Debug, Clone)]
pub struct Normalizer {
    profile: Arc<InstrumentProfile>,
    orbit_number: Option<u32>,
}

impl Normalizer {
    pub fn new(profile: Arc<InstrumentProfile>) -> Self {
        Self {
            profile,
            orbit_number: None,
        }
    }

    /// Write a known orbit number instead of the placeholder.
    pub fn with_orbit_number(mut self, orbit_number: Option<u32>) -> Self {
        self.orbit_number = orbit_number;
        self
    }

    pub fn profile(&self) -> &InstrumentProfile {
        &self.profile
    }

    /// Normalize `scene` in place, stamping `date_created` with the current time.
    pub fn normalize(&self, scene: &mut Scene) -> Result<()> {
        self.normalize_at(scene, Utc::now())
    }

    /// Normalize `scene` in place with an explicit creation time.
    #[instrument(skip(self, scene), fields(profile = %self.profile.name))]
    pub fn normalize_at(&self, scene: &mut Scene, now: DateTime<Utc>) -> Result<()> {
        let reference = self.profile.reference_band.as_str();
        let reference_attrs = scene
            .get(reference)
            .map(|band| band.attrs.clone())
            .ok_or_else(|| {
                ConversionError::PreconditionViolation(format!(
                    "reference band '{}' is not in the scene",
                    reference
                ))
            })?;

        self.set_identifiers(scene, &reference_attrs, now);
        self.set_channel_defaults(scene);
        self.move_to_header(scene, &reference_attrs);
        self.stamp_distance_correction(scene, &reference_attrs);
        self.strip_channels(scene);
        self.strip_ancillary(scene);

        debug!(header_attributes = scene.attrs.len(), "Scene normalized");
        Ok(())
    }

    fn set_identifiers(&self, scene: &mut Scene, reference: &Attributes, now: DateTime<Utc>) {
        let header = &mut scene.attrs;

        if let Some(platform) = reference
            .get_str("platform_name")
            .or_else(|| reference.get_str("platform"))
        {
            header.insert("platform", strip_hierarchy(platform));
        }

        let instrument = reference
            .get_str("instrument")
            .map(strip_hierarchy)
            .unwrap_or(self.profile.instrument.as_str());
        header.insert("instrument", instrument);

        if let Some(sensor) = reference.get_str("sensor") {
            header.insert("sensor", strip_hierarchy(sensor));
        }

        header.insert_if_absent("source", self.profile.source.as_str());
        header.insert(
            "orbit_number",
            i64::from(self.orbit_number.unwrap_or(ORBIT_NUMBER_PLACEHOLDER)),
        );
        header.insert_if_absent("date_created", date_created(&now));
    }

    fn set_channel_defaults(&self, scene: &mut Scene) {
        let platform = scene.attrs.get("platform").cloned();
        let instrument = scene.attrs.get("instrument").cloned();
        let present: Vec<_> = self.profile.present_channels(scene).cloned().collect();

        for (image, channel) in present.iter().enumerate() {
            let Some(band) = scene.get_mut(&channel.band) else {
                continue;
            };
            let attrs = &mut band.attrs;

            attrs.insert("id_tag", channel.tag.as_str());
            attrs.insert(
                "description",
                format!("{} {}", self.profile.instrument, channel.band),
            );
            if let Some(range) = channel.valid_range() {
                attrs.insert_if_absent("valid_range", range.to_vec());
            }
            if channel.category != BandCategory::Reflectance {
                attrs.insert_if_absent("sun_earth_distance_correction_applied", flag(false));
                attrs.insert_if_absent("sun_earth_distance_correction_factor", 1.0);
            }
            attrs.insert_if_absent("sun_zenith_angle_correction_applied", flag(false));
            attrs.insert("name", format!("image{}", image));
            attrs.insert("coordinates", "lon lat");

            if let Some(platform) = &platform {
                attrs.insert("platform", platform.clone());
            }
            if let Some(instrument) = &instrument {
                attrs.insert("instrument", instrument.clone());
            }
        }
    }

    fn move_to_header(&self, scene: &mut Scene, reference: &Attributes) {
        let rules = &self.profile.rules;
        let header = &mut scene.attrs;

        for name in rules.move_to_header.iter().chain(&rules.copy_to_header) {
            if let Some(value) = reference.get(name) {
                header.insert(name.as_str(), value.clone());
            }
        }
        for (from, to) in &rules.rename_and_move {
            if let Some(value) = reference.get(from) {
                header.insert(to.as_str(), value.clone());
            }
        }
    }

    /// Factor for reflectance bands that do not carry their own.
    fn distance_correction_factor(&self, reference: &Attributes) -> f64 {
        if let Some(factor) = reference.get_f64("sun_earth_distance_correction_factor") {
            return factor;
        }
        match reference.get_time("start_time") {
            Some(start) if self.profile.sun_earth_distance_corrected => sun_earth_distance_correction(&start),
            _ => 1.0,
        }
    }

    fn stamp_distance_correction(&self, scene: &mut Scene, reference: &Attributes) {
        let applied = flag(self.profile.sun_earth_distance_corrected);
        let factor = self.distance_correction_factor(reference);

        for channel in &self.profile.channels {
            if channel.category != BandCategory::Reflectance {
                continue;
            }
            if let Some(band) = scene.get_mut(&channel.band) {
                band.attrs.insert("sun_earth_distance_correction_applied", applied);
                band.attrs.insert_if_absent("sun_earth_distance_correction_factor", AttrValue::Float(factor));
            }
        }
    }

    fn strip_channels(&self, scene: &mut Scene) {
        let rules = &self.profile.rules;
        for channel in &self.profile.channels {
            if let Some(band) = scene.get_mut(&channel.band) {
                let removed = band.attrs.remove_all(rules.band_removals());
                if removed > 0 {
                    debug!(band = %channel.band, removed, "Stripped channel attributes");
                }
            }
        }
    }

    fn strip_ancillary(&self, scene: &mut Scene) {
        let rules = &self.profile.rules;
        for spec in &self.profile.ancillary {
            if let Some(band) = scene.get_mut(&spec.name) {
                band.attrs
                    .remove_all(rules.ancillary_removals(spec.strip_band_attributes));
            }
        }
        for angle in &self.profile.angles {
            if let Some(band) = scene.get_mut(angle.tag()) {
                band.attrs.remove_all(rules.band_removals());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ChannelSpec;
    use crate::rules::RuleSet;
    use chrono::TimeZone;
    use l1c_common::Band;
    use ndarray::ArrayD;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 10, 5, 11, 15, 0).unwrap()
    }

    fn tiny_profile(corrected: bool) -> Arc<InstrumentProfile> {
        let mut profile = InstrumentProfile::seviri();
        profile.channels = vec![
            ChannelSpec::new("VIS006", "ch_r06", BandCategory::Reflectance),
            ChannelSpec::new("IR_108", "ch_tb11", BandCategory::BrightnessTemperature),
        ];
        profile.sun_earth_distance_corrected = corrected;
        profile.rules = RuleSet {
            remove: vec!["comment".to_string()],
            move_to_header: vec!["history".to_string()],
            rename_and_move: [("id".to_string(), "product_id".to_string())].into_iter().collect(),
            copy_to_header: vec!["start_time".to_string(), "end_time".to_string()],
            ..RuleSet::default()
        };
        Arc::new(profile)
    }

    fn scene() -> Scene {
        let mut scene = Scene::new();
        let mut ir = Band::new(ArrayD::zeros(vec![2, 2]));
        ir.attrs.insert("platform_name", "MSG>Meteosat-10");
        ir.attrs.insert("start_time", t0());
        ir.attrs.insert("end_time", t0());
        ir.attrs.insert("history", "created");
        ir.attrs.insert("id", "abc");
        ir.attrs.insert("comment", "drop me");
        scene.insert("IR_108", ir);

        let mut vis = Band::new(ArrayD::zeros(vec![2, 2]));
        vis.attrs.insert("comment", "drop me too");
        scene.insert("VIS006", vis);

        scene.insert("HRV", Band::new(ArrayD::zeros(vec![2, 2])));
        scene
    }

    #[test]
    fn test_strip_hierarchy() {
        assert_eq!(strip_hierarchy("X>Y>Z"), "Z");
        assert_eq!(strip_hierarchy("NOAA-19"), "NOAA-19");
        assert_eq!(strip_hierarchy("a > b "), "b");
    }

    #[test]
    fn test_missing_reference_band() {
        let normalizer = Normalizer::new(tiny_profile(false));
        let mut scene = Scene::new();
        assert!(matches!(
            normalizer.normalize_at(&mut scene, t0()),
            Err(ConversionError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_header_and_band_defaults() {
        let normalizer = Normalizer::new(tiny_profile(false));
        let mut scene = scene();
        normalizer.normalize_at(&mut scene, t0()).unwrap();

        assert_eq!(scene.attrs.get_str("platform"), Some("Meteosat-10"));
        assert_eq!(scene.attrs.get_str("instrument"), Some("SEVIRI"));
        assert_eq!(scene.attrs.get("orbit_number"), Some(&AttrValue::Int(99999)));
        assert_eq!(scene.attrs.get_str("date_created"), Some("2014-10-05T11:15:00Z"));
        assert_eq!(scene.attrs.get_str("history"), Some("created"));
        assert_eq!(scene.attrs.get_str("product_id"), Some("abc"));
        assert_eq!(scene.attrs.get_time("start_time"), Some(t0()));

        let vis = &scene.get("VIS006").unwrap().attrs;
        assert_eq!(vis.get_str("id_tag"), Some("ch_r06"));
        assert_eq!(vis.get_str("name"), Some("image0"));
        assert_eq!(vis.get_str("description"), Some("SEVIRI VIS006"));
        assert_eq!(vis.get_str("sun_earth_distance_correction_applied"), Some("False"));
        assert_eq!(vis.get_f64("sun_earth_distance_correction_factor"), Some(1.0));
        assert!(!vis.contains("comment"));

        let ir = &scene.get("IR_108").unwrap().attrs;
        assert_eq!(ir.get_str("name"), Some("image1"));
        assert_eq!(ir.get_str("platform"), Some("Meteosat-10"));
        assert!(!ir.contains("history"));
        assert!(!ir.contains("id"));
        assert!(ir.contains("start_time"));

        // Bands outside the mapping are untouched.
        assert!(scene.get("HRV").unwrap().attrs.is_empty());
    }

    #[test]
    fn test_configured_orbit_number() {
        let normalizer = Normalizer::new(tiny_profile(false)).with_orbit_number(Some(12345));
        let mut scene = scene();
        normalizer.normalize_at(&mut scene, t0()).unwrap();
        assert_eq!(scene.attrs.get("orbit_number"), Some(&AttrValue::Int(12345)));
    }

    #[test]
    fn test_corrected_profile_computes_factor() {
        let normalizer = Normalizer::new(tiny_profile(true));
        let mut scene = scene();
        normalizer.normalize_at(&mut scene, t0()).unwrap();

        let vis = &scene.get("VIS006").unwrap().attrs;
        assert_eq!(vis.get_str("sun_earth_distance_correction_applied"), Some("True"));
        let expected = sun_earth_distance_correction(&t0());
        assert_eq!(vis.get_f64("sun_earth_distance_correction_factor"), Some(expected));
    }

    #[test]
    fn test_reference_factor_wins() {
        let normalizer = Normalizer::new(tiny_profile(true));
        let mut scene = scene();
        scene
            .band_mut("IR_108")
            .unwrap()
            .attrs
            .insert("sun_earth_distance_correction_factor", 0.97);
        normalizer.normalize_at(&mut scene, t0()).unwrap();

        let vis = &scene.get("VIS006").unwrap().attrs;
        assert_eq!(vis.get_f64("sun_earth_distance_correction_factor"), Some(0.97));
    }

    #[test]
    fn test_band_factor_kept_over_reference() {
        let normalizer = Normalizer::new(tiny_profile(true));
        let mut scene = scene();
        scene
            .band_mut("IR_108")
            .unwrap()
            .attrs
            .insert("sun_earth_distance_correction_factor", 0.97);
        scene
            .band_mut("VIS006")
            .unwrap()
            .attrs
            .insert("sun_earth_distance_correction_factor", 1.02);
        normalizer.normalize_at(&mut scene, t0()).unwrap();

        let vis = &scene.get("VIS006").unwrap().attrs;
        assert_eq!(vis.get_f64("sun_earth_distance_correction_factor"), Some(1.02));
        assert_eq!(vis.get_str("sun_earth_distance_correction_applied"), Some("True"));
    }

    #[test]
    fn test_computed_factor_survives_second_run() {
        let normalizer = Normalizer::new(tiny_profile(true));
        let mut scene = scene();
        normalizer.normalize_at(&mut scene, t0()).unwrap();
        // The reference band now carries the 1.0 default of non-reflectance channels.
        assert_eq!(
            scene.get("IR_108").unwrap().attrs.get_f64("sun_earth_distance_correction_factor"),
            Some(1.0)
        );
        normalizer.normalize_at(&mut scene, t0()).unwrap();

        let expected = sun_earth_distance_correction(&t0());
        let vis = &scene.get("VIS006").unwrap().attrs;
        assert_eq!(vis.get_f64("sun_earth_distance_correction_factor"), Some(expected));
    }

    #[test]
    fn test_second_run_is_noop() {
        let normalizer = Normalizer::new(tiny_profile(true));
        let mut once = scene();
        normalizer.normalize_at(&mut once, t0()).unwrap();
        let mut twice = once.clone();
        normalizer.normalize_at(&mut twice, t0()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_numbering_skips_absent_channels() {
        let normalizer = Normalizer::new(tiny_profile(false));
        let mut scene = scene();
        scene.remove("VIS006");
        normalizer.normalize_at(&mut scene, t0()).unwrap();
        assert_eq!(scene.get("IR_108").unwrap().attrs.get_str("name"), Some("image0"));
    }
}
