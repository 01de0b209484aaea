//! Instrument profiles.
//!
//! A profile bundles everything instrument-specific: which reader bands
//! are channels and what they are called downstream, the attribute rule
//! tables, the ancillary datasets, orientation and where the viewing
//! geometry comes from. Profiles are built in code or loaded from YAML and
//! validated once at startup.

use l1c_common::Scene;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

use crate::error::{ConversionError, Result};
use crate::rules::RuleSet;

// ============================================================================
// Band Categories
// ============================================================================

/// Closed set of output variable kinds; selects the packing policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandCategory {
    Reflectance,
    BrightnessTemperature,
    Angle,
    Coordinate,
    QualityFlags,
    ScanlineTimestamps,
}

impl BandCategory {
    /// Whether the category is a measured channel.
    pub fn is_channel(&self) -> bool {
        matches!(self, BandCategory::Reflectance | BandCategory::BrightnessTemperature)
    }

    /// Canonical tag prefix channels of this category must use.
    fn tag_prefix(&self) -> Option<&'static str> {
        match self {
            BandCategory::Reflectance => Some("ch_r"),
            BandCategory::BrightnessTemperature => Some("ch_tb"),
            _ => None,
        }
    }

    /// Packed valid range used when neither reader nor profile gives one.
    pub fn default_valid_range(&self) -> Option<[i64; 2]> {
        match self {
            BandCategory::Reflectance => Some([0, 20000]),
            BandCategory::BrightnessTemperature => Some([-20000, 15000]),
            _ => None,
        }
    }
}

/// Viewing and solar angle variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AngleKind {
    #[serde(rename = "sunzenith")]
    SunZenith,
    #[serde(rename = "satzenith")]
    SatZenith,
    #[serde(rename = "azimuthdiff")]
    AzimuthDiff,
    #[serde(rename = "sunazimuth")]
    SunAzimuth,
    #[serde(rename = "satazimuth")]
    SatAzimuth,
}

impl AngleKind {
    /// Canonical variable name and tag.
    pub fn tag(&self) -> &'static str {
        match self {
            AngleKind::SunZenith => "sunzenith",
            AngleKind::SatZenith => "satzenith",
            AngleKind::AzimuthDiff => "azimuthdiff",
            AngleKind::SunAzimuth => "sunazimuth",
            AngleKind::SatAzimuth => "satazimuth",
        }
    }

    /// Name of the variable when a reader supplies the angle itself.
    pub fn reader_name(&self) -> &'static str {
        match self {
            AngleKind::SunZenith => "solar_zenith_angle",
            AngleKind::SatZenith => "sensor_zenith_angle",
            AngleKind::AzimuthDiff => "sun_sensor_azimuth_difference_angle",
            AngleKind::SunAzimuth => "solar_azimuth_angle",
            AngleKind::SatAzimuth => "sensor_azimuth_angle",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            AngleKind::SunZenith => "sun zenith angle",
            AngleKind::SatZenith => "satellite zenith angle",
            AngleKind::AzimuthDiff => "absolute azimuth difference angle",
            AngleKind::SunAzimuth => "sun azimuth angle",
            AngleKind::SatAzimuth => "satellite azimuth angle",
        }
    }

    pub fn standard_name(&self) -> Option<&'static str> {
        match self {
            AngleKind::SunZenith => Some("solar_zenith_angle"),
            AngleKind::SatZenith => Some("platform_zenith_angle"),
            AngleKind::AzimuthDiff => None,
            AngleKind::SunAzimuth => Some("solar_azimuth_angle"),
            AngleKind::SatAzimuth => Some("platform_azimuth_angle"),
        }
    }

    /// Valid range in packed (0.01 degree) units.
    pub fn valid_range(&self) -> [i64; 2] {
        match self {
            AngleKind::SunZenith | AngleKind::AzimuthDiff => [0, 18000],
            AngleKind::SatZenith => [0, 9000],
            AngleKind::SunAzimuth => [-18000, 18000],
            AngleKind::SatAzimuth => [0, 36000],
        }
    }
}

// ============================================================================
// Profile Components
// ============================================================================

/// One instrument channel and its canonical identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Reader band name (e.g. `IR_108`).
    pub band: String,
    /// Canonical tag (e.g. `ch_tb11`).
    pub tag: String,
    pub category: BandCategory,
    /// Packed valid range; the category default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_range: Option<[i64; 2]>,
}

impl ChannelSpec {
    pub fn new(band: &str, tag: &str, category: BandCategory) -> Self {
        Self {
            band: band.to_string(),
            tag: tag.to_string(),
            category,
            valid_range: None,
        }
    }

    pub fn valid_range(&self) -> Option<[i64; 2]> {
        self.valid_range.or_else(|| self.category.default_valid_range())
    }
}

/// A non-channel dataset that is cleaned and written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AncillarySpec {
    pub name: String,
    /// Also strip band-geometry attributes (`valid_min`, `coordinates`, ...).
    #[serde(default)]
    pub strip_band_attributes: bool,
    /// Packing policy; the writer default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<BandCategory>,
}

impl AncillarySpec {
    fn series(name: &str, category: Option<BandCategory>) -> Self {
        Self {
            name: name.to_string(),
            strip_band_attributes: true,
            category,
        }
    }
}

/// Pixel order the reader delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Pixel (0, 0) is north-west already.
    #[default]
    Native,
    /// Pixel (0, 0) is south-east; rotate channels by 180°.
    Rotate180,
}

/// Where viewing geometry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometrySource {
    /// Computed from the reference band's area and orbital parameters.
    #[default]
    Computed,
    /// Supplied by the reader as angle and latitude/longitude variables.
    Reader,
}

/// Raw filename convention used to group input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPattern {
    /// MSG HRIT segments, one scan unit per repeat cycle.
    Hrit,
    /// EUMETSAT AVHRR GAC FDR orbit files.
    GacFdr,
}

// ============================================================================
// Instrument Profile
// ============================================================================

/// Immutable per-instrument configuration bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    /// Profile name (`seviri`, `avhrr-gac-fdr`).
    pub name: String,
    /// Display name used in band descriptions and as header default.
    pub instrument: String,
    /// Sensor written to the header and the output file name.
    pub sensor: String,
    /// Sensor names a reader may declare; defaults to `sensor`.
    #[serde(default)]
    pub accepted_sensors: Vec<String>,
    /// Header `source` attribute.
    pub source: String,
    /// Band carrying authoritative timing and platform metadata.
    pub reference_band: String,
    /// Channels in output order.
    pub channels: Vec<ChannelSpec>,
    #[serde(default)]
    pub rules: RuleSet,
    #[serde(default)]
    pub ancillary: Vec<AncillarySpec>,
    /// Angle variables written after the channels.
    #[serde(default)]
    pub angles: Vec<AngleKind>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub geometry: GeometrySource,
    /// Reflectances arrive corrected for the sun-earth distance.
    #[serde(default)]
    pub sun_earth_distance_corrected: bool,
    /// Chunk sizes for 2-D variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<usize>>,
    pub input_pattern: InputPattern,
}

impl InstrumentProfile {
    /// MSG SEVIRI from HRIT segments.
    pub fn seviri() -> Self {
        use BandCategory::{BrightnessTemperature as Bt, Reflectance as Refl};
        Self {
            name: "seviri".to_string(),
            instrument: "SEVIRI".to_string(),
            sensor: "seviri".to_string(),
            accepted_sensors: vec!["seviri".to_string()],
            source: "l1c-converter seviri".to_string(),
            reference_band: "IR_108".to_string(),
            channels: vec![
                ChannelSpec::new("VIS006", "ch_r06", Refl),
                ChannelSpec::new("VIS008", "ch_r09", Refl),
                ChannelSpec::new("IR_016", "ch_r16", Refl),
                ChannelSpec::new("IR_039", "ch_tb37", Bt),
                ChannelSpec::new("IR_087", "ch_tb85", Bt),
                ChannelSpec::new("IR_108", "ch_tb11", Bt),
                ChannelSpec::new("IR_120", "ch_tb12", Bt),
                ChannelSpec::new("IR_134", "ch_tb133", Bt),
                ChannelSpec::new("IR_097", "ch_tb97", Bt),
                ChannelSpec::new("WV_062", "ch_tb67", Bt),
                ChannelSpec::new("WV_073", "ch_tb73", Bt),
            ],
            rules: RuleSet::seviri(),
            ancillary: Vec::new(),
            angles: vec![AngleKind::SunZenith, AngleKind::SatZenith, AngleKind::AzimuthDiff],
            orientation: Orientation::Rotate180,
            geometry: GeometrySource::Computed,
            sun_earth_distance_corrected: false,
            chunks: Some(vec![53, 3712]),
            input_pattern: InputPattern::Hrit,
        }
    }

    /// EUMETSAT AVHRR GAC fundamental data record.
    pub fn avhrr_gac_fdr() -> Self {
        use BandCategory::{BrightnessTemperature as Bt, Reflectance as Refl};
        Self {
            name: "avhrr-gac-fdr".to_string(),
            instrument: "AVHRR".to_string(),
            sensor: "avhrr".to_string(),
            accepted_sensors: vec!["avhrr".to_string(), "avhrr-2".to_string(), "avhrr-3".to_string()],
            source: "l1c-converter avhrr-gac-fdr".to_string(),
            reference_band: "brightness_temperature_channel_4".to_string(),
            channels: vec![
                ChannelSpec::new("reflectance_channel_1", "ch_r06", Refl),
                ChannelSpec::new("reflectance_channel_2", "ch_r09", Refl),
                ChannelSpec::new("reflectance_channel_3", "ch_r16", Refl),
                ChannelSpec::new("brightness_temperature_channel_3", "ch_tb37", Bt),
                ChannelSpec::new("brightness_temperature_channel_4", "ch_tb11", Bt),
                ChannelSpec::new("brightness_temperature_channel_5", "ch_tb12", Bt),
            ],
            rules: RuleSet::avhrr_gac_fdr(),
            ancillary: vec![
                AncillarySpec::series("qual_flags", Some(BandCategory::QualityFlags)),
                AncillarySpec::series("scanline_timestamps", Some(BandCategory::ScanlineTimestamps)),
                AncillarySpec::series("overlap_free_end", None),
                AncillarySpec::series("midnight_line", None),
            ],
            angles: vec![
                AngleKind::SunZenith,
                AngleKind::SatZenith,
                AngleKind::AzimuthDiff,
                AngleKind::SunAzimuth,
                AngleKind::SatAzimuth,
            ],
            orientation: Orientation::Native,
            geometry: GeometrySource::Reader,
            sun_earth_distance_corrected: true,
            chunks: None,
            input_pattern: InputPattern::GacFdr,
        }
    }

    /// Built-in profile by name.
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            "seviri" => Ok(Self::seviri()),
            "avhrr-gac-fdr" => Ok(Self::avhrr_gac_fdr()),
            other => Err(ConversionError::InvalidConfig(format!(
                "Unknown instrument profile '{}' (available: seviri, avhrr-gac-fdr)",
                other
            ))),
        }
    }

    /// Parse and validate a profile from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut profile: InstrumentProfile = serde_yaml::from_str(yaml)?;
        if profile.accepted_sensors.is_empty() {
            profile.accepted_sensors = vec![profile.sensor.clone()];
        }
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConversionError::InvalidConfig(format!("Cannot read {:?}: {}", path, e)))?;
        let profile = Self::from_yaml_str(&contents).map_err(|e| {
            error!(path = ?path, error = %e, "Failed to load instrument profile");
            e
        })?;
        debug!(
            profile = %profile.name,
            channels = profile.channels.len(),
            "Loaded instrument profile"
        );
        Ok(profile)
    }

    /// Reject inconsistent profiles before any scene is processed.
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            return Err(self.invalid("no channels defined".to_string()));
        }

        let mut bands = BTreeSet::new();
        let mut tags = BTreeSet::new();
        for channel in &self.channels {
            if !bands.insert(channel.band.as_str()) {
                return Err(self.invalid(format!("band '{}' listed twice", channel.band)));
            }
            if !tags.insert(channel.tag.as_str()) {
                return Err(self.invalid(format!("tag '{}' used by more than one band", channel.tag)));
            }
            match channel.category.tag_prefix() {
                Some(prefix) if channel.tag.starts_with(prefix) => {}
                Some(prefix) => {
                    return Err(self.invalid(format!(
                        "tag '{}' of band '{}' does not match category {:?} (expected prefix '{}')",
                        channel.tag, channel.band, channel.category, prefix
                    )))
                }
                None => {
                    return Err(self.invalid(format!(
                        "band '{}' has non-channel category {:?}",
                        channel.band, channel.category
                    )))
                }
            }
        }

        if !bands.contains(self.reference_band.as_str()) {
            return Err(self.invalid(format!(
                "reference band '{}' is not a channel",
                self.reference_band
            )));
        }

        let angles: BTreeSet<_> = self.angles.iter().collect();
        if angles.len() != self.angles.len() {
            return Err(self.invalid("angle listed twice".to_string()));
        }

        if let Some(spec) = self
            .ancillary
            .iter()
            .find(|a| a.category.is_some_and(|c| c.is_channel()))
        {
            return Err(self.invalid(format!("ancillary dataset '{}' has a channel category", spec.name)));
        }

        self.rules.validate()
    }

    fn invalid(&self, reason: String) -> ConversionError {
        ConversionError::InvalidConfig(format!("profile '{}': {}", self.name, reason))
    }

    /// Channels the scene actually contains, in profile order.
    pub fn present_channels<'a>(&'a self, scene: &'a Scene) -> impl Iterator<Item = &'a ChannelSpec> + 'a {
        self.channels.iter().filter(move |c| scene.contains(&c.band))
    }

    /// Keys of every band that becomes an output variable: present
    /// channels, angles, `lat`/`lon` and ancillary datasets.
    pub fn output_bands(&self, scene: &Scene) -> Vec<String> {
        let channels = self.present_channels(scene).map(|c| c.band.as_str());
        let angles = self.angles.iter().map(|a| a.tag());
        let ancillary = self.ancillary.iter().map(|a| a.name.as_str());
        channels
            .chain(angles)
            .chain([crate::ancillary::LAT, crate::ancillary::LON])
            .chain(ancillary)
            .filter(|name| scene.contains(name))
            .map(str::to_string)
            .collect()
    }

    pub fn accepts_sensor(&self, sensor: &str) -> bool {
        if self.accepted_sensors.is_empty() {
            return self.sensor == sensor;
        }
        self.accepted_sensors.iter().any(|s| s == sensor)
    }
}
