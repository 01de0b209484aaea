//! Declarative attribute rule tables.
//!
//! A [`RuleSet`] describes how reader attributes are redistributed between
//! the bands and the global header. It is plain data: built once (in code
//! or from a profile YAML), validated, and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ConversionError, Result};

// ============================================================================
// Rule Set
// ============================================================================

/// Band-geometry attributes that have no meaning on 1-D ancillary series.
pub const BAND_GEOMETRY_ATTRIBUTES: &[&str] = &[
    "valid_min",
    "valid_max",
    "coordinates",
    "resolution",
    "calibration",
    "polarization",
    "level",
    "modifiers",
];

fn default_band_attributes() -> Vec<String> {
    BAND_GEOMETRY_ATTRIBUTES.iter().map(|s| s.to_string()).collect()
}

/// The four attribute tables plus the extra list stripped from ancillary series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Stripped from every band.
    #[serde(default)]
    pub remove: Vec<String>,
    /// Copied from the reference band into the header, then stripped from bands.
    #[serde(default)]
    pub move_to_header: Vec<String>,
    /// Reader name → header name; copied from the reference band, then
    /// stripped from bands.
    #[serde(default)]
    pub rename_and_move: BTreeMap<String, String>,
    /// Copied into the header and left on the bands.
    #[serde(default)]
    pub copy_to_header: Vec<String>,
    /// Extra names stripped from ancillary series.
    #[serde(default = "default_band_attributes")]
    pub band_attributes: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            remove: Vec::new(),
            move_to_header: Vec::new(),
            rename_and_move: BTreeMap::new(),
            copy_to_header: Vec::new(),
            band_attributes: default_band_attributes(),
        }
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl RuleSet {
    /// Rules for SEVIRI HRIT scenes.
    ///
    /// The HRIT reader carries little bookkeeping; only its raw header dump
    /// is dropped.
    pub fn seviri() -> Self {
        Self {
            remove: strings(&["raw_metadata"]),
            copy_to_header: strings(&["start_time", "end_time"]),
            ..Self::default()
        }
    }

    /// Rules for EUMETSAT AVHRR GAC FDR files.
    pub fn avhrr_gac_fdr() -> Self {
        Self {
            remove: strings(&[
                "_satpy_id",
                "creator_email",
                "comment",
                "creator_url",
                "date_created",
                "disposition_mode",
                "institution",
                "keywords",
                "keywords_vocabulary",
                "naming_authority",
                "processing_mode",
            ]),
            move_to_header: strings(&[
                "gac_filename",
                "geospatial_lat_max",
                "geospatial_lat_min",
                "geospatial_lat_units",
                "geospatial_lon_max",
                "geospatial_lon_min",
                "geospatial_lon_units",
                "ground_station",
                "history",
                "orbital_parameters_tle",
                "orbit_number_end",
                "orbit_number_start",
                "references",
                "source",
                "standard_name_vocabulary",
                "summary",
                "time_coverage_end",
                "time_coverage_start",
                "title",
                "version_calib_coeffs",
                "version_pygac",
                "version_pygac_fdr",
            ]),
            rename_and_move: [
                ("id", "euemtsat_gac_id"),
                ("licence", "eumetsat_licence"),
                ("product_version", "eumetsat_product_version"),
                ("version_satpy", "eumetsat_pygac_fdr_satpy_version"),
            ]
            .into_iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect(),
            copy_to_header: strings(&["start_time", "end_time"]),
            band_attributes: default_band_attributes(),
        }
    }

    /// Every name stripped from channel bands: remove, move and rename sources.
    pub fn band_removals(&self) -> impl Iterator<Item = &str> {
        self.remove
            .iter()
            .chain(self.move_to_header.iter())
            .chain(self.rename_and_move.keys())
            .map(String::as_str)
    }

    /// Names stripped from an ancillary series.
    pub fn ancillary_removals(&self, strip_band_attributes: bool) -> Vec<&str> {
        let extra: &[String] = if strip_band_attributes {
            self.band_attributes.as_slice()
        } else {
            &[]
        };
        extra
            .iter()
            .map(String::as_str)
            .chain(self.band_removals())
            .collect()
    }

    /// Check that the tables do not contradict each other.
    ///
    /// A name that is copied to the header must survive on the bands, so it
    /// may not also be removed, moved or renamed. Header names produced by
    /// rename-and-move must be unique.
    pub fn validate(&self) -> Result<()> {
        let removed: BTreeSet<&str> = self.band_removals().collect();
        if let Some(name) = self.copy_to_header.iter().find(|n| removed.contains(n.as_str())) {
            return Err(ConversionError::InvalidConfig(format!(
                "Attribute '{}' is both copied to the header and removed from bands",
                name
            )));
        }

        let mut targets = BTreeSet::new();
        for target in self.rename_and_move.values() {
            if !targets.insert(target.as_str()) {
                return Err(ConversionError::InvalidConfig(format!(
                    "Header name '{}' is the target of more than one rename",
                    target
                )));
            }
        }
        Ok(())
    }
}
