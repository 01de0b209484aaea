//! In-memory scene model.
//!
//! A [`Scene`] is what the external reader produces for one scan unit: an
//! ordered set of named [`Band`]s plus the global attribute mapping that
//! eventually becomes the file header.

use chrono::{DateTime, Utc};
use geometry::GeostationaryArea;
use ndarray::{ArrayD, Axis};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::attrs::Attributes;
use crate::error::{SceneError, SceneResult};

/// Coordinate references attached to a band.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Scalar time coordinate; makes the writer emit a time dimension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    /// Auxiliary coordinate arrays (e.g. `latitude`, `longitude`, `acq_time`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aux: BTreeMap<String, ArrayD<f64>>,
}

/// One physical variable: channel image or ancillary series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub data: ArrayD<f64>,
    #[serde(default)]
    pub attrs: Attributes,
    #[serde(default)]
    pub coords: Coordinates,
    /// Geostationary area definition, when the reader geolocates via projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<GeostationaryArea>,
}

impl Band {
    pub fn new(data: ArrayD<f64>) -> Self {
        Self {
            data,
            attrs: Attributes::new(),
            coords: Coordinates::default(),
            area: None,
        }
    }

    pub fn with_attrs(data: ArrayD<f64>, attrs: Attributes) -> Self {
        Self {
            attrs,
            ..Self::new(data)
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Flip the band on both image axes.
    ///
    /// Two-dimensional auxiliary coordinates follow the data and the area
    /// extent corners are swapped.
    pub fn rotate_180(&mut self, name: &str) -> SceneResult<()> {
        if self.data.ndim() != 2 {
            return Err(SceneError::NotTwoDimensional(name.to_string()));
        }
        self.data.invert_axis(Axis(0));
        self.data.invert_axis(Axis(1));
        self.data = self.data.as_standard_layout().into_owned();

        for coord in self.coords.aux.values_mut() {
            if coord.ndim() == 2 {
                coord.invert_axis(Axis(0));
                coord.invert_axis(Axis(1));
                *coord = coord.as_standard_layout().into_owned();
            }
        }

        if let Some(area) = self.area.as_mut() {
            *area = area.rotated_180();
        }
        Ok(())
    }
}

/// Named bands for one observation instant plus the global header attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Global attributes; the file header once normalization has run.
    #[serde(default)]
    pub attrs: Attributes,
    /// Sensor names declared by the reader.
    #[serde(default)]
    pub sensor: BTreeSet<String>,
    #[serde(default)]
    bands: BTreeMap<String, Band>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Band> {
        self.bands.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Band> {
        self.bands.get_mut(name)
    }

    /// Band lookup that fails with [`SceneError::BandNotFound`].
    pub fn band(&self, name: &str) -> SceneResult<&Band> {
        self.bands
            .get(name)
            .ok_or_else(|| SceneError::BandNotFound(name.to_string()))
    }

    pub fn band_mut(&mut self, name: &str) -> SceneResult<&mut Band> {
        self.bands
            .get_mut(name)
            .ok_or_else(|| SceneError::BandNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, band: Band) -> Option<Band> {
        self.bands.insert(name.into(), band)
    }

    pub fn remove(&mut self, name: &str) -> Option<Band> {
        self.bands.remove(name)
    }

    /// Move a band to a new key. Returns `false` when `from` does not exist.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        match self.bands.remove(from) {
            Some(band) => {
                self.bands.insert(to.to_string(), band);
                true
            }
            None => false,
        }
    }

    /// Keep only the bands for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &Band) -> bool,
    {
        self.bands.retain(|name, band| keep(name, band));
    }

    pub fn names(&self) -> Vec<String> {
        self.bands.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Band)> {
        self.bands.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Band)> {
        self.bands.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Rotate one band by 180 degrees so pixel (0, 0) becomes the opposite corner.
    pub fn rotate_180(&mut self, name: &str) -> SceneResult<()> {
        self.band_mut(name)?.rotate_180(name)
    }

    /// Merge the bands and attributes of `other` into this scene.
    ///
    /// Bands of `other` replace same-named bands; header attributes already
    /// present here win.
    pub fn merge(&mut self, other: Scene) {
        for (name, value) in other.attrs.iter() {
            self.attrs.insert_if_absent(name, value.clone());
        }
        self.sensor.extend(other.sensor);
        self.bands.extend(other.bands);
    }
}
