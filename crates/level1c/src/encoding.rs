//! Output encoding plan.
//!
//! Each output variable gets an [`EncodingDescriptor`] chosen by its
//! [`BandCategory`]: how physical values are packed into the stored type,
//! which stored value means "missing", and how the variable is compressed.

use l1c_common::Scene;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::ancillary::{LAT, LON, SCANLINE_TIME_UNITS};
use crate::profile::{BandCategory, InstrumentProfile};

/// Fill value of packed 16-bit channels and angles.
pub const INT16_FILL: f64 = -32767.0;
/// Fill value of quality flags.
pub const QUALITY_FLAGS_FILL: f64 = -32001.0;
/// Fill value of latitude/longitude.
pub const COORDINATE_FILL: f64 = -999.0;
/// Fill value of scan-line timestamps.
pub const TIMESTAMP_FILL: f64 = -1.0;

/// Offset of brightness temperatures packed around 0 °C.
pub const KELVIN_OFFSET: f64 = 273.15;
const PACKED_SCALE: f64 = 0.01;
const COMPLEVEL: u8 = 4;

/// Encoding plan keyed by output variable name.
pub type EncodingPlan = BTreeMap<String, EncodingDescriptor>;

/// On-disk numeric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Int16,
    Int64,
    Float32,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Int16 => "int16",
            StorageType::Int64 => "int64",
            StorageType::Float32 => "float32",
        }
    }

    fn is_integer(&self) -> bool {
        !matches!(self, StorageType::Float32)
    }

    /// Representable range of the stored type.
    fn bounds(&self) -> (f64, f64) {
        match self {
            StorageType::Int16 => (f64::from(i16::MIN), f64::from(i16::MAX)),
            StorageType::Int64 => (i64::MIN as f64, i64::MAX as f64),
            StorageType::Float32 => (f64::from(f32::MIN), f64::from(f32::MAX)),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage contract of one output variable.
///
/// Decoded values satisfy `decoded = stored * scale_factor + add_offset`;
/// a stored value equal to `fill_value` decodes as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingDescriptor {
    pub dtype: StorageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_offset: Option<f64>,
    #[serde(rename = "_FillValue")]
    pub fill_value: f64,
    pub zlib: bool,
    pub complevel: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunksizes: Option<Vec<usize>>,
}

impl EncodingDescriptor {
    fn compressed(dtype: StorageType, fill_value: f64) -> Self {
        Self {
            dtype,
            scale_factor: None,
            add_offset: None,
            fill_value,
            zlib: true,
            complevel: COMPLEVEL,
            units: None,
            chunksizes: None,
        }
    }

    fn packed_int16(add_offset: f64) -> Self {
        Self {
            scale_factor: Some(PACKED_SCALE),
            add_offset: Some(add_offset),
            ..Self::compressed(StorageType::Int16, INT16_FILL)
        }
    }

    /// Descriptor for a category.
    pub fn for_category(category: BandCategory) -> Self {
        match category {
            BandCategory::BrightnessTemperature => Self::packed_int16(KELVIN_OFFSET),
            BandCategory::Reflectance | BandCategory::Angle => Self::packed_int16(0.0),
            BandCategory::Coordinate => Self::compressed(StorageType::Float32, COORDINATE_FILL),
            BandCategory::QualityFlags => Self::compressed(StorageType::Int16, QUALITY_FLAGS_FILL),
            BandCategory::ScanlineTimestamps => Self {
                units: Some(SCANLINE_TIME_UNITS.to_string()),
                ..Self::compressed(StorageType::Int64, TIMESTAMP_FILL)
            },
        }
    }

    pub fn with_chunksizes(mut self, chunksizes: Vec<usize>) -> Self {
        self.chunksizes = Some(chunksizes);
        self
    }

    fn scale(&self) -> f64 {
        self.scale_factor.unwrap_or(1.0)
    }

    fn offset(&self) -> f64 {
        self.add_offset.unwrap_or(0.0)
    }

    /// Stored values that decode to a physical value.
    ///
    /// For integer types the fill value and everything beyond it on its
    /// side of zero are reserved for missing data.
    fn valid_stored_range(&self) -> (f64, f64) {
        let (min, max) = self.dtype.bounds();
        let fill = self.fill_value;
        if !self.dtype.is_integer() || fill < min || fill > max {
            return (min, max);
        }
        if fill < 0.0 {
            (fill + 1.0, max)
        } else {
            (min, fill - 1.0)
        }
    }

    /// Stored value of a physical value.
    ///
    /// Only non-finite values become the fill value. Finite values beyond
    /// the valid stored range saturate at its nearest end.
    pub fn pack(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.fill_value;
        }
        let (min, max) = self.valid_stored_range();
        let stored = ((value - self.offset()) / self.scale()).clamp(min, max);
        if self.dtype.is_integer() {
            stored.round()
        } else {
            f64::from(stored as f32)
        }
    }

    /// Physical value of a stored value; `None` for the fill value.
    pub fn unpack(&self, stored: f64) -> Option<f64> {
        if stored == self.fill_value || stored.is_nan() {
            return None;
        }
        Some(stored * self.scale() + self.offset())
    }

    pub fn pack_array(&self, data: &ArrayD<f64>) -> ArrayD<f64> {
        data.mapv(|v| self.pack(v))
    }
}

/// Chooses encodings for the variables of a normalized scene.
#[derive(Debug, Clone)]
pub struct EncodingPlanner {
    profile: Arc<InstrumentProfile>,
}

impl EncodingPlanner {
    pub fn new(profile: Arc<InstrumentProfile>) -> Self {
        Self { profile }
    }

    /// Encoding for every output variable present in `scene`.
    ///
    /// Keys are the variables' `name` attribute (falling back to the band
    /// key). Bands that are not output variables are left out.
    pub fn plan(&self, scene: &Scene) -> EncodingPlan {
        let mut categorized: Vec<(&str, BandCategory)> = self
            .profile
            .channels
            .iter()
            .map(|c| (c.band.as_str(), c.category))
            .collect();
        categorized.extend(self.profile.angles.iter().map(|a| (a.tag(), BandCategory::Angle)));
        categorized.push((LAT, BandCategory::Coordinate));
        categorized.push((LON, BandCategory::Coordinate));
        categorized.extend(
            self.profile
                .ancillary
                .iter()
                .filter_map(|spec| spec.category.map(|c| (spec.name.as_str(), c))),
        );

        let mut plan = EncodingPlan::new();
        for (key, category) in categorized {
            let Some(band) = scene.get(key) else {
                continue;
            };
            let mut descriptor = EncodingDescriptor::for_category(category);
            if let Some(chunks) = &self.profile.chunks {
                if band.data.ndim() == 2 {
                    descriptor = descriptor.with_chunksizes(chunks.clone());
                }
            }
            let name = band.attrs.get_str("name").unwrap_or(key);
            plan.insert(name.to_string(), descriptor);
        }

        debug!(variables = plan.len(), "Planned output encoding");
        plan
    }
}
