//! Attribute values and attribute mappings.
//!
//! Readers hand over bands whose metadata is a loosely typed bag of
//! attributes (strings, numbers, timestamps, nested orbital parameters).
//! [`Attributes`] keeps them ordered by name so header and band output is
//! deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Attributes that hold timestamps. Only these deserialize as [`AttrValue::Time`].
pub const TIME_ATTRIBUTES: [&str; 2] = ["start_time", "end_time"];

/// A single attribute value.
///
/// Serialized untagged, so JSON/YAML documents read naturally
/// (`"units": "K"`, `"valid_range": [0, 18000]`). Strings always
/// deserialize as [`AttrValue::Str`]; [`Attributes`] turns the values of
/// [`TIME_ATTRIBUTES`] back into timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
    Str(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    Map(BTreeMap<String, AttrValue>),
}

/// Wire form of [`AttrValue`]; has no timestamp variant.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    Map(BTreeMap<String, AttrValue>),
}

impl From<RawAttrValue> for AttrValue {
    fn from(raw: RawAttrValue) -> Self {
        match raw {
            RawAttrValue::Bool(v) => AttrValue::Bool(v),
            RawAttrValue::Int(v) => AttrValue::Int(v),
            RawAttrValue::Float(v) => AttrValue::Float(v),
            RawAttrValue::Str(v) => AttrValue::Str(v),
            RawAttrValue::IntList(v) => AttrValue::IntList(v),
            RawAttrValue::FloatList(v) => AttrValue::FloatList(v),
            RawAttrValue::Map(v) => AttrValue::Map(v),
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawAttrValue::deserialize(deserializer).map(AttrValue::from)
    }
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            AttrValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            AttrValue::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttrValue::Time(value)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(value: Vec<i64>) -> Self {
        AttrValue::IntList(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        AttrValue::FloatList(value)
    }
}

impl From<BTreeMap<String, AttrValue>> for AttrValue {
    fn from(value: BTreeMap<String, AttrValue>) -> Self {
        AttrValue::Map(value)
    }
}

/// Ordered attribute mapping of a band or of the global header.
///
/// Mutations that rule tables perform are expressed as presence checks
/// ([`Attributes::remove_if_present`], [`Attributes::insert_if_absent`])
/// so applying the same rules twice leaves the mapping unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = BTreeMap::<String, AttrValue>::deserialize(deserializer)?;
        for name in TIME_ATTRIBUTES {
            let parsed = map
                .get(name)
                .and_then(AttrValue::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
            if let Some(time) = parsed {
                map.insert(name.to_string(), AttrValue::Time(time.with_timezone(&Utc)));
            }
        }
        Ok(Self(map))
    }
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(AttrValue::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(AttrValue::as_f64)
    }

    pub fn get_time(&self, name: &str) -> Option<DateTime<Utc>> {
        self.0.get(name).and_then(AttrValue::as_time)
    }

    pub fn get_map(&self, name: &str) -> Option<&BTreeMap<String, AttrValue>> {
        self.0.get(name).and_then(AttrValue::as_map)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert or overwrite an attribute, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Insert only when the attribute is not already set.
    ///
    /// Returns `true` if the value was written.
    pub fn insert_if_absent(&mut self, name: &str, value: impl Into<AttrValue>) -> bool {
        if self.0.contains_key(name) {
            return false;
        }
        self.0.insert(name.to_string(), value.into());
        true
    }

    /// Remove an attribute if it is present; absent names are ignored.
    pub fn remove_if_present(&mut self, name: &str) -> Option<AttrValue> {
        self.0.remove(name)
    }

    /// Remove every listed name that is present, returning how many were removed.
    pub fn remove_all<'a, I>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter(|name| self.remove_if_present(name).is_some())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (String, AttrValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
