//! Raw input filename parsing.
//!
//! Scan units are identified from file names alone, before any file is
//! opened. Names that do not follow the profile's convention are ignored.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::path::Path;

use crate::error::{ConversionError, Result};
use crate::profile::InputPattern;

/// `H-000-MSG3__-MSG3________-IR_108___-000001___-201410051115-__`
const HRIT_PATTERN: &str = r"^(.)-000-(.{6})-(.{12})-(.{8})_-(.{9})-(\d{12})-__$";
/// `AVHRR-GAC_FDR_1C_N19_20090701T003517Z_20090701T012312Z_..._0100.nc`
const GAC_FDR_PATTERN: &str = r"^AVHRR-GAC_FDR_1C_([A-Z0-9]+)_(\d{8}T\d{6})Z_(\d{8}T\d{6})Z_.*\.nc$";

/// Fields of an MSG HRIT segment file name, `_` padding removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HritFileInfo {
    /// `H` for high, `L` for low rate.
    pub rate: String,
    /// Format/platform family (`MSG3`).
    pub format: String,
    pub platform: String,
    /// Channel name; empty for prologue and epilogue.
    pub channel: String,
    /// Segment number or `PRO`/`EPI`.
    pub segment: String,
    /// Nominal repeat-cycle start (minute resolution).
    pub time: DateTime<Utc>,
}

/// Fields of an AVHRR GAC FDR level-1c file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GacFdrFileInfo {
    /// Short platform code (`N19`, `M02`).
    pub platform: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// A recognised input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    Hrit(HritFileInfo),
    GacFdr(GacFdrFileInfo),
}

impl InputFile {
    /// Time that groups the file into a scan unit.
    pub fn scan_time(&self) -> DateTime<Utc> {
        match self {
            InputFile::Hrit(info) => info.time,
            InputFile::GacFdr(info) => info.start_time,
        }
    }
}

fn parse_time(value: &str, format: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn unpad(field: &str) -> String {
    field.trim_end_matches('_').to_string()
}

/// Compiled filename convention of one input pattern.
#[derive(Debug, Clone)]
pub struct FilenameParser {
    pattern: InputPattern,
    regex: Regex,
}

impl FilenameParser {
    pub fn new(pattern: InputPattern) -> Result<Self> {
        let source = match pattern {
            InputPattern::Hrit => HRIT_PATTERN,
            InputPattern::GacFdr => GAC_FDR_PATTERN,
        };
        let regex = Regex::new(source)
            .map_err(|e| ConversionError::InvalidConfig(format!("Bad filename pattern for {:?}: {}", pattern, e)))?;
        Ok(Self { pattern, regex })
    }

    pub fn pattern(&self) -> InputPattern {
        self.pattern
    }

    /// Parse a bare file name.
    pub fn parse(&self, filename: &str) -> Option<InputFile> {
        let caps = self.regex.captures(filename)?;
        match self.pattern {
            InputPattern::Hrit => Some(InputFile::Hrit(HritFileInfo {
                rate: caps[1].to_string(),
                format: unpad(&caps[2]),
                platform: unpad(&caps[3]),
                channel: unpad(&caps[4]),
                segment: unpad(&caps[5]),
                time: parse_time(&caps[6], "%Y%m%d%H%M")?,
            })),
            InputPattern::GacFdr => Some(InputFile::GacFdr(GacFdrFileInfo {
                platform: caps[1].to_string(),
                start_time: parse_time(&caps[2], "%Y%m%dT%H%M%S")?,
                end_time: parse_time(&caps[3], "%Y%m%dT%H%M%S")?,
            })),
        }
    }

    /// Parse the file name component of a path.
    pub fn parse_path(&self, path: &Path) -> Option<InputFile> {
        path.file_name().and_then(|s| s.to_str()).and_then(|name| self.parse(name))
    }
}
