//! Scan batch driver.
//!
//! Groups the files of an input directory into scan units by the time
//! encoded in their names and converts each unit independently. A failing
//! unit never stops the batch; its failure is recorded in the
//! [`BatchReport`] and logged.

use chrono::{DateTime, Utc};
use l1c_common::{parse_slot_key, slot_key};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{ConversionError, Result};
use crate::metadata::FilenameParser;
use crate::pipeline::{Converter, SceneReader, SceneWriter};
use crate::profile::InputPattern;

// ============================================================================
// Scan Units
// ============================================================================

/// Raw files that share one observation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanUnit {
    pub time: DateTime<Utc>,
    /// `YYYYMMDDhhmm` key of `time`.
    pub slot: String,
    pub files: Vec<PathBuf>,
}

impl ScanUnit {
    fn new(time: DateTime<Utc>, files: Vec<PathBuf>) -> Self {
        Self {
            slot: slot_key(&time),
            time,
            files,
        }
    }
}

/// Group the recognised files directly inside `input_dir` into scan units.
///
/// HRIT segments are grouped by their repeat-cycle time; GAC FDR files are
/// one unit each. Units come out in ascending time order.
pub fn group_scan_units(input_dir: &Path, parser: &FilenameParser) -> Result<Vec<ScanUnit>> {
    let mut by_time: BTreeMap<DateTime<Utc>, Vec<PathBuf>> = BTreeMap::new();
    let mut ignored = 0usize;

    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ConversionError::Read(format!("Cannot list {:?}: {}", input_dir, e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match parser.parse_path(entry.path()) {
            Some(file) => by_time.entry(file.scan_time()).or_default().push(entry.into_path()),
            None => ignored += 1,
        }
    }

    let mut units = Vec::new();
    for (time, mut files) in by_time {
        files.sort();
        match parser.pattern() {
            InputPattern::Hrit => units.push(ScanUnit::new(time, files)),
            InputPattern::GacFdr => units.extend(files.into_iter().map(|f| ScanUnit::new(time, vec![f]))),
        }
    }

    debug!(
        dir = %input_dir.display(),
        units = units.len(),
        ignored,
        "Grouped input files into scan units"
    );
    Ok(units)
}

// ============================================================================
// Outcomes
// ============================================================================

/// A scan unit that could not be converted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("scan unit {slot} failed: {reason}")]
pub struct BatchUnitFailure {
    pub slot: String,
    pub files: Vec<PathBuf>,
    pub reason: String,
}

/// What happened to one scan unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    Converted { slot: String, path: PathBuf },
    /// Not in the allow-set.
    Skipped { slot: String },
    Failed(BatchUnitFailure),
}

impl UnitOutcome {
    pub fn slot(&self) -> &str {
        match self {
            UnitOutcome::Converted { slot, .. } | UnitOutcome::Skipped { slot } => slot.as_str(),
            UnitOutcome::Failed(failure) => failure.slot.as_str(),
        }
    }
}

/// Per-unit outcomes of a batch run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<UnitOutcome>,
}

impl BatchReport {
    pub fn converted(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Converted { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchUnitFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            UnitOutcome::Failed(failure) => Some(failure),
            _ => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UnitOutcome::Skipped { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

// ============================================================================
// Driver
// ============================================================================

/// Batch-wide options.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Only these `YYYYMMDDhhmm` slots are converted; all when `None`.
    pub allowed_slots: Option<BTreeSet<String>>,
    /// Convert units on the rayon thread pool.
    pub parallel: bool,
}

impl BatchOptions {
    /// Restrict the batch to the given slot keys, rejecting malformed ones.
    pub fn with_times<S: AsRef<str>>(mut self, times: &[S]) -> Result<Self> {
        let mut allowed = BTreeSet::new();
        for time in times {
            let key = time.as_ref().trim();
            parse_slot_key(key)?;
            allowed.insert(key.to_string());
        }
        self.allowed_slots = Some(allowed);
        Ok(self)
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn allows(&self, slot: &str) -> bool {
        self.allowed_slots.as_ref().map_or(true, |allowed| allowed.contains(slot))
    }
}

/// Runs a [`Converter`] over every scan unit of an input directory.
pub struct BatchDriver<R, W> {
    converter: Converter<R, W>,
    parser: FilenameParser,
    options: BatchOptions,
}

impl<R: SceneReader, W: SceneWriter> BatchDriver<R, W> {
    pub fn new(converter: Converter<R, W>, options: BatchOptions) -> Result<Self> {
        let parser = FilenameParser::new(converter.profile().input_pattern)?;
        Ok(Self {
            converter,
            parser,
            options,
        })
    }

    pub fn discover(&self, input_dir: &Path) -> Result<Vec<ScanUnit>> {
        group_scan_units(input_dir, &self.parser)
    }

    /// Convert every scan unit in `input_dir`.
    ///
    /// Only listing the directory can fail; unit failures are outcomes.
    pub fn run(&self, input_dir: &Path) -> Result<BatchReport> {
        let units = self.discover(input_dir)?;
        if units.is_empty() {
            warn!(dir = %input_dir.display(), "No input files match the profile's naming convention");
        }
        Ok(self.run_units(&units))
    }

    pub fn run_units(&self, units: &[ScanUnit]) -> BatchReport {
        let outcomes: Vec<UnitOutcome> = if self.options.parallel {
            units.par_iter().map(|unit| self.process_unit(unit)).collect()
        } else {
            units.iter().map(|unit| self.process_unit(unit)).collect()
        };
        let report = BatchReport { outcomes };

        info!(
            units = report.len(),
            converted = report.converted().count(),
            skipped = report.skipped_count(),
            failed = report.failures().count(),
            "Batch finished"
        );
        report
    }

    fn process_unit(&self, unit: &ScanUnit) -> UnitOutcome {
        if !self.options.allows(&unit.slot) {
            debug!(slot = %unit.slot, "Slot not requested, skipping");
            return UnitOutcome::Skipped {
                slot: unit.slot.clone(),
            };
        }

        info!(slot = %unit.slot, files = unit.files.len(), "Converting scan unit");
        match self.converter.convert(&unit.files) {
            Ok(path) => UnitOutcome::Converted {
                slot: unit.slot.clone(),
                path,
            },
            Err(e) => {
                let failure = BatchUnitFailure {
                    slot: unit.slot.clone(),
                    files: unit.files.clone(),
                    reason: e.to_string(),
                };
                error!(slot = %unit.slot, files = unit.files.len(), error = %e, "Scan unit failed");
                UnitOutcome::Failed(failure)
            }
        }
    }
}
