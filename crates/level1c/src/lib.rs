//! Level-1c conversion library.
//!
//! Turns calibrated scenes delivered by an instrument reader into the
//! level-1c layout used by the cloud processing packages.
//!
//! # Architecture
//!
//! - [`profile`] and [`rules`]: immutable per-instrument configuration
//! - [`geolocation`] and [`ancillary`]: lat/lon, angles and scan-line series
//! - [`normalizer`]: canonical header and band attributes
//! - [`encoding`]: storage type, packing and compression per variable
//! - [`pipeline`]: one scan unit from reader to writer
//! - [`batch`]: directory scanning and per-unit failure isolation

pub mod ancillary;
pub mod batch;
pub mod encoding;
pub mod error;
pub mod geolocation;
pub mod header;
pub mod metadata;
pub mod normalizer;
pub mod pipeline;
pub mod profile;
pub mod rules;

// Re-exports
pub use batch::{group_scan_units, BatchDriver, BatchOptions, BatchReport, BatchUnitFailure, ScanUnit, UnitOutcome};
pub use encoding::{EncodingDescriptor, EncodingPlan, EncodingPlanner, StorageType};
pub use error::{ConversionError, Result};
pub use header::{compose_filename, header_attrs};
pub use metadata::{FilenameParser, GacFdrFileInfo, HritFileInfo, InputFile};
pub use normalizer::{strip_hierarchy, Normalizer, ORBIT_NUMBER_PLACEHOLDER};
pub use pipeline::{Converter, SceneReader, SceneWriter, WriteRequest};
pub use profile::{
    AncillarySpec, AngleKind, BandCategory, ChannelSpec, GeometrySource, InputPattern, InstrumentProfile,
    Orientation,
};
pub use rules::RuleSet;
