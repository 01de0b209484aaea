//! Single-scan conversion pipeline.
//!
//! Reads one scan unit through a [`SceneReader`], brings it into the
//! level-1c layout and hands the result to a [`SceneWriter`]:
//! read → sensor check → orientation → geometry → coordinates and
//! ancillary series → normalize → encoding plan → header and file name →
//! write.

use chrono::{DateTime, Utc};
use geometry::{GeometryEngine, ObserverLook, TopocentricLook};
use l1c_common::{Attributes, Scene};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::ancillary::{
    add_angles, add_lonlats, rename_latitude_longitude, rename_reader_angles, set_channel_coordinates,
    update_scanline_series,
};
use crate::encoding::{EncodingPlan, EncodingPlanner};
use crate::error::{ConversionError, Result};
use crate::geolocation::compute_geolocation;
use crate::header::{compose_filename, header_attrs};
use crate::normalizer::{Normalizer, ORBIT_NUMBER_PLACEHOLDER};
use crate::profile::{BandCategory, GeometrySource, InstrumentProfile, Orientation};

// ============================================================================
// Collaborators
// ============================================================================

/// Produces a scene from the raw files of one scan unit.
pub trait SceneReader: Send + Sync {
    fn read(&self, files: &[PathBuf]) -> Result<Scene>;
}

/// Persists a converted scene.
pub trait SceneWriter: Send + Sync {
    fn write(&self, request: &WriteRequest) -> Result<()>;
}

/// Everything the writer needs for one output file.
#[derive(Debug, Clone, Serialize)]
pub struct WriteRequest {
    /// Output variables only.
    pub scene: Scene,
    pub header: Attributes,
    pub encodings: EncodingPlan,
    pub path: PathBuf,
}

// ============================================================================
// Converter
// ============================================================================

/// Converts scan units of one instrument profile.
pub struct Converter<R, W> {
    profile: Arc<InstrumentProfile>,
    engine: Option<GeometryEngine<Box<dyn ObserverLook>>>,
    normalizer: Normalizer,
    planner: EncodingPlanner,
    orbit_number: Option<u32>,
    output_dir: PathBuf,
    reader: R,
    writer: W,
}

impl<R: SceneReader, W: SceneWriter> Converter<R, W> {
    /// Build a converter on the built-in observer-look computation.
    pub fn new(
        profile: Arc<InstrumentProfile>,
        reader: R,
        writer: W,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        Self::with_observer_look(profile, TopocentricLook::default(), reader, writer, output_dir)
    }

    /// Build a converter around a given observer-look collaborator.
    ///
    /// Profiles that compute geometry get a [`GeometryEngine`], whose
    /// construction verifies the altitude convention of `look`; a mismatch
    /// is reported here, before any scan unit is read. Profiles with
    /// reader-provided geometry never call `look`.
    pub fn with_observer_look<L: ObserverLook + 'static>(
        profile: Arc<InstrumentProfile>,
        look: L,
        reader: R,
        writer: W,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let engine = match profile.geometry {
            GeometrySource::Computed => {
                let look: Box<dyn ObserverLook> = Box::new(look);
                Some(GeometryEngine::new(look)?)
            }
            GeometrySource::Reader => None,
        };
        Ok(Self {
            normalizer: Normalizer::new(Arc::clone(&profile)),
            planner: EncodingPlanner::new(Arc::clone(&profile)),
            profile,
            engine,
            orbit_number: None,
            output_dir: output_dir.into(),
            reader,
            writer,
        })
    }

    /// Use a known orbit number instead of the placeholder.
    pub fn with_orbit_number(mut self, orbit_number: Option<u32>) -> Self {
        self.orbit_number = orbit_number;
        self.normalizer = self.normalizer.with_orbit_number(orbit_number);
        self
    }

    pub fn profile(&self) -> &InstrumentProfile {
        &self.profile
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Read, convert and write one scan unit. Returns the output path.
    #[instrument(skip(self, files), fields(profile = %self.profile.name, files = files.len()))]
    pub fn convert(&self, files: &[PathBuf]) -> Result<PathBuf> {
        let scene = self.reader.read(files)?;
        let request = self.prepare(scene)?;
        self.writer.write(&request)?;
        info!(
            path = %request.path.display(),
            variables = request.scene.len(),
            "Wrote level-1c file"
        );
        Ok(request.path)
    }

    /// Convert a scene that has already been read, without writing it.
    pub fn prepare(&self, scene: Scene) -> Result<WriteRequest> {
        self.prepare_at(scene, Utc::now())
    }

    /// [`Converter::prepare`] with an explicit `date_created` time.
    pub fn prepare_at(&self, mut scene: Scene, now: DateTime<Utc>) -> Result<WriteRequest> {
        let profile = &self.profile;
        self.check_sensor(&scene)?;
        let (start, end) = self.time_range(&scene)?;

        if profile.orientation == Orientation::Rotate180 {
            let present: Vec<String> = profile.present_channels(&scene).map(|c| c.band.clone()).collect();
            for band in &present {
                scene.rotate_180(band)?;
            }
            debug!(bands = present.len(), "Rotated channels by 180 degrees");
        }

        self.add_geometry(&mut scene, start, end)?;

        let reference = profile.reference_band.as_str();
        if profile
            .ancillary
            .iter()
            .any(|a| a.category == Some(BandCategory::ScanlineTimestamps))
        {
            update_scanline_series(&mut scene, reference, start)?;
        }
        set_channel_coordinates(&mut scene, profile, start);

        self.normalizer.normalize_at(&mut scene, now)?;

        let outputs = profile.output_bands(&scene);
        let before = scene.len();
        scene.retain(|name, _| outputs.iter().any(|o| o == name));
        if scene.len() < before {
            debug!(dropped = before - scene.len(), "Dropped bands that are not output variables");
        }

        let encodings = self.planner.plan(&scene);

        let platform = scene
            .attrs
            .get_str("platform")
            .ok_or_else(|| ConversionError::MissingAttribute {
                band: reference.to_string(),
                attribute: "platform_name".to_string(),
            })?;
        let orbit = self.orbit_number.unwrap_or(ORBIT_NUMBER_PLACEHOLDER);
        let filename = compose_filename(profile, platform, &start, &end, orbit);
        let header = header_attrs(&scene.attrs, profile, &start, &end);

        Ok(WriteRequest {
            scene,
            header,
            encodings,
            path: self.output_dir.join(filename),
        })
    }

    /// The scene must come from exactly one sensor, and it must be one the
    /// profile accepts.
    fn check_sensor(&self, scene: &Scene) -> Result<()> {
        let mut sensors = scene.sensor.iter();
        if let (Some(sensor), None) = (sensors.next(), sensors.next()) {
            if self.profile.accepts_sensor(sensor) {
                return Ok(());
            }
        }
        Err(ConversionError::UnsupportedSensor {
            expected: self.profile.accepted_sensors.join("|"),
            found: scene.sensor.iter().cloned().collect(),
        })
    }

    fn time_range(&self, scene: &Scene) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        let reference = self.profile.reference_band.as_str();
        let band = scene.get(reference).ok_or_else(|| {
            ConversionError::PreconditionViolation(format!("reference band '{}' is not in the scene", reference))
        })?;
        let time = |attribute: &str| {
            band.attrs
                .get_time(attribute)
                .ok_or_else(|| ConversionError::MissingAttribute {
                    band: reference.to_string(),
                    attribute: attribute.to_string(),
                })
        };
        Ok((time("start_time")?, time("end_time")?))
    }

    fn add_geometry(&self, scene: &mut Scene, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
        let profile = &self.profile;
        let reference = profile.reference_band.as_str();
        let reference_attrs = scene.band(reference)?.attrs.clone();
        let first_image = profile.present_channels(scene).count();

        match profile.geometry {
            GeometrySource::Computed => {
                let engine = self.engine.as_ref().ok_or_else(|| {
                    ConversionError::PreconditionViolation("no geometry engine configured".to_string())
                })?;
                let geolocation = compute_geolocation(engine, reference, scene.band(reference)?, &start)?;
                add_lonlats(scene, &geolocation.lons, &geolocation.lats, start, end);
                add_angles(scene, &geolocation.angles, &profile.angles, &reference_attrs, first_image);
            }
            GeometrySource::Reader => {
                rename_latitude_longitude(scene, reference)?;
                rename_reader_angles(scene, &profile.angles, &reference_attrs, first_image);
            }
        }
        Ok(())
    }
}
