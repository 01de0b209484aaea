//! In-memory reader and writer for pipeline tests.

#![allow(dead_code)]

use l1c_common::Scene;
use level1c::{ConversionError, FilenameParser, InputPattern, Result, SceneReader, SceneWriter, WriteRequest};
use std::path::PathBuf;
use std::sync::Mutex;

/// Returns a clone of a fixed scene for every read.
pub struct StaticReader {
    pub scene: Scene,
}

impl SceneReader for StaticReader {
    fn read(&self, _files: &[PathBuf]) -> Result<Scene> {
        Ok(self.scene.clone())
    }
}

/// Builds a small SEVIRI scene stamped with the slot time of the HRIT files.
///
/// Units containing a file whose name contains `fail_on` fail to read.
pub struct HritFixtureReader {
    pub fail_on: Option<String>,
}

impl SceneReader for HritFixtureReader {
    fn read(&self, files: &[PathBuf]) -> Result<Scene> {
        if let Some(marker) = &self.fail_on {
            if files.iter().any(|f| f.to_string_lossy().contains(marker.as_str())) {
                return Err(ConversionError::Read(format!("corrupt segment in {:?}", files)));
            }
        }
        let parser = FilenameParser::new(InputPattern::Hrit)?;
        let start = files
            .iter()
            .find_map(|f| parser.parse_path(f))
            .map(|f| f.scan_time())
            .ok_or_else(|| ConversionError::Read("no HRIT files".to_string()))?;

        let mut scene = test_utils::seviri_scene(2, 2, "Meteosat-10");
        for (_, band) in scene.iter_mut() {
            band.attrs.insert("start_time", start);
            band.attrs.insert("end_time", start + chrono::Duration::minutes(12));
        }
        Ok(scene)
    }
}

/// Keeps every write request.
#[derive(Default)]
pub struct RecordingWriter {
    pub requests: Mutex<Vec<WriteRequest>>,
}

impl RecordingWriter {
    pub fn take(&self) -> Vec<WriteRequest> {
        std::mem::take(&mut *self.requests.lock().unwrap())
    }
}

impl SceneWriter for RecordingWriter {
    fn write(&self, request: &WriteRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

impl SceneWriter for &RecordingWriter {
    fn write(&self, request: &WriteRequest) -> Result<()> {
        (**self).write(request)
    }
}
