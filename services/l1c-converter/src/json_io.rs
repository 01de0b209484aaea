//! JSON scene reader and writer.
//!
//! Each input file holds one serialized [`Scene`] document (typically one
//! band or segment group); the files of a scan unit are merged. The writer
//! emits the header, every variable's attributes and encoding, and the
//! packed values as one JSON document at the composed output path.

use chrono::{DateTime, Utc};
use l1c_common::{Attributes, Scene};
use level1c::{ConversionError, EncodingDescriptor, Result, SceneReader, SceneWriter, WriteRequest};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::debug;

/// Reads and merges JSON scene documents.
#[derive(Debug, Clone, Default)]
pub struct JsonSceneReader;

impl SceneReader for JsonSceneReader {
    fn read(&self, files: &[PathBuf]) -> Result<Scene> {
        let mut scene = Scene::new();
        for path in files {
            let file = File::open(path)?;
            let part: Scene = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| ConversionError::Read(format!("{}: {}", path.display(), e)))?;
            debug!(path = %path.display(), bands = part.len(), "Read scene document");
            scene.merge(part);
        }
        Ok(scene)
    }
}

#[derive(Serialize)]
struct OutputVariable<'a> {
    band: &'a str,
    shape: &'a [usize],
    attrs: &'a Attributes,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    encoding: Option<&'a EncodingDescriptor>,
    /// Stored values: packed when an encoding applies, raw otherwise.
    data: Vec<f64>,
}

#[derive(Serialize)]
struct OutputDocument<'a> {
    header: &'a Attributes,
    variables: BTreeMap<&'a str, OutputVariable<'a>>,
}

/// Writes level-1c documents as JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonSceneWriter;

impl SceneWriter for JsonSceneWriter {
    fn write(&self, request: &WriteRequest) -> Result<()> {
        let mut variables = BTreeMap::new();
        for (band, data) in request.scene.iter() {
            let name = data.attrs.get_str("name").unwrap_or(band.as_str());
            let encoding = request.encodings.get(name);
            let values = match encoding {
                Some(encoding) => encoding.pack_array(&data.data).iter().copied().collect(),
                None => data.data.iter().copied().collect(),
            };
            variables.insert(
                name,
                OutputVariable {
                    band: band.as_str(),
                    shape: data.shape(),
                    attrs: &data.attrs,
                    time: data.coords.time,
                    encoding,
                    data: values,
                },
            );
        }

        let document = OutputDocument {
            header: &request.header,
            variables,
        };

        if let Some(parent) = request.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(&request.path)?);
        serde_json::to_writer_pretty(&mut out, &document)
            .map_err(|e| ConversionError::Write(format!("{}: {}", request.path.display(), e)))?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use level1c::{BatchDriver, BatchOptions, Converter, InstrumentProfile};
    use serde_json::Value;
    use std::sync::Arc;
    use test_utils::{hrit_filename, seviri_scene, temp_test_dir, time};

    fn write_scene(path: &std::path::Path, scene: &Scene) {
        fs::write(path, serde_json::to_vec(scene).unwrap()).unwrap();
    }

    #[test]
    fn test_reader_merges_documents() {
        let dir = temp_test_dir();
        let mut scene = seviri_scene(2, 2, "Meteosat-10");
        let vis = scene.remove("VIS006").unwrap();
        let mut second = Scene::new();
        second.insert("VIS006", vis);

        let first_path = dir.path().join("a.json");
        let second_path = dir.path().join("b.json");
        write_scene(&first_path, &scene);
        write_scene(&second_path, &second);

        let merged = JsonSceneReader.read(&[first_path, second_path]).unwrap();
        assert!(merged.contains("VIS006"));
        assert!(merged.contains("IR_108"));
        assert!(merged.sensor.contains("seviri"));
        assert_eq!(
            merged.get("IR_108").unwrap().attrs.get_time("start_time"),
            Some(time::seviri_start())
        );
    }

    #[test]
    fn test_reader_reports_bad_document() {
        let dir = temp_test_dir();
        let path = dir.path().join("broken.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            JsonSceneReader.read(&[path]),
            Err(ConversionError::Read(_))
        ));
    }

    #[test]
    fn test_batch_writes_packed_documents() {
        let input = temp_test_dir();
        let output = temp_test_dir();
        let name = hrit_filename("MSG3", "IR_108", "000001", &time::seviri_start());
        write_scene(&input.path().join(name), &seviri_scene(2, 2, "MSG>Meteosat-10"));

        let converter = Converter::new(
            Arc::new(InstrumentProfile::seviri()),
            JsonSceneReader,
            JsonSceneWriter,
            output.path(),
        )
        .unwrap();
        let report = BatchDriver::new(converter, BatchOptions::default())
            .unwrap()
            .run(input.path())
            .unwrap();
        assert!(!report.has_failures());

        let path = report.converted().next().unwrap().to_path_buf();
        assert!(path.ends_with("S_NWC_seviri_meteosat10_99999_20141005T1115004Z_20141005T1127410Z.nc"));

        let document: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(document["header"]["platform"], "Meteosat-10");
        let bt = &document["variables"]["image1"];
        assert_eq!(bt["band"], "IR_108");
        assert_eq!(bt["encoding"]["dtype"], "int16");
        assert_eq!(bt["encoding"]["_FillValue"], -32767.0);
        // 283 K rotated into the first pixel, packed around 273.15 K.
        assert_eq!(bt["data"][0], 985.0);
        assert_eq!(document["variables"]["lat"]["encoding"]["dtype"], "float32");
    }
}
