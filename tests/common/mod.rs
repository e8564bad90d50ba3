//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use threemf_merge::{
    ColorSpecError, Error, IDENTITY_TRANSFORM, Mesh, Model, ObjectKind, Reporter, ResourceId,
    Vertex,
};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Records every reported event
#[derive(Default, Debug)]
pub struct RecordingReporter {
    pub colors: Vec<(String, ColorSpecError)>,
    pub objects: Vec<(String, ResourceId, ObjectKind)>,
    pub files: Vec<(String, String)>,
}

impl Reporter for RecordingReporter {
    fn color_rejected(&mut self, line: &str, error: &ColorSpecError) {
        self.colors.push((line.to_string(), error.clone()));
    }

    fn object_skipped(&mut self, line: &str, object_id: ResourceId, kind: ObjectKind) {
        self.objects.push((line.to_string(), object_id, kind));
    }

    fn file_skipped(&mut self, line: &str, error: &Error) {
        self.files.push((line.to_string(), error.to_string()));
    }
}

/// A single triangle, listed starting at its largest vertex index
pub fn triangle_mesh() -> Mesh {
    Mesh::from_geometry(
        vec![
            Vertex::new(0.0, 0.0, 0.0),
            Vertex::new(10.0, 0.0, 0.0),
            Vertex::new(0.0, 10.0, 0.0),
        ],
        &[[2, 0, 1]],
    )
}

/// Write a 3MF file holding one single-triangle mesh and return its path
pub fn write_triangle_file(dir: &Path, name: &str) -> PathBuf {
    let mut model = Model::new();
    let id = model.add_mesh_object(triangle_mesh());
    model.add_build_item(id, IDENTITY_TRANSFORM).unwrap();

    let path = dir.join(name);
    model.write_to_file(&path).unwrap();
    path
}

/// Write a 3MF file whose model part is `model_xml` verbatim
pub fn write_raw_file(dir: &Path, name: &str, model_xml: &str) -> PathBuf {
    let path = dir.join(name);
    let mut zip = ZipWriter::new(File::create(&path).unwrap());
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#,
    )
    .unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rel0" Target="/3D/3dmodel.model" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("3D/3dmodel.model", options).unwrap();
    zip.write_all(model_xml.as_bytes()).unwrap();
    zip.finish().unwrap();
    path
}

/// Path as an input line
pub fn line(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}
