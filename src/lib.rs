//! # threemf-merge
//!
//! Merge many 3MF (3D Manufacturing Format) files into one colored 3MF model.
//!
//! Each source file contributes its mesh objects as components of a single
//! assembly. A color can be encoded in a source filename as four bracketed
//! RGBA values, e.g. `lid[1, 0, 0.5, 0.9].3mf`; it becomes an object-level
//! color of every mesh from that file. The bracketed text also names the
//! parts, and a small `Metadata/model_settings.config` document carries those
//! names to slicers.
//!
//! ## Features
//!
//! - Pure Rust implementation with no unsafe code
//! - Reduced 3MF container layer: ZIP/OPC packages, core meshes and
//!   components, color groups, attachments
//! - Deterministic output: triangles are put in a canonical order and ZIP
//!   entries carry a fixed timestamp
//!
//! ## Example
//!
//! ```no_run
//! use threemf_merge::Model;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Model::read_from_file("part.3mf")?;
//! println!("Model contains {} objects", model.resources.objects.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod canonical;
pub mod color;
pub mod error;
pub mod merge;
pub mod model;
pub mod model_settings;
pub mod opc;
pub mod parser;
mod writer;

pub use color::{ColorSpec, ColorSpecError, bracketed_name, linear_to_srgb};
pub use error::{Error, Result};
pub use merge::{FileOutcome, MergeConfig, MergedModel, Merger, Reporter};
pub use model::{
    Attachment, Build, BuildItem, Color, ColorGroup, Component, IDENTITY_TRANSFORM, Mesh,
    MetadataEntry, Model, Object, ObjectKind, ObjectType, ResourceId, Resources, Transform,
    Triangle, Vertex,
};
pub use model_settings::{MODEL_SETTINGS_PATH, escape_attribute, render_model_settings};

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, Write};
use std::path::Path;

impl Model {
    /// Parse a 3MF file from a reader
    ///
    /// # Example
    ///
    /// ```no_run
    /// use threemf_merge::Model;
    /// use std::fs::File;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let file = File::open("model.3mf")?;
    /// let model = Model::from_reader(file)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        parser::parse_3mf(reader)
    }

    /// Open and parse the 3MF file at `path`
    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Write the model as a 3MF package to a writer
    ///
    /// Returns the writer once the package is complete.
    pub fn to_writer<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut xml_buffer = Vec::new();
        writer::write_model_xml(self, &mut xml_buffer)?;
        let model_xml = String::from_utf8(xml_buffer)
            .map_err(|e| Error::xml_write(format!("Failed to convert XML to UTF-8: {}", e)))?;

        opc::create_package(writer, &model_xml, &self.attachments)
    }

    /// Write the model as a 3MF file at `path`
    ///
    /// The file must not exist yet; an existing file is never overwritten
    /// and yields [`Error::OutputExists`]. A partially written file is
    /// removed again when writing fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use threemf_merge::Model;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let model = Model::new();
    /// model.write_to_file("output.3mf")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => Error::OutputExists(path.to_path_buf()),
                _ => Error::Io(e),
            })?;

        let written = self
            .to_writer(BufWriter::new(file))
            .and_then(|writer| writer.into_inner().map_err(|e| Error::Io(e.into_error())));
        if let Err(err) = written {
            let _ = std::fs::remove_file(path);
            return Err(err);
        }

        tracing::info!(path = %path.display(), "wrote 3MF package");
        Ok(())
    }
}
