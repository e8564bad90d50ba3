//! Package writing for 3MF files

use super::content_types::render_content_types;
use super::relationships::{MODEL_REL_TYPE, RELATIONSHIPS_NAMESPACE};
use super::{CONTENT_TYPES_PATH, MODEL_PATH, RELS_PATH};
use crate::error::{Error, Result};
use crate::model::Attachment;
use std::io::{Seek, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Create a 3MF package (ZIP archive) from model XML and attachments
///
/// The package contains:
/// - `[Content_Types].xml`, with an override per attachment
/// - `_rels/.rels`
/// - `3D/3dmodel.model`
/// - every attachment at its own path
///
/// Entries carry a fixed timestamp, so identical input produces identical
/// bytes.
///
/// Returns the writer after finishing the ZIP archive.
pub fn create_package<W: Write + Seek>(
    writer: W,
    model_xml: &str,
    attachments: &[Attachment],
) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().last_modified_time(zip::DateTime::default());

    let content_types = render_content_types(attachments)?;
    write_part(&mut zip, options, CONTENT_TYPES_PATH, content_types.as_bytes())?;

    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="{}">
  <Relationship Target="/{}" Id="rel0" Type="{}"/>
</Relationships>"#,
        RELATIONSHIPS_NAMESPACE, MODEL_PATH, MODEL_REL_TYPE
    );
    write_part(&mut zip, options, RELS_PATH, rels.as_bytes())?;

    write_part(&mut zip, options, MODEL_PATH, model_xml.as_bytes())?;

    for attachment in attachments {
        write_part(&mut zip, options, &attachment.path, &attachment.data)?;
    }

    zip.finish()
        .map_err(|e| Error::xml_write(format!("Failed to finalize ZIP archive: {}", e)))
}

fn write_part<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    options: SimpleFileOptions,
    path: &str,
    data: &[u8],
) -> Result<()> {
    zip.start_file(path, options)
        .map_err(|e| Error::xml_write(format!("Failed to create {}: {}", path, e)))?;
    zip.write_all(data)
        .map_err(|e| Error::xml_write(format!("Failed to write {}: {}", path, e)))?;
    Ok(())
}
