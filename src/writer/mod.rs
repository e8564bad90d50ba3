//! XML writing for 3MF model files
//!
//! This module serializes Model structures back into 3MF-compliant XML.
//! Resources are written in dependency order: color groups first, then
//! mesh objects, then every object assembling other objects.

mod core;
mod material;

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write as IoWrite;

/// Write a Model to XML format
///
/// This generates the 3dmodel.model part content.
pub fn write_model_xml<W: IoWrite>(model: &Model, writer: W) -> Result<()> {
    let mut xml_writer = Writer::new_with_indent(writer, b' ', 2);

    xml_writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

    let mut root = BytesStart::new("model");
    root.push_attribute(("unit", model.unit.as_str()));
    root.push_attribute(("xml:lang", "en-US"));
    root.push_attribute(("xmlns", model.xmlns.as_str()));
    if !model.resources.color_groups.is_empty() {
        root.push_attribute(("xmlns:m", MATERIAL_NAMESPACE));
    }
    open(&mut xml_writer, root)?;

    for entry in &model.metadata {
        write_metadata(&mut xml_writer, entry)?;
    }
    write_resources(&mut xml_writer, &model.resources)?;
    write_build(&mut xml_writer, &model.build)?;

    close(&mut xml_writer, "model")
}

/// Write a start tag
pub(super) fn open<W: IoWrite>(writer: &mut Writer<W>, elem: BytesStart) -> Result<()> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    writer
        .write_event(Event::Start(elem))
        .map_err(|e| Error::xml_write(format!("Failed to write <{}>: {}", name, e)))
}

/// Write a self-closing element
pub(super) fn empty<W: IoWrite>(writer: &mut Writer<W>, elem: BytesStart) -> Result<()> {
    let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    writer
        .write_event(Event::Empty(elem))
        .map_err(|e| Error::xml_write(format!("Failed to write <{}/>: {}", name, e)))
}

/// Write an end tag
pub(super) fn close<W: IoWrite>(writer: &mut Writer<W>, name: &str) -> Result<()> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| Error::xml_write(format!("Failed to close <{}>: {}", name, e)))
}

/// Render a 4x3 matrix as the attribute value, or nothing for the identity
pub(crate) fn transform_attribute(transform: &Option<Transform>) -> Option<String> {
    match transform {
        Some(t) if *t != IDENTITY_TRANSFORM => Some(
            t.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}

fn write_metadata<W: IoWrite>(writer: &mut Writer<W>, entry: &MetadataEntry) -> Result<()> {
    let mut elem = BytesStart::new("metadata");
    elem.push_attribute(("name", entry.name.as_str()));
    if let Some(preserve) = entry.preserve {
        elem.push_attribute(("preserve", if preserve { "1" } else { "0" }));
    }
    open(writer, elem)?;

    writer
        .write_event(Event::Text(BytesText::new(&entry.value)))
        .map_err(|e| Error::xml_write(format!("Failed to write metadata '{}': {}", entry.name, e)))?;

    close(writer, "metadata")
}

/// Color groups first, then meshes, then the objects assembling them, so that
/// every reference points backwards
fn write_resources<W: IoWrite>(writer: &mut Writer<W>, resources: &Resources) -> Result<()> {
    open(writer, BytesStart::new("resources"))?;

    for group in &resources.color_groups {
        material::write_color_group(writer, group)?;
    }

    let (meshes, assemblies): (Vec<&Object>, Vec<&Object>) = resources
        .objects
        .iter()
        .partition(|object| object.kind() == ObjectKind::Mesh);
    for object in meshes.into_iter().chain(assemblies) {
        core::write_object(writer, object)?;
    }

    close(writer, "resources")
}

fn write_build<W: IoWrite>(writer: &mut Writer<W>, build: &Build) -> Result<()> {
    open(writer, BytesStart::new("build"))?;

    for item in &build.items {
        let mut elem = BytesStart::new("item");
        elem.push_attribute(("objectid", item.objectid.to_string().as_str()));
        if let Some(transform) = transform_attribute(&item.transform) {
            elem.push_attribute(("transform", transform.as_str()));
        }
        empty(writer, elem)?;
    }

    close(writer, "build")
}
