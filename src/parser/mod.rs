//! XML parsing for 3MF model files
//!
//! Only the parts of a model that can be merged are read in full: the core
//! mesh and component geometry, object-level properties, color groups, build
//! items and model metadata. Shapes defined by extensions (boolean shapes,
//! displacement meshes) are recorded by name so callers can skip them.

mod core;
mod material;

use crate::error::{Error, Result};
use crate::model::*;
use crate::opc::Package;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};

use material::{parse_color_element, parse_colorgroup_start};

pub use core::{parse_build_item, parse_component, parse_object, parse_triangle, parse_vertex};

/// Size of 3MF transformation matrix (4x3 affine transform in row-major order)
const TRANSFORM_MATRIX_SIZE: usize = 12;

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Object shapes from extensions that carry no mergeable mesh
const FOREIGN_SHAPES: &[&str] = &["booleanshape", "displacementmesh"];

/// Parse a 3MF file from a reader
pub fn parse_3mf<R: Read + Seek>(reader: R) -> Result<Model> {
    let mut package = Package::open(reader)?;
    let model_xml = package.get_model()?;
    let model = parse_model_xml(&model_xml)?;

    tracing::debug!(
        model_path = package.model_path(),
        objects = model.resources.objects.len(),
        color_groups = model.resources.color_groups.len(),
        "parsed 3MF package"
    );
    Ok(model)
}

/// Extract local name from potentially namespaced XML element name
///
/// # Examples
///
/// - `"m:colorgroup"` returns `"colorgroup"`
/// - `"object"` returns `"object"`
pub(crate) fn get_local_name(name_str: &str) -> &str {
    if let Some(pos) = name_str.rfind(':') {
        &name_str[pos + 1..]
    } else {
        name_str
    }
}

/// Parse the 3D model XML content
///
/// For whole packages use `Model::from_reader()`.
#[doc(hidden)]
pub fn parse_model_xml(xml: &str) -> Result<Model> {
    // DOCTYPE declarations usually appear in the first few lines
    let check_len = xml.len().min(2000);
    let xml_start = xml.get(..check_len).unwrap_or(xml);
    if xml_start.to_lowercase().contains("<!doctype") {
        return Err(Error::InvalidXml(
            "DTD declarations are not allowed in 3MF files for security reasons".to_string(),
        ));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut model = Model::new();
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);
    let mut text_buf = Vec::new();
    let mut seen_model = false;
    let mut in_resources = false;
    let mut in_build = false;
    let mut in_components = false;
    let mut current_object: Option<Object> = None;
    let mut current_mesh: Option<Mesh> = None;
    let mut current_colorgroup: Option<ColorGroup> = None;
    let mut resources_count = 0;
    let mut build_count = 0;

    loop {
        let event_result = reader.read_event_into(&mut buf);
        let is_empty_element = matches!(&event_result, Ok(Event::Empty(_)));

        match event_result {
            Ok(Event::Decl(_)) => {}
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in 3MF files for security reasons"
                        .to_string(),
                ));
            }
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "model" => {
                        seen_model = true;
                        parse_model_attributes(&mut model, e)?;
                    }
                    "metadata" if !in_resources && !in_build => {
                        let attrs = parse_attributes(e)?;
                        let name = attrs
                            .get("name")
                            .ok_or_else(|| Error::missing_attribute("metadata", "name"))?
                            .clone();
                        let preserve = match attrs.get("preserve").map(String::as_str) {
                            None => None,
                            Some("0") | Some("false") => Some(false),
                            Some("1") | Some("true") => Some(true),
                            Some(other) => {
                                return Err(Error::InvalidXml(format!(
                                    "Invalid preserve attribute value '{}'. Must be '0', '1', 'false', or 'true'",
                                    other
                                )));
                            }
                        };
                        let value = if is_empty_element {
                            String::new()
                        } else {
                            read_text_content(&mut reader, &mut text_buf)?
                        };

                        if model.get_metadata(&name).is_some() {
                            return Err(Error::InvalidXml(format!(
                                "Duplicate metadata name '{}'",
                                name
                            )));
                        }
                        let mut entry = MetadataEntry::new(name, value);
                        entry.preserve = preserve;
                        model.metadata.push(entry);
                    }
                    "resources" => {
                        resources_count += 1;
                        if resources_count > 1 {
                            return Err(Error::InvalidXml(
                                "Model must contain exactly one <resources> element".to_string(),
                            ));
                        }
                        in_resources = !is_empty_element;
                    }
                    "build" => {
                        build_count += 1;
                        if build_count > 1 {
                            return Err(Error::InvalidXml(
                                "Model must contain exactly one <build> element".to_string(),
                            ));
                        }
                        in_build = !is_empty_element;
                    }
                    "object" if in_resources => {
                        let object = parse_object(e)?;
                        if is_empty_element {
                            model.resources.objects.push(object);
                        } else {
                            current_object = Some(object);
                        }
                    }
                    "mesh" if current_object.is_some() => {
                        // Most meshes have roughly 2x triangles as vertices
                        let mesh = Mesh::with_capacity(1024, 2048);
                        if is_empty_element {
                            if let Some(ref mut obj) = current_object {
                                obj.mesh = Some(mesh);
                            }
                        } else {
                            current_mesh = Some(mesh);
                        }
                    }
                    shape if FOREIGN_SHAPES.contains(&shape) && current_object.is_some() => {
                        if let Some(ref mut obj) = current_object {
                            obj.foreign_shape = Some(shape.to_string());
                        }
                    }
                    "vertex" if current_mesh.is_some() => {
                        if let Some(ref mut mesh) = current_mesh {
                            mesh.vertices.push(parse_vertex(e)?);
                        }
                    }
                    "triangle" if current_mesh.is_some() => {
                        if let Some(ref mut mesh) = current_mesh {
                            mesh.triangles.push(parse_triangle(e)?);
                        }
                    }
                    "components" if current_object.is_some() => {
                        in_components = !is_empty_element;
                        if let Some(ref mut obj) = current_object {
                            obj.declares_components = true;
                        }
                    }
                    "component" if in_components => {
                        if let Some(ref mut obj) = current_object {
                            obj.components.push(parse_component(e)?);
                        }
                    }
                    "colorgroup" if in_resources && current_object.is_none() => {
                        let group = parse_colorgroup_start(e)?;
                        if is_empty_element {
                            model.resources.color_groups.push(group);
                        } else {
                            current_colorgroup = Some(group);
                        }
                    }
                    "color" if current_colorgroup.is_some() => {
                        if let Some(ref mut group) = current_colorgroup {
                            let color = parse_color_element(e, group.id)?;
                            group.colors.push(color);
                        }
                    }
                    "item" if in_build => {
                        model.build.items.push(parse_build_item(e)?);
                    }
                    _ => {}
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                match get_local_name(name_str) {
                    "resources" => in_resources = false,
                    "build" => in_build = false,
                    "components" => in_components = false,
                    "mesh" => {
                        if let (Some(obj), Some(mesh)) = (current_object.as_mut(), current_mesh.take())
                        {
                            obj.mesh = Some(mesh);
                        }
                    }
                    "object" => {
                        if let Some(obj) = current_object.take() {
                            model.resources.objects.push(obj);
                        }
                    }
                    "colorgroup" => {
                        if let Some(group) = current_colorgroup.take() {
                            model.resources.color_groups.push(group);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e)),
        }
        buf.clear();
    }

    if !seen_model {
        return Err(Error::InvalidXml("Missing <model> root element".to_string()));
    }
    if current_object.is_some() || current_colorgroup.is_some() {
        return Err(Error::InvalidXml(
            "Unexpected end of document inside <resources>".to_string(),
        ));
    }

    validate_parsed_model(&model)?;
    model.sync_resource_ids()?;
    Ok(model)
}

/// Read unit and namespace from the `<model>` element
fn parse_model_attributes(model: &mut Model, e: &BytesStart) -> Result<()> {
    let attrs = parse_attributes(e)?;

    if let Some(unit) = attrs.get("unit") {
        match unit.as_str() {
            "micron" | "millimeter" | "centimeter" | "inch" | "foot" | "meter" => {
                model.unit = unit.clone()
            }
            _ => {
                return Err(Error::InvalidXml(format!(
                    "Invalid unit '{}'. Must be one of: micron, millimeter, centimeter, inch, foot, meter",
                    unit
                )));
            }
        }
    }
    if let Some(xmlns) = attrs.get("xmlns") {
        model.xmlns = xmlns.clone();
    }
    Ok(())
}

/// Collect the text of an element up to its end tag
///
/// Entity references arrive as separate events and are resolved one by one.
/// Trimming is suspended meanwhile so the text around them keeps its spaces.
fn read_text_content(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<String> {
    reader.config_mut().trim_text(false);
    let result = collect_text(reader, buf);
    reader.config_mut().trim_text(true);
    result.map(|text| text.trim().to_string())
}

fn collect_text(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<String> {
    let mut text = String::new();
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Text(t) => {
                let raw = std::str::from_utf8(&t).map_err(|e| Error::InvalidXml(e.to_string()))?;
                let value = unescape(raw).map_err(|e| Error::InvalidXml(e.to_string()))?;
                text.push_str(&value);
            }
            Event::GeneralRef(r) => {
                let raw = std::str::from_utf8(&r).map_err(|e| Error::InvalidXml(e.to_string()))?;
                let entity = format!("&{};", raw);
                let value = unescape(&entity).map_err(|e| Error::InvalidXml(e.to_string()))?;
                text.push_str(&value);
            }
            Event::CData(c) => {
                let raw = std::str::from_utf8(&c).map_err(|e| Error::InvalidXml(e.to_string()))?;
                text.push_str(raw);
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(Error::InvalidXml(
                    "Unexpected end of document inside an element".to_string(),
                ));
            }
            _ => {}
        }
    }
    buf.clear();
    Ok(text)
}

/// Reject duplicate resource IDs and meshes with dangling vertex references
fn validate_parsed_model(model: &Model) -> Result<()> {
    let mut ids = HashSet::new();
    let resource_ids = model
        .resources
        .objects
        .iter()
        .map(|o| o.id)
        .chain(model.resources.color_groups.iter().map(|g| g.id));
    for id in resource_ids {
        if !ids.insert(id) {
            return Err(Error::InvalidModel(format!(
                "Duplicate resource ID {}. Resource IDs must be unique within a model",
                id
            )));
        }
    }

    for object in &model.resources.objects {
        if let Some(ref mesh) = object.mesh {
            mesh.validate_indices().map_err(|e| match e {
                Error::InvalidModel(msg) => {
                    Error::InvalidModel(format!("Object {}: {}", object.id, msg))
                }
                other => other,
            })?;
        }
    }
    Ok(())
}

/// Parse attributes from an XML element
///
/// Values are returned with entity references resolved.
pub(crate) fn parse_attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let raw =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value = unescape(raw).map_err(|e| Error::InvalidXml(e.to_string()))?;

        attrs.insert(key.to_string(), value.into_owned());
    }

    Ok(attrs)
}

/// Check if an attribute key should be skipped during validation
///
/// Namespace declarations, `xml:lang` and extension attributes such as
/// `p:UUID` or `s:slicestackid` pass through.
fn should_skip_attribute(key: &str) -> bool {
    if key.starts_with("xmlns") || key == "xml:lang" {
        return true;
    }
    key.contains(':') && !key.starts_with("xml:")
}

/// Validate that all attributes in the map are in the allowed list
pub(crate) fn validate_attributes(
    attrs: &HashMap<String, String>,
    allowed: &[&str],
    element_name: &str,
) -> Result<()> {
    for key in attrs.keys() {
        if should_skip_attribute(key) {
            continue;
        }
        if !allowed.contains(&key.as_str()) {
            return Err(Error::InvalidXml(format!(
                "Unknown attribute '{}' on <{}>",
                key, element_name
            )));
        }
    }
    Ok(())
}

/// Parse a whitespace separated 4x3 matrix
pub(crate) fn parse_transform(value: &str, element_name: &str) -> Result<Transform> {
    let values = value
        .split_whitespace()
        .map(|s| s.parse::<f64>().map_err(Error::from))
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != TRANSFORM_MATRIX_SIZE {
        return Err(Error::InvalidXml(format!(
            "Transform matrix on <{}> must have exactly {} values (got {})",
            element_name,
            TRANSFORM_MATRIX_SIZE,
            values.len()
        )));
    }
    if let Some((idx, val)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidXml(format!(
            "Transform matrix value at index {} must be finite (got {})",
            idx, val
        )));
    }

    let mut transform = [0.0; TRANSFORM_MATRIX_SIZE];
    transform.copy_from_slice(&values);
    Ok(transform)
}
