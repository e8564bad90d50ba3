//! Core 3MF element parsing
//!
//! This module handles parsing of core 3MF elements including objects,
//! vertices, triangles, components, and build items.

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::events::BytesStart;

use super::{parse_attributes, parse_transform, validate_attributes};

/// Parse object element attributes
pub fn parse_object(e: &BytesStart) -> Result<Object> {
    let attrs = parse_attributes(e)?;

    // thumbnail is deprecated but still written by common tools
    validate_attributes(
        &attrs,
        &[
            "id",
            "name",
            "type",
            "pid",
            "pindex",
            "partnumber",
            "thumbnail",
        ],
        "object",
    )?;

    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("object", "id"))?
        .parse::<usize>()?;

    let mut object = Object::new(id);
    object.name = attrs.get("name").cloned();

    if let Some(type_str) = attrs.get("type") {
        object.object_type = match type_str.as_str() {
            "model" => ObjectType::Model,
            "support" => ObjectType::Support,
            "solidsupport" => ObjectType::SolidSupport,
            "surface" => ObjectType::Surface,
            "other" => ObjectType::Other,
            _ => {
                return Err(Error::InvalidXml(format!(
                    "Invalid object type '{}'. Must be one of: model, support, solidsupport, surface, other",
                    type_str
                )));
            }
        };
    }

    if let Some(pid) = attrs.get("pid") {
        object.pid = Some(pid.parse::<usize>()?);
    }

    if let Some(pindex) = attrs.get("pindex") {
        if object.pid.is_none() {
            return Err(Error::InvalidXml(format!(
                "Object {} has a pindex attribute without pid",
                id
            )));
        }
        object.pindex = Some(pindex.parse::<usize>()?);
    }

    Ok(object)
}

/// Parse vertex element attributes
pub fn parse_vertex(e: &BytesStart) -> Result<Vertex> {
    // Parse attributes directly without building a HashMap; meshes are large
    let mut x_opt: Option<f64> = None;
    let mut y_opt: Option<f64> = None;
    let mut z_opt: Option<f64> = None;

    let parse_f64 = |value: &[u8]| -> Result<f64> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        Ok(value_str.trim().parse::<f64>()?)
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"x" => x_opt = Some(parse_f64(&attr.value)?),
            b"y" => y_opt = Some(parse_f64(&attr.value)?),
            b"z" => z_opt = Some(parse_f64(&attr.value)?),
            key if key.contains(&b':') => {}
            key => {
                return Err(Error::InvalidXml(format!(
                    "Unexpected attribute '{}' in vertex element. Only x, y, z are allowed.",
                    String::from_utf8_lossy(key)
                )));
            }
        }
    }

    let x = x_opt.ok_or_else(|| Error::missing_attribute("vertex", "x"))?;
    let y = y_opt.ok_or_else(|| Error::missing_attribute("vertex", "y"))?;
    let z = z_opt.ok_or_else(|| Error::missing_attribute("vertex", "z"))?;

    for (axis, value) in [("x", x), ("y", y), ("z", z)] {
        if !value.is_finite() {
            return Err(Error::InvalidXml(format!(
                "Vertex {} coordinate must be finite (got {})",
                axis, value
            )));
        }
    }

    Ok(Vertex::new(x, y, z))
}

/// Parse triangle element attributes
pub fn parse_triangle(e: &BytesStart) -> Result<Triangle> {
    let mut values: [Option<usize>; 8] = [None; 8];

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let slot = match attr.key.as_ref() {
            b"v1" => 0,
            b"v2" => 1,
            b"v3" => 2,
            b"pid" => 3,
            b"pindex" => 4,
            b"p1" => 5,
            b"p2" => 6,
            b"p3" => 7,
            key if key.contains(&b':') => continue,
            key => {
                return Err(Error::InvalidXml(format!(
                    "Unexpected attribute '{}' in triangle element. Only v1, v2, v3, pid, pindex, p1, p2, p3 are allowed.",
                    String::from_utf8_lossy(key)
                )));
            }
        };
        let value_str =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        values[slot] = Some(value_str.trim().parse::<usize>()?);
    }

    let [v1, v2, v3, pid, pindex, p1, p2, p3] = values;
    let v1 = v1.ok_or_else(|| Error::missing_attribute("triangle", "v1"))?;
    let v2 = v2.ok_or_else(|| Error::missing_attribute("triangle", "v2"))?;
    let v3 = v3.ok_or_else(|| Error::missing_attribute("triangle", "v3"))?;

    let mut triangle = Triangle::new(v1, v2, v3);
    triangle.pid = pid;
    triangle.pindex = pindex;
    triangle.p1 = p1;
    triangle.p2 = p2;
    triangle.p3 = p3;

    Ok(triangle)
}

/// Parse build item element attributes
pub fn parse_build_item(e: &BytesStart) -> Result<BuildItem> {
    let attrs = parse_attributes(e)?;
    validate_attributes(
        &attrs,
        &["objectid", "transform", "partnumber", "thumbnail"],
        "item",
    )?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("item", "objectid"))?
        .parse::<usize>()?;

    let mut item = BuildItem::new(objectid);
    if let Some(transform_str) = attrs.get("transform") {
        item.transform = Some(parse_transform(transform_str, "item")?);
    }

    Ok(item)
}

/// Parse component element attributes
pub fn parse_component(e: &BytesStart) -> Result<Component> {
    let attrs = parse_attributes(e)?;
    validate_attributes(&attrs, &["objectid", "transform"], "component")?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("component", "objectid"))?
        .parse::<usize>()?;

    let mut component = Component::new(objectid);
    if let Some(transform_str) = attrs.get("transform") {
        component.transform = Some(parse_transform(transform_str, "component")?);
    }

    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(xml: &str) -> BytesStart<'_> {
        let inner = xml.trim_start_matches('<').trim_end_matches("/>");
        let name_len = inner.find(' ').unwrap_or(inner.len());
        BytesStart::from_content(inner, name_len)
    }

    #[test]
    fn test_parse_vertex() {
        let vertex = parse_vertex(&start(r#"<vertex x="1.5" y="-2" z="1e3"/>"#)).unwrap();
        assert_eq!(vertex, Vertex::new(1.5, -2.0, 1000.0));
    }

    #[test]
    fn test_parse_vertex_rejects_bad_input() {
        assert!(parse_vertex(&start(r#"<vertex x="1" y="2"/>"#)).is_err());
        assert!(parse_vertex(&start(r#"<vertex x="1" y="2" z="inf"/>"#)).is_err());
        assert!(parse_vertex(&start(r#"<vertex x="1" y="2" z="3" w="4"/>"#)).is_err());
        assert!(parse_vertex(&start(r#"<vertex x="1" y="2" z="3" q:w="4"/>"#)).is_ok());
    }

    #[test]
    fn test_parse_triangle_with_properties() {
        let triangle =
            parse_triangle(&start(r#"<triangle v1="3" v2="1" v3="2" pid="5" p1="0"/>"#)).unwrap();
        assert_eq!(triangle.indices(), [3, 1, 2]);
        assert_eq!(triangle.pid, Some(5));
        assert_eq!(triangle.p1, Some(0));
        assert_eq!(triangle.pindex, None);
    }

    #[test]
    fn test_parse_triangle_missing_index() {
        let err = parse_triangle(&start(r#"<triangle v1="0" v2="1"/>"#)).unwrap_err();
        assert!(err.to_string().contains("v3"));
    }

    #[test]
    fn test_parse_object_attributes() {
        let object =
            parse_object(&start(r#"<object id="3" type="support" name="leg" pid="2" pindex="0"/>"#))
                .unwrap();
        assert_eq!(object.id, 3);
        assert_eq!(object.object_type, ObjectType::Support);
        assert_eq!(object.name.as_deref(), Some("leg"));
        assert_eq!((object.pid, object.pindex), (Some(2), Some(0)));

        assert!(parse_object(&start(r#"<object id="3" type="blob"/>"#)).is_err());
        assert!(parse_object(&start(r#"<object id="3" pindex="0"/>"#)).is_err());
        assert!(parse_object(&start(r#"<object name="x"/>"#)).is_err());
    }

    #[test]
    fn test_parse_build_item_transform() {
        let item = parse_build_item(&start(
            r#"<item objectid="1" transform="1 0 0 0 1 0 0 0 1 0 0 2"/>"#,
        ))
        .unwrap();
        assert_eq!(item.objectid, 1);
        assert_eq!(item.transform.unwrap()[11], 2.0);
    }
}
