//! Core element writing for 3MF model files

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Writer;
use quick_xml::events::BytesStart;
use std::io::Write as IoWrite;

use super::{close, empty, open, transform_attribute};

/// Write an object with its mesh or its component list
pub(super) fn write_object<W: IoWrite>(writer: &mut Writer<W>, object: &Object) -> Result<()> {
    if let Some(ref shape) = object.foreign_shape {
        return Err(Error::InvalidModel(format!(
            "Object {} is a '{}' shape, which cannot be written",
            object.id, shape
        )));
    }

    let mut elem = BytesStart::new("object");
    elem.push_attribute(("id", object.id.to_string().as_str()));
    elem.push_attribute(("type", object.object_type.as_str()));
    if let Some(ref name) = object.name {
        elem.push_attribute(("name", name.as_str()));
    }
    for (key, value) in [("pid", object.pid), ("pindex", object.pindex)] {
        if let Some(value) = value {
            elem.push_attribute((key, value.to_string().as_str()));
        }
    }
    open(writer, elem)?;

    match object.mesh {
        Some(ref mesh) => write_mesh(writer, mesh)?,
        // An assembly may legitimately end up with no parts
        None => write_components(writer, &object.components)?,
    }

    close(writer, "object")
}

fn write_mesh<W: IoWrite>(writer: &mut Writer<W>, mesh: &Mesh) -> Result<()> {
    open(writer, BytesStart::new("mesh"))?;

    open(writer, BytesStart::new("vertices"))?;
    for vertex in &mesh.vertices {
        let mut elem = BytesStart::new("vertex");
        for (axis, value) in [("x", vertex.x), ("y", vertex.y), ("z", vertex.z)] {
            elem.push_attribute((axis, value.to_string().as_str()));
        }
        empty(writer, elem)?;
    }
    close(writer, "vertices")?;

    open(writer, BytesStart::new("triangles"))?;
    for triangle in &mesh.triangles {
        let mut elem = BytesStart::new("triangle");
        for (key, index) in [("v1", triangle.v1), ("v2", triangle.v2), ("v3", triangle.v3)] {
            elem.push_attribute((key, index.to_string().as_str()));
        }

        let properties = [
            ("pid", triangle.pid),
            ("pindex", triangle.pindex),
            ("p1", triangle.p1),
            ("p2", triangle.p2),
            ("p3", triangle.p3),
        ];
        for (key, value) in properties {
            if let Some(value) = value {
                elem.push_attribute((key, value.to_string().as_str()));
            }
        }
        empty(writer, elem)?;
    }
    close(writer, "triangles")?;

    close(writer, "mesh")
}

fn write_components<W: IoWrite>(writer: &mut Writer<W>, components: &[Component]) -> Result<()> {
    open(writer, BytesStart::new("components"))?;

    for component in components {
        let mut elem = BytesStart::new("component");
        elem.push_attribute(("objectid", component.objectid.to_string().as_str()));
        if let Some(transform) = transform_attribute(&component.transform) {
            elem.push_attribute(("transform", transform.as_str()));
        }
        empty(writer, elem)?;
    }

    close(writer, "components")
}
