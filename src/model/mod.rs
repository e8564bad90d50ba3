//! Data structures representing 3MF models

mod attachment;
mod core;
mod material;

pub use attachment::Attachment;
pub use core::{
    Build, BuildItem, CORE_NAMESPACE, Component, IDENTITY_TRANSFORM, MAX_RESOURCE_ID, Mesh,
    MetadataEntry, Model, Object, ObjectKind, ObjectType, ResourceId, Resources, Transform,
    Triangle, Vertex,
};
pub use material::{
    Color, ColorGroup, MATERIAL_NAMESPACE, color_from_float_rgba, format_color, parse_color,
};
