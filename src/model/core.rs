//! Core 3MF types and structures

use crate::error::{Error, Result};
use std::collections::HashMap;

use super::attachment::Attachment;
use super::material::{Color, ColorGroup};

/// Identifier of a resource (object or property group) within one model
///
/// Identifiers are unique across all resource kinds of a model. Models
/// allocate them in creation order, see [`Model::add_mesh_object`].
pub type ResourceId = usize;

/// Largest resource ID a 3MF document may use (a positive 32-bit integer)
pub const MAX_RESOURCE_ID: ResourceId = i32::MAX as ResourceId;

/// 4x3 affine transformation (12 values in row-major order)
///
/// Format: `[m00 m01 m02 m10 m11 m12 m20 m21 m22 tx ty tz]`
pub type Transform = [f64; 12];

/// The transform that leaves an object where it is
pub const IDENTITY_TRANSFORM: Transform = [
    1.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, //
    0.0, 0.0, 1.0, //
    0.0, 0.0, 0.0,
];

/// Namespace of the 3MF core specification
pub const CORE_NAMESPACE: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

/// A 3D vertex with x, y, z coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A triangle defined by three vertex indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triangle {
    /// Index of first vertex
    pub v1: usize,
    /// Index of second vertex
    pub v2: usize,
    /// Index of third vertex
    pub v3: usize,
    /// Optional property group ID
    pub pid: Option<usize>,
    /// Optional property index for the entire triangle
    pub pindex: Option<usize>,
    /// Optional property index for vertex 1
    pub p1: Option<usize>,
    /// Optional property index for vertex 2
    pub p2: Option<usize>,
    /// Optional property index for vertex 3
    pub p3: Option<usize>,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self {
            v1,
            v2,
            v3,
            pid: None,
            pindex: None,
            p1: None,
            p2: None,
            p3: None,
        }
    }

    /// Vertex indices in winding order
    pub fn indices(&self) -> [usize; 3] {
        [self.v1, self.v2, self.v3]
    }
}

/// A 3D mesh containing vertices and triangles
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// List of vertices
    pub vertices: Vec<Vertex>,
    /// List of triangles
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new mesh with pre-allocated capacity
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
        }
    }

    /// Build a mesh from vertex positions and index triples
    pub fn from_geometry(vertices: Vec<Vertex>, triangles: &[[usize; 3]]) -> Self {
        Self {
            vertices,
            triangles: triangles
                .iter()
                .map(|&[v1, v2, v3]| Triangle::new(v1, v2, v3))
                .collect(),
        }
    }

    /// Check that every triangle references an existing vertex
    pub fn validate_indices(&self) -> Result<()> {
        let count = self.vertices.len();
        for (idx, triangle) in self.triangles.iter().enumerate() {
            if let Some(bad) = triangle.indices().into_iter().find(|&v| v >= count) {
                return Err(Error::InvalidModel(format!(
                    "Triangle {} references vertex {} but the mesh has only {} vertices",
                    idx, bad, count
                )));
            }
        }
        Ok(())
    }
}

/// A component that references another object with optional transformation
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// ID of the referenced object
    pub objectid: ResourceId,
    /// Optional transformation matrix
    pub transform: Option<Transform>,
}

impl Component {
    /// Create a new component with the given object reference
    pub fn new(objectid: ResourceId) -> Self {
        Self {
            objectid,
            transform: None,
        }
    }

    /// Create a new component with a transformation matrix
    pub fn with_transform(objectid: ResourceId, transform: Transform) -> Self {
        Self {
            objectid,
            transform: Some(transform),
        }
    }
}

/// Type of 3D object
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ObjectType {
    /// A standard model object
    #[default]
    Model,
    /// A support structure
    Support,
    /// A solid support structure
    SolidSupport,
    /// A surface object
    Surface,
    /// Other types
    Other,
}

impl ObjectType {
    /// Attribute value used in model XML
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Model => "model",
            ObjectType::Support => "support",
            ObjectType::SolidSupport => "solidsupport",
            ObjectType::Surface => "surface",
            ObjectType::Other => "other",
        }
    }
}

/// What an object is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// The object carries its own mesh geometry
    Mesh,
    /// The object assembles other objects
    Components,
    /// Any other shape (boolean shapes, displacement meshes, empty objects)
    Other,
}

/// A 3D object that can be a mesh or reference other objects
#[derive(Debug, Clone, Default)]
pub struct Object {
    /// Object ID
    pub id: ResourceId,
    /// Object name (optional)
    pub name: Option<String>,
    /// Type of object
    pub object_type: ObjectType,
    /// Optional mesh data
    pub mesh: Option<Mesh>,
    /// Object-level property group ID
    pub pid: Option<ResourceId>,
    /// Object-level property index, used with `pid`
    pub pindex: Option<usize>,
    /// Components that reference other objects (assemblies)
    pub components: Vec<Component>,
    /// Whether the object declares a `<components>` element, even an empty one
    pub declares_components: bool,
    /// Local name of a shape element this library does not model
    pub foreign_shape: Option<String>,
}

impl Object {
    /// Create a new object
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Classify the object by its shape
    pub fn kind(&self) -> ObjectKind {
        if self.foreign_shape.is_some() {
            ObjectKind::Other
        } else if self.mesh.is_some() {
            ObjectKind::Mesh
        } else if self.declares_components || !self.components.is_empty() {
            ObjectKind::Components
        } else {
            ObjectKind::Other
        }
    }
}

/// Resources section containing objects and property groups
#[derive(Debug, Clone, Default)]
pub struct Resources {
    /// List of objects, in document order
    pub objects: Vec<Object>,
    /// List of color groups (materials extension)
    pub color_groups: Vec<ColorGroup>,
}

impl Resources {
    /// Create a new empty resources section
    pub fn new() -> Self {
        Self::default()
    }
}

/// An item to be built, referencing an object
#[derive(Debug, Clone, PartialEq)]
pub struct BuildItem {
    /// Reference to object ID
    pub objectid: ResourceId,
    /// Optional transformation matrix
    pub transform: Option<Transform>,
}

impl BuildItem {
    /// Create a new build item
    pub fn new(objectid: ResourceId) -> Self {
        Self {
            objectid,
            transform: None,
        }
    }
}

/// Build section specifying which objects to manufacture
#[derive(Debug, Clone, Default)]
pub struct Build {
    /// List of items to build
    pub items: Vec<BuildItem>,
}

impl Build {
    /// Create a new empty build section
    pub fn new() -> Self {
        Self::default()
    }
}

/// Metadata entry of a 3MF model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    /// Name of the metadata entry
    pub name: String,
    /// Value of the metadata entry
    pub value: String,
    /// Preservation flag (optional attribute)
    pub preserve: Option<bool>,
}

impl MetadataEntry {
    /// Create a new metadata entry
    pub fn new(name: String, value: String) -> Self {
        Self {
            name,
            value,
            preserve: None,
        }
    }
}

/// Complete 3MF model
#[derive(Debug, Clone)]
pub struct Model {
    /// Unit of measurement (e.g., "millimeter", "inch")
    pub unit: String,
    /// XML namespace
    pub xmlns: String,
    /// Metadata entries
    pub metadata: Vec<MetadataEntry>,
    /// Resources (objects, color groups)
    pub resources: Resources,
    /// Build specification
    pub build: Build,
    /// Additional package parts written next to the model
    pub attachments: Vec<Attachment>,
    next_resource_id: ResourceId,
    // Position hints by ID; a hit is only trusted once the ID matches
    object_slots: HashMap<ResourceId, usize>,
    group_slots: HashMap<ResourceId, usize>,
}

impl Model {
    /// Create a new empty model
    pub fn new() -> Self {
        Self {
            unit: "millimeter".to_string(),
            xmlns: CORE_NAMESPACE.to_string(),
            metadata: Vec::new(),
            resources: Resources::new(),
            build: Build::new(),
            attachments: Vec::new(),
            next_resource_id: 1,
            object_slots: HashMap::new(),
            group_slots: HashMap::new(),
        }
    }

    /// Get metadata value by name
    pub fn get_metadata(&self, name: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    /// Iterate over the top-level objects in document order
    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.resources.objects.iter()
    }

    /// Look up an object by ID
    pub fn object(&self, id: ResourceId) -> Option<&Object> {
        self.object_position(id).map(|i| &self.resources.objects[i])
    }

    fn object_mut(&mut self, id: ResourceId) -> Result<&mut Object> {
        let position = self
            .object_position(id)
            .ok_or_else(|| Error::InvalidModel(format!("Object {} does not exist", id)))?;
        Ok(&mut self.resources.objects[position])
    }

    /// Look up a color group by ID
    pub fn color_group(&self, id: ResourceId) -> Option<&ColorGroup> {
        let groups = &self.resources.color_groups;
        self.group_slots
            .get(&id)
            .copied()
            .filter(|&i| groups.get(i).is_some_and(|g| g.id == id))
            .or_else(|| groups.iter().position(|g| g.id == id))
            .map(|i| &groups[i])
    }

    /// Objects pushed straight into `resources` are found by scanning
    fn object_position(&self, id: ResourceId) -> Option<usize> {
        let objects = &self.resources.objects;
        self.object_slots
            .get(&id)
            .copied()
            .filter(|&i| objects.get(i).is_some_and(|o| o.id == id))
            .or_else(|| objects.iter().position(|o| o.id == id))
    }

    fn push_object(&mut self, object: Object) {
        self.object_slots
            .insert(object.id, self.resources.objects.len());
        self.resources.objects.push(object);
    }

    /// The ID the next created resource will receive
    pub fn next_resource_id(&self) -> ResourceId {
        self.next_resource_id
    }

    fn allocate_resource_id(&mut self) -> ResourceId {
        let id = self.next_resource_id;
        self.next_resource_id += 1;
        id
    }

    /// Continue ID allocation after the highest ID already in use
    ///
    /// Also indexes the resources for lookup by ID. Fails for IDs above
    /// [`MAX_RESOURCE_ID`].
    pub(crate) fn sync_resource_ids(&mut self) -> Result<()> {
        self.object_slots = self
            .resources
            .objects
            .iter()
            .enumerate()
            .map(|(i, o)| (o.id, i))
            .collect();
        self.group_slots = self
            .resources
            .color_groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.id, i))
            .collect();

        let highest = self
            .object_slots
            .keys()
            .chain(self.group_slots.keys())
            .copied()
            .max()
            .unwrap_or(0);
        if highest > MAX_RESOURCE_ID {
            return Err(Error::InvalidModel(format!(
                "Resource ID {} exceeds the largest allowed ID {}",
                highest, MAX_RESOURCE_ID
            )));
        }
        self.next_resource_id = self.next_resource_id.max(highest + 1);
        Ok(())
    }

    /// Add a mesh object and return its newly allocated ID
    pub fn add_mesh_object(&mut self, mesh: Mesh) -> ResourceId {
        let id = self.allocate_resource_id();
        let mut object = Object::new(id);
        object.mesh = Some(mesh);
        self.push_object(object);
        id
    }

    /// Add an empty components object and return its newly allocated ID
    pub fn add_components_object(&mut self) -> ResourceId {
        let id = self.allocate_resource_id();
        let mut object = Object::new(id);
        object.declares_components = true;
        self.push_object(object);
        id
    }

    /// Add a color group holding `colors` and return its newly allocated ID
    pub fn add_color_group(&mut self, colors: Vec<Color>) -> ResourceId {
        let id = self.allocate_resource_id();
        let mut group = ColorGroup::new(id);
        group.colors = colors;
        self.group_slots
            .insert(id, self.resources.color_groups.len());
        self.resources.color_groups.push(group);
        id
    }

    /// Set the display name of an object
    pub fn set_object_name(&mut self, id: ResourceId, name: impl Into<String>) -> Result<()> {
        self.object_mut(id)?.name = Some(name.into());
        Ok(())
    }

    /// Bind a property of a color group to a whole mesh object
    pub fn set_object_level_property(
        &mut self,
        object_id: ResourceId,
        pid: ResourceId,
        pindex: usize,
    ) -> Result<()> {
        let group = self.color_group(pid).ok_or_else(|| {
            Error::InvalidModel(format!("Property group {} does not exist", pid))
        })?;
        if pindex >= group.colors.len() {
            return Err(Error::InvalidModel(format!(
                "Property index {} is out of range for color group {} with {} colors",
                pindex,
                pid,
                group.colors.len()
            )));
        }

        let object = self.object_mut(object_id)?;
        if object.mesh.is_none() {
            return Err(Error::InvalidModel(format!(
                "Object {} has no mesh and cannot carry an object-level property",
                object_id
            )));
        }
        object.pid = Some(pid);
        object.pindex = Some(pindex);
        Ok(())
    }

    /// Add a component referencing `objectid` to the components object `parent`
    pub fn add_component(
        &mut self,
        parent: ResourceId,
        objectid: ResourceId,
        transform: Transform,
    ) -> Result<&Component> {
        if parent == objectid {
            return Err(Error::InvalidModel(format!(
                "Object {} cannot be a component of itself",
                parent
            )));
        }
        if self.object(objectid).is_none() {
            return Err(Error::InvalidModel(format!(
                "Component references missing object {}",
                objectid
            )));
        }

        let object = self.object_mut(parent)?;
        if object.mesh.is_some() {
            return Err(Error::InvalidModel(format!(
                "Object {} is a mesh object and cannot hold components",
                parent
            )));
        }
        object.declares_components = true;
        object
            .components
            .push(Component::with_transform(objectid, transform));
        // Just pushed, so the vector is not empty
        Ok(&object.components[object.components.len() - 1])
    }

    /// Add a build item referencing `objectid`
    pub fn add_build_item(&mut self, objectid: ResourceId, transform: Transform) -> Result<&BuildItem> {
        if self.object(objectid).is_none() {
            return Err(Error::InvalidModel(format!(
                "Build item references missing object {}",
                objectid
            )));
        }
        let mut item = BuildItem::new(objectid);
        item.transform = Some(transform);
        self.build.items.push(item);
        Ok(&self.build.items[self.build.items.len() - 1])
    }

    /// Add a binary part stored at `path` inside the package
    pub fn add_attachment(
        &mut self,
        path: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<&Attachment> {
        let attachment = Attachment::new(path, content_type, data)?;
        if self.attachments.iter().any(|a| a.path == attachment.path) {
            return Err(Error::InvalidModel(format!(
                "An attachment is already stored at '{}'",
                attachment.path
            )));
        }
        self.attachments.push(attachment);
        Ok(&self.attachments[self.attachments.len() - 1])
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
