//! OPC (Open Packaging Conventions) handling for 3MF files
//!
//! 3MF files are ZIP archives following the OPC standard, containing
//! various parts including the main 3D model file and relationships.

mod content_types;
mod reader;
mod relationships;
mod validation;
mod writer;

pub use content_types::{ContentTypes, MODEL_CONTENT_TYPE, RELATIONSHIPS_CONTENT_TYPE};
pub use reader::Package;
pub use relationships::{MODEL_REL_TYPE, Relationship, parse_relationships};
pub use validation::{normalize_path, validate_part_name};
pub use writer::create_package;

/// Main 3D model file path within the 3MF archive
pub const MODEL_PATH: &str = "3D/3dmodel.model";

/// Content types file path
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Relationships file path
pub const RELS_PATH: &str = "_rels/.rels";
