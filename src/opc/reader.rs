//! Package reading and validation

use super::content_types::ContentTypes;
use super::relationships::{MODEL_REL_TYPE, parse_relationships};
use super::validation::{normalize_path, validate_part_name};
use super::{CONTENT_TYPES_PATH, RELS_PATH};
use crate::error::{Error, Result};
use std::io::{Read, Seek};
use urlencoding::decode;
use zip::ZipArchive;

/// Represents an OPC package (3MF file) opened for reading
pub struct Package<R: Read + Seek> {
    archive: ZipArchive<R>,
    content_types: ContentTypes,
    model_path: String,
}

impl<R: Read + Seek> Package<R> {
    /// Open a 3MF package from a reader and validate its OPC structure
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut package = Self {
            archive,
            content_types: ContentTypes::default(),
            model_path: String::new(),
        };

        for required in [CONTENT_TYPES_PATH, RELS_PATH] {
            if !package.has_file(required) {
                return Err(Error::invalid_format_context(
                    "OPC package structure",
                    &format!(
                        "Missing required file '{}'. The 3MF file may be corrupt or improperly formatted.",
                        required
                    ),
                ));
            }
        }

        let content_types = ContentTypes::parse(&package.get_file(CONTENT_TYPES_PATH)?)?;
        content_types.validate()?;
        package.content_types = content_types;

        package.model_path = package.validate_relationships()?;
        Ok(package)
    }

    /// Check every root relationship target and return the model part path
    fn validate_relationships(&mut self) -> Result<String> {
        let relationships = parse_relationships(&self.get_file(RELS_PATH)?)?;
        let mut model_path = None;

        for relationship in relationships {
            validate_part_name(&relationship.target)?;
            let path = self.resolve_part(&relationship.target).ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "Relationship points to non-existent file: {}",
                    relationship.target
                ))
            })?;

            if relationship.rel_type == MODEL_REL_TYPE && model_path.is_none() {
                model_path = Some(path);
            }
        }

        model_path.ok_or_else(|| Error::MissingFile("3D model relationship not found".to_string()))
    }

    /// Find the archive entry for a relationship target
    ///
    /// Targets are matched as written first, then percent-decoded.
    fn resolve_part(&mut self, target: &str) -> Option<String> {
        let path = normalize_path(target);
        if self.has_file(path) {
            return Some(path.to_string());
        }

        let decoded = decode(path).ok()?;
        if self.has_file(&decoded) {
            return Some(decoded.into_owned());
        }
        None
    }

    /// Path of the main 3D model part
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Get the main 3D model part content
    pub fn get_model(&mut self) -> Result<String> {
        let path = self.model_path.clone();
        self.get_file(&path)
    }

    /// Content type registered for a part
    pub fn content_type_of(&self, path: &str) -> Option<&str> {
        self.content_types.content_type_of(path)
    }

    /// Get a file by name from the archive
    pub fn get_file(&mut self, name: &str) -> Result<String> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingFile(name.to_string()))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// Get a file as binary data from the archive
    pub fn get_file_binary(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self
            .archive
            .by_name(name)
            .map_err(|_| Error::MissingFile(name.to_string()))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Check if a file exists in the archive
    pub fn has_file(&mut self, name: &str) -> bool {
        self.archive.by_name(name).is_ok()
    }

    /// Get the number of files in the archive
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Check if the archive is empty
    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }
}
