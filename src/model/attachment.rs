//! Binary parts stored next to the 3D model

use crate::error::Result;
use crate::opc::{normalize_path, validate_part_name};

/// A named binary part of a 3MF package, e.g. slicer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Path of the part inside the package, without leading slash
    pub path: String,
    /// Content type registered for the part
    pub content_type: String,
    /// Raw part contents
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create an attachment after checking `path` is a valid part name
    pub fn new(path: &str, content_type: &str, data: Vec<u8>) -> Result<Self> {
        validate_part_name(path)?;
        Ok(Self {
            path: normalize_path(path).to_string(),
            content_type: content_type.to_string(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_path_is_normalized() {
        let attachment = Attachment::new("/Metadata/x.config", "text/xml", Vec::new()).unwrap();
        assert_eq!(attachment.path, "Metadata/x.config");
    }

    #[test]
    fn test_attachment_rejects_invalid_part_names() {
        assert!(Attachment::new("Metadata/../x", "text/xml", Vec::new()).is_err());
        assert!(Attachment::new("Metadata//x", "text/xml", Vec::new()).is_err());
        assert!(Attachment::new("Metadata/x#frag", "text/xml", Vec::new()).is_err());
    }
}
