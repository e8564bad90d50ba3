//! Package relationship parts (`_rels/*.rels`)

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

/// 3D model relationship type
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

/// Namespace of relationship parts
pub const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID
    pub id: Option<String>,
    /// Target part name as written in the XML
    pub target: String,
    /// Relationship type URI
    pub rel_type: String,
}

/// Parse every relationship of a `.rels` part
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() != b"Relationship" {
                    buf.clear();
                    continue;
                }

                let mut id = None;
                let mut target = None;
                let mut rel_type = None;

                for attr in e.attributes() {
                    let attr = attr?;
                    let value = std::str::from_utf8(&attr.value)
                        .map_err(|e| Error::InvalidXml(e.to_string()))?
                        .to_string();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        b"Type" => rel_type = Some(value),
                        _ => {}
                    }
                }

                let target = target.ok_or_else(|| Error::missing_attribute("Relationship", "Target"))?;
                let rel_type = rel_type.ok_or_else(|| Error::missing_attribute("Relationship", "Type"))?;

                // Relationship types must not carry query strings or fragments
                if rel_type.contains('?') || rel_type.contains('#') {
                    return Err(Error::InvalidFormat(format!(
                        "Relationship Type cannot contain query string or fragment: {}",
                        rel_type
                    )));
                }

                relationships.push(Relationship {
                    id,
                    target,
                    rel_type,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(relationships)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
  <Relationship Target="/Metadata/thumbnail.png" Id="rel1" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail"/>
</Relationships>"#;

        let rels = parse_relationships(xml).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].target, "/3D/3dmodel.model");
        assert_eq!(rels[0].rel_type, MODEL_REL_TYPE);
        assert_eq!(rels[0].id.as_deref(), Some("rel0"));
        assert!(rels[1].rel_type.ends_with("/metadata/thumbnail"));
    }

    #[test]
    fn test_relationship_without_target_is_rejected() {
        let xml = r#"<Relationships><Relationship Id="rel0" Type="x"/></Relationships>"#;
        assert!(parse_relationships(xml).is_err());
    }

    #[test]
    fn test_relationship_type_with_fragment_is_rejected() {
        let xml = r#"<Relationships><Relationship Target="/a.model" Type="http://x/y#z"/></Relationships>"#;
        assert!(parse_relationships(xml).is_err());
    }
}
