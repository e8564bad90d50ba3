//! `[Content_Types].xml` parsing and rendering

use crate::error::{Error, Result};
use crate::model::Attachment;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

/// Content type of relationship parts
pub const RELATIONSHIPS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.relationships+xml";

/// Content type of 3D model parts
pub const MODEL_CONTENT_TYPE: &str = "application/vnd.ms-package.3dmanufacturing-3dmodel+xml";

const CONTENT_TYPES_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/content-types";

/// Parsed `[Content_Types].xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// `(extension, content type)` pairs from `<Default>` elements
    pub defaults: Vec<(String, String)>,
    /// `(part name, content type)` pairs from `<Override>` elements
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse the content types part
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();
        let mut types = ContentTypes::default();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let local_name = e.local_name();
                    let is_default = local_name.as_ref() == b"Default";
                    let is_override = local_name.as_ref() == b"Override";
                    if is_default || is_override {
                        let mut key = None;
                        let mut content_type = None;

                        for attr in e.attributes() {
                            let attr = attr?;
                            let value = std::str::from_utf8(&attr.value)
                                .map_err(|e| Error::InvalidXml(e.to_string()))?
                                .to_string();
                            match attr.key.as_ref() {
                                b"Extension" | b"PartName" => key = Some(value),
                                b"ContentType" => content_type = Some(value),
                                _ => {}
                            }
                        }

                        if let (Some(key), Some(ct)) = (key, content_type) {
                            if is_default {
                                types.defaults.push((key, ct));
                            } else {
                                types.overrides.push((key, ct));
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(types)
    }

    /// Check the entries every 3MF package needs
    pub fn validate(&self) -> Result<()> {
        let found_rels = self.defaults.iter().any(|(ext, ct)| {
            ext.eq_ignore_ascii_case("rels") && ct == RELATIONSHIPS_CONTENT_TYPE
        });
        if !found_rels {
            return Err(Error::invalid_format_context(
                "Content types",
                "missing required 'rels' extension definition",
            ));
        }

        for (ext, ct) in &self.defaults {
            if ct == MODEL_CONTENT_TYPE && !ext.eq_ignore_ascii_case("model") {
                return Err(Error::invalid_format_context(
                    "Content types",
                    &format!(
                        "content type '{}' must use Extension='model', not Extension='{}'",
                        ct, ext
                    ),
                ));
            }
        }

        let found_model = self
            .defaults
            .iter()
            .chain(self.overrides.iter())
            .any(|(_, ct)| ct == MODEL_CONTENT_TYPE);
        if !found_model {
            return Err(Error::invalid_format_context(
                "Content types",
                "missing required model content type (Default or Override)",
            ));
        }

        Ok(())
    }

    /// Look up the content type of a part, overrides first
    pub fn content_type_of(&self, path: &str) -> Option<&str> {
        let path = super::normalize_path(path);
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(part, _)| super::normalize_path(part) == path)
        {
            return Some(ct);
        }

        let extension = path.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults
            .iter()
            .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
            .map(|(_, ct)| ct.as_str())
    }
}

/// Render the content types part for a model plus its attachments
pub fn render_content_types(attachments: &[Attachment]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Error::xml_write(format!("Failed to write XML declaration: {}", e)))?;

    let mut types = BytesStart::new("Types");
    types.push_attribute(("xmlns", CONTENT_TYPES_NAMESPACE));
    writer
        .write_event(Event::Start(types))
        .map_err(|e| Error::xml_write(format!("Failed to write Types element: {}", e)))?;

    for (extension, content_type) in [
        ("rels", RELATIONSHIPS_CONTENT_TYPE),
        ("model", MODEL_CONTENT_TYPE),
    ] {
        let mut elem = BytesStart::new("Default");
        elem.push_attribute(("Extension", extension));
        elem.push_attribute(("ContentType", content_type));
        writer
            .write_event(Event::Empty(elem))
            .map_err(|e| Error::xml_write(format!("Failed to write Default element: {}", e)))?;
    }

    for attachment in attachments {
        let part_name = format!("/{}", attachment.path);
        let mut elem = BytesStart::new("Override");
        elem.push_attribute(("PartName", part_name.as_str()));
        elem.push_attribute(("ContentType", attachment.content_type.as_str()));
        writer
            .write_event(Event::Empty(elem))
            .map_err(|e| Error::xml_write(format!("Failed to write Override element: {}", e)))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("Types")))
        .map_err(|e| Error::xml_write(format!("Failed to close Types element: {}", e)))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::xml_write(format!("Failed to convert XML to UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
  <Override PartName="/Metadata/model_settings.config" ContentType="text/xml"/>
</Types>"#;

    #[test]
    fn test_parse_and_lookup() {
        let types = ContentTypes::parse(MINIMAL).unwrap();
        assert!(types.validate().is_ok());
        assert_eq!(types.content_type_of("3D/3dmodel.model"), Some(MODEL_CONTENT_TYPE));
        assert_eq!(
            types.content_type_of("Metadata/model_settings.config"),
            Some("text/xml")
        );
        assert_eq!(types.content_type_of("Metadata/thumbnail.png"), None);
    }

    #[test]
    fn test_model_content_type_with_wrong_extension() {
        let xml = r#"<Types>
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;
        let types = ContentTypes::parse(xml).unwrap();
        assert!(types.validate().is_err());
    }

    #[test]
    fn test_missing_rels_default() {
        let xml = r#"<Types>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;
        let err = ContentTypes::parse(xml).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("'rels'"));
    }

    #[test]
    fn test_rendered_content_types_validate() {
        let attachment =
            Attachment::new("Metadata/model_settings.config", "text/xml", Vec::new()).unwrap();
        let xml = render_content_types(&[attachment]).unwrap();

        let types = ContentTypes::parse(&xml).unwrap();
        assert!(types.validate().is_ok());
        assert_eq!(
            types.overrides,
            vec![(
                "/Metadata/model_settings.config".to_string(),
                "text/xml".to_string()
            )]
        );
    }
}
