//! Materials extension parsing
//!
//! Only color groups are read; other property resources are ignored.

use crate::error::{Error, Result};
use crate::model::{Color, ColorGroup, parse_color};
use quick_xml::events::BytesStart;

use super::parse_attributes;

/// Parse colorgroup start and return an empty group
pub(super) fn parse_colorgroup_start(e: &BytesStart) -> Result<ColorGroup> {
    let attrs = parse_attributes(e)?;
    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("colorgroup", "id"))?
        .parse::<usize>()?;
    Ok(ColorGroup::new(id))
}

/// Parse color element
pub(super) fn parse_color_element(e: &BytesStart, colorgroup_id: usize) -> Result<Color> {
    let attrs = parse_attributes(e)?;
    let color_str = attrs
        .get("color")
        .ok_or_else(|| Error::missing_attribute("color", "color"))?;

    parse_color(color_str).ok_or_else(|| {
        Error::InvalidXml(format!(
            "Invalid color format '{}' in colorgroup {}.\n\
             Colors must be in format #RRGGBB or #RRGGBBAA where each component is a hexadecimal value (0-9, A-F).",
            color_str, colorgroup_id
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_element() {
        let e = BytesStart::from_content(r##"m:color color="#10203040""##, 7);
        assert_eq!(parse_color_element(&e, 1).unwrap(), (0x10, 0x20, 0x30, 0x40));

        let bad = BytesStart::from_content(r#"m:color color="red""#, 7);
        let err = parse_color_element(&bad, 9).unwrap_err();
        assert!(err.to_string().contains("colorgroup 9"));
    }

    #[test]
    fn test_colorgroup_requires_id() {
        let e = BytesStart::from_content("m:colorgroup", 12);
        assert!(parse_colorgroup_start(&e).is_err());
    }
}
