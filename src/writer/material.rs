//! Materials extension writing

use crate::error::Result;
use crate::model::{ColorGroup, format_color};
use quick_xml::Writer;
use quick_xml::events::BytesStart;
use std::io::Write as IoWrite;

use super::{close, empty, open};

/// Write a color group under the `m:` prefix
pub(super) fn write_color_group<W: IoWrite>(
    writer: &mut Writer<W>,
    group: &ColorGroup,
) -> Result<()> {
    let mut elem = BytesStart::new("m:colorgroup");
    elem.push_attribute(("id", group.id.to_string().as_str()));
    open(writer, elem)?;

    for &color in &group.colors {
        let mut entry = BytesStart::new("m:color");
        entry.push_attribute(("color", format_color(color).as_str()));
        empty(writer, entry)?;
    }

    close(writer, "m:colorgroup")
}
