//! Per-part names for slicers
//!
//! 3MF has no portable place for the display name of a component part, so
//! slicers read them from a small XML document stored next to the model at
//! [`MODEL_SETTINGS_PATH`].

use crate::model::ResourceId;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Package path of the part-name document
pub const MODEL_SETTINGS_PATH: &str = "Metadata/model_settings.config";

/// Content type the part-name document is registered with
pub const MODEL_SETTINGS_CONTENT_TYPE: &str = "text/xml";

/// Escape a string for a double-quoted attribute value
///
/// Only `&` and `"` are replaced, `&` first so that the entities introduced
/// for quotes are not escaped again.
pub fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Render the part-name document for the components object `root_id`
///
/// Parts are listed in ascending resource ID order.
pub fn render_model_settings(root_id: ResourceId, names: &BTreeMap<ResourceId, String>) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<config>\n");
    // Writing into a String cannot fail
    let _ = writeln!(out, "  <object id=\"{}\">", root_id);
    for (id, name) in names {
        let _ = writeln!(out, "    <part id=\"{}\" subtype=\"normal_part\">", id);
        let _ = writeln!(
            out,
            "      <metadata key=\"name\" value=\"{}\"/>",
            escape_attribute(name)
        );
        out.push_str("    </part>\n");
    }
    out.push_str("  </object>\n</config>\n");
    out
}
