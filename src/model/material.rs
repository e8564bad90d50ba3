//! Material extension types

/// Color in 8-bit RGBA format (red, green, blue, alpha)
pub type Color = (u8, u8, u8, u8);

/// Namespace of the materials and properties extension
pub const MATERIAL_NAMESPACE: &str = "http://schemas.microsoft.com/3dmanufacturing/material/2015/02";

/// Convert floating RGBA channels in `[0, 1]` to an 8-bit color
///
/// Channels are clamped to `[0, 1]` before scaling, and NaN maps to 0.
pub fn color_from_float_rgba(r: f32, g: f32, b: f32, a: f32) -> Color {
    fn channel(value: f32) -> u8 {
        if value.is_nan() {
            return 0;
        }
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }
    (channel(r), channel(g), channel(b), channel(a))
}

/// Format a color the way 3MF stores it (`#RRGGBBAA`)
pub fn format_color(color: Color) -> String {
    format!(
        "#{:02X}{:02X}{:02X}{:02X}",
        color.0, color.1, color.2, color.3
    )
}

/// Parse a `#RRGGBB` or `#RRGGBBAA` color
pub fn parse_color(color_str: &str) -> Option<Color> {
    let color_str = color_str.strip_prefix('#')?;
    if !color_str.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&color_str[range], 16).ok();
    match color_str.len() {
        // #RRGGBB format (assume full opacity)
        6 => Some((channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
        8 => Some((channel(0..2)?, channel(2..4)?, channel(4..6)?, channel(6..8)?)),
        _ => None,
    }
}

/// Color group from materials extension
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGroup {
    /// Color group ID
    pub id: usize,
    /// List of colors in this group
    pub colors: Vec<Color>,
}

impl ColorGroup {
    /// Create a new color group
    pub fn new(id: usize) -> Self {
        Self {
            id,
            colors: Vec::new(),
        }
    }
}
