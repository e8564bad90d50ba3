//! OPC part name rules

use crate::error::{Error, Result};

/// Validate a part name according to OPC constraints
///
/// Part names must not contain:
/// - Control characters
/// - Fragment identifiers (#) or query strings (?)
/// - Path segments that are "." or ".."
/// - Empty path segments (consecutive slashes)
/// - Segments ending with "."
///
/// Non-ASCII characters are accepted as-is; many real-world files store them
/// unencoded.
pub fn validate_part_name(part_name: &str) -> Result<()> {
    if part_name.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidFormat(format!(
            "Part name cannot contain control characters: {}",
            part_name.escape_debug()
        )));
    }

    if part_name.contains('#') {
        return Err(Error::InvalidFormat(format!(
            "Part name cannot contain fragment identifier: {}",
            part_name
        )));
    }

    if part_name.contains('?') {
        return Err(Error::InvalidFormat(format!(
            "Part name cannot contain query string: {}",
            part_name
        )));
    }

    for segment in normalize_path(part_name).split('/') {
        if segment.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "Part name cannot contain empty path segments: {}",
                part_name
            )));
        }
        if segment == "." || segment == ".." {
            return Err(Error::InvalidFormat(format!(
                "Part name cannot contain '.' or '..' segments: {}",
                part_name
            )));
        }
        if segment.ends_with('.') {
            return Err(Error::InvalidFormat(format!(
                "Part name segments cannot end with '.': {}",
                part_name
            )));
        }
    }

    Ok(())
}

/// Normalize OPC path by removing leading slash
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_part_names() {
        assert!(validate_part_name("/3D/3dmodel.model").is_ok());
        assert!(validate_part_name("Metadata/model_settings.config").is_ok());
        assert!(validate_part_name("/2D/testÆfile.model").is_ok());
    }

    #[test]
    fn test_invalid_part_names() {
        for name in [
            "",
            "/",
            "3D//a.model",
            "3D/./a.model",
            "3D/../a.model",
            "3D./a.model",
            "3D/a.model#x",
            "3D/a.model?x",
            "3D/a\n.model",
        ] {
            assert!(validate_part_name(name).is_err(), "accepted {:?}", name);
        }
    }
}
