//! Error types for reading, building and writing 3MF models
//!
//! All container errors carry an error code so that a failed run can be
//! categorized from its message alone, and so the command line tool can turn
//! a fatal error into a stable process exit status.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: XML parsing, structure and writing errors
//! - **E3xxx**: Model errors
//!
//! ## Common Error Codes
//!
//! - `E1001`: I/O error reading or writing a file
//! - `E1002`: ZIP archive format error
//! - `E1003`: Missing required part in archive
//! - `E2001`: XML parsing error
//! - `E2002`: XML attribute error
//! - `E2003`: Invalid XML structure
//! - `E2004`: Invalid 3MF package format
//! - `E2005`: XML writing error
//! - `E3001`: Invalid model structure
//! - `E3002`: Numeric parse error
//! - `E3003`: Output file already exists

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for 3MF operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong reading a source file or writing the merge
#[derive(Error, Debug)]
pub enum Error {
    /// Opening, reading or creating a file failed
    ///
    /// **Error Code**: E1001. A source line naming a file that does not exist
    /// ends up here.
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a readable ZIP archive
    ///
    /// **Error Code**: E1002. Typical for STL or other mesh files renamed
    /// to `.3mf`, and for truncated downloads.
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A part the package refers to is absent (**E1003**)
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// Malformed XML in a package part (**E2001**)
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Attribute syntax error (**E2002**)
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Well-formed XML that is not a 3MF model document
    ///
    /// **Error Code**: E2003. Raised for missing or unexpected attributes,
    /// misplaced elements and DTD declarations.
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// The OPC layer (content types, relationships, part names) is broken
    ///
    /// **Error Code**: E2004
    #[error("[E2004] Invalid 3MF format: {0}")]
    InvalidFormat(String),

    /// Serializing a part failed (**E2005**)
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// The model is internally inconsistent
    ///
    /// **Error Code**: E3001. Covers triangles pointing past the vertex
    /// list, duplicate resource ids and references to resources that do not
    /// exist, both in parsed files and in models built through the API.
    #[error("[E3001] Invalid model: {0}")]
    InvalidModel(String),

    /// A numeric attribute could not be parsed (**E3002**)
    #[error("[E3002] Parse error: {0}")]
    ParseError(String),

    /// Writing would replace a file that is already there (**E3003**)
    #[error("[E3003] Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Create an InvalidXml error for a missing required attribute
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::InvalidXml(format!(
            "Element '<{}>' is missing required attribute '{}'",
            element, attribute
        ))
    }

    /// Create an InvalidFormat error with context about what structure is invalid
    pub fn invalid_format_context(context: &str, message: &str) -> Self {
        Error::InvalidFormat(format!("{}: {}", context, message))
    }

    /// Create an XmlWrite error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }

    /// Numeric error code, e.g. `1001` for `[E1001]`
    pub fn code(&self) -> u16 {
        match self {
            Error::Io(_) => 1001,
            Error::Zip(_) => 1002,
            Error::MissingFile(_) => 1003,
            Error::Xml(_) => 2001,
            Error::XmlAttr(_) => 2002,
            Error::InvalidXml(_) => 2003,
            Error::InvalidFormat(_) => 2004,
            Error::XmlWrite(_) => 2005,
            Error::InvalidModel(_) => 3001,
            Error::ParseError(_) => 3002,
            Error::OutputExists(_) => 3003,
        }
    }

    /// Process exit status for a run aborted by this error
    ///
    /// Derived from the error category so that it never collides with the
    /// status `1` used for usage errors and skipped inputs:
    /// I/O and archive errors exit with `2`, XML errors with `3`, model
    /// errors with `4`.
    pub fn exit_code(&self) -> u8 {
        (self.code() / 1000) as u8 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_in_messages() {
        let io_err = Error::Io(io::Error::new(io::ErrorKind::NotFound, "test"));
        assert!(io_err.to_string().contains("[E1001]"));

        let missing_file = Error::MissingFile("test.model".to_string());
        assert!(missing_file.to_string().contains("[E1003]"));

        let invalid_model = Error::InvalidModel("test error".to_string());
        assert!(invalid_model.to_string().contains("[E3001]"));

        let parse_err = Error::ParseError("test".to_string());
        assert!(parse_err.to_string().contains("[E3002]"));

        let exists = Error::OutputExists(PathBuf::from("out.3mf"));
        assert!(exists.to_string().contains("[E3003]"));
        assert!(exists.to_string().contains("out.3mf"));
    }

    #[test]
    fn test_code_matches_message_prefix() {
        let errors = [
            Error::MissingFile("x".to_string()),
            Error::InvalidXml("x".to_string()),
            Error::InvalidFormat("x".to_string()),
            Error::xml_write("x".to_string()),
            Error::InvalidModel("x".to_string()),
        ];
        for err in errors {
            let prefix = format!("[E{}]", err.code());
            assert!(err.to_string().starts_with(&prefix), "{}", err);
        }
    }

    #[test]
    fn test_exit_code_by_category() {
        let io_err = Error::Io(io::Error::other("boom"));
        assert_eq!(io_err.exit_code(), 2);
        assert_eq!(Error::InvalidXml("x".to_string()).exit_code(), 3);
        assert_eq!(Error::InvalidModel("x".to_string()).exit_code(), 4);
        assert_eq!(Error::OutputExists(PathBuf::from("a")).exit_code(), 4);
    }

    #[test]
    fn test_missing_attribute_helper() {
        let err = Error::missing_attribute("object", "id");
        assert!(err.to_string().contains("Element '<object>'"));
        assert!(err.to_string().contains("missing required attribute 'id'"));
        assert!(err.to_string().contains("[E2003]"));
    }

    #[test]
    fn test_invalid_format_context_helper() {
        let err = Error::invalid_format_context("OPC structure", "Missing relationship");
        assert!(err.to_string().contains("OPC structure"));
        assert!(err.to_string().contains("Missing relationship"));
        assert!(err.to_string().contains("[E2004]"));
    }

    #[test]
    fn test_parse_float_error_conversion() {
        let parse_err: std::num::ParseFloatError = "not_a_number".parse::<f64>().unwrap_err();
        let err = Error::from(parse_err);
        assert!(err
            .to_string()
            .contains("Failed to parse floating-point number"));
        assert_eq!(err.code(), 3002);
    }
}
