//! Colors encoded in source filenames
//!
//! A source file can carry its color in a bracketed list of four channel
//! values, for example `part[1, 0, 0.5, 0.9].3mf`. The values are read as
//! linear RGBA in `[0, 1]` and are optionally encoded to sRGB before they end
//! up in a color group.

use crate::model::{Color, color_from_float_rgba};
use thiserror::Error;

/// Number of channels a bracketed color must list
pub const COLOR_CHANNELS: usize = 4;

/// Largest linear value encoded with the linear segment of the sRGB curve
pub const SRGB_LINEAR_THRESHOLD: f32 = 0.0031308;

/// Why a filename did not yield a color
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColorSpecError {
    /// No `[` or no `]` after it
    #[error("filename doesn't contain proper square brackets")]
    MissingBrackets,

    /// The brackets list a number of values other than four
    #[error("filename doesn't mention exactly 4 RGBA values")]
    WrongValueCount(usize),

    /// A listed value is not a number
    #[error("'{0}' is not a number")]
    InvalidValue(String),
}

/// An RGBA color parsed from a filename
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpec {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel, never color-space encoded
    pub a: f32,
}

impl ColorSpec {
    /// Create a color from its four channels
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse the color listed between the first `[` and the `]` after it
    ///
    /// The bracketed content is split on `,`; every token is trimmed and
    /// must parse as a number, and exactly four tokens are required.
    ///
    /// ```
    /// use threemf_merge::ColorSpec;
    ///
    /// let spec = ColorSpec::from_filename("[1, 0, 0.5, 0.9].3mf").unwrap();
    /// assert_eq!(spec, ColorSpec::new(1.0, 0.0, 0.5, 0.9));
    /// assert!(ColorSpec::from_filename("[1,0,0].3mf").is_err());
    /// ```
    pub fn from_filename(name: &str) -> Result<Self, ColorSpecError> {
        let bracketed = bracketed_name(name).ok_or(ColorSpecError::MissingBrackets)?;
        let content = &bracketed[1..bracketed.len() - 1];

        let tokens: Vec<&str> = content.split(',').collect();
        if tokens.len() != COLOR_CHANNELS {
            return Err(ColorSpecError::WrongValueCount(tokens.len()));
        }

        let mut channels = [0.0f32; COLOR_CHANNELS];
        for (channel, token) in channels.iter_mut().zip(&tokens) {
            let token = token.trim();
            *channel = token
                .parse::<f32>()
                .map_err(|_| ColorSpecError::InvalidValue(token.to_string()))?;
        }

        let [r, g, b, a] = channels;
        Ok(Self::new(r, g, b, a))
    }

    /// Encode the color channels from linear light to sRGB
    pub fn srgb_encoded(self) -> Self {
        Self {
            r: linear_to_srgb(self.r),
            g: linear_to_srgb(self.g),
            b: linear_to_srgb(self.b),
            a: self.a,
        }
    }

    /// Quantize to the 8-bit color stored in color groups
    pub fn to_color(self) -> Color {
        color_from_float_rgba(self.r, self.g, self.b, self.a)
    }
}

/// The bracketed part of `name`, brackets included
///
/// Returns `None` unless a `]` follows the first `[`.
pub fn bracketed_name(name: &str) -> Option<&str> {
    let start = name.find('[')?;
    let end = start + name[start..].find(']')?;
    Some(&name[start..=end])
}

/// sRGB transfer function for one channel
pub fn linear_to_srgb(x: f32) -> f32 {
    if x <= SRGB_LINEAR_THRESHOLD {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_four_values() {
        let spec = ColorSpec::from_filename("[0, 0.25, 1, 1]part.3mf").unwrap();
        assert_eq!(spec, ColorSpec::new(0.0, 0.25, 1.0, 1.0));

        let tight = ColorSpec::from_filename("x[1,0,0.5,0.9]y.3mf").unwrap();
        assert_eq!(tight, ColorSpec::new(1.0, 0.0, 0.5, 0.9));
    }

    #[test]
    fn test_missing_brackets() {
        assert_eq!(
            ColorSpec::from_filename("plain.3mf"),
            Err(ColorSpecError::MissingBrackets)
        );
        assert_eq!(
            ColorSpec::from_filename("open[1,0,0,1.3mf"),
            Err(ColorSpecError::MissingBrackets)
        );
        // closing bracket before the opening one does not count
        assert_eq!(
            ColorSpec::from_filename("]1,0,0,1[.3mf"),
            Err(ColorSpecError::MissingBrackets)
        );
    }

    #[test]
    fn test_wrong_value_count() {
        assert_eq!(
            ColorSpec::from_filename("[1,0,0].3mf"),
            Err(ColorSpecError::WrongValueCount(3))
        );
        assert_eq!(
            ColorSpec::from_filename("[1,0,0,1,1].3mf"),
            Err(ColorSpecError::WrongValueCount(5))
        );
        assert_eq!(
            ColorSpec::from_filename("[].3mf"),
            Err(ColorSpecError::WrongValueCount(1))
        );
    }

    #[test]
    fn test_non_numeric_value() {
        assert_eq!(
            ColorSpec::from_filename("[1, red, 0, 1].3mf"),
            Err(ColorSpecError::InvalidValue("red".to_string()))
        );
        assert_eq!(
            ColorSpec::from_filename("[1,,0,1].3mf"),
            Err(ColorSpecError::InvalidValue(String::new()))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ColorSpecError::MissingBrackets.to_string(),
            "filename doesn't contain proper square brackets"
        );
        assert_eq!(
            ColorSpecError::WrongValueCount(3).to_string(),
            "filename doesn't mention exactly 4 RGBA values"
        );
        assert_eq!(
            ColorSpecError::InvalidValue("x".to_string()).to_string(),
            "'x' is not a number"
        );
    }

    #[test]
    fn test_bracketed_name() {
        assert_eq!(bracketed_name("a[1, 0, 0, 1]b.3mf"), Some("[1, 0, 0, 1]"));
        assert_eq!(bracketed_name("a[x]b[y]"), Some("[x]"));
        assert_eq!(bracketed_name("no brackets"), None);
        assert_eq!(bracketed_name("only[open"), None);
    }

    #[test]
    fn test_srgb_boundary() {
        let at = linear_to_srgb(SRGB_LINEAR_THRESHOLD);
        assert_eq!(at, 12.92 * SRGB_LINEAR_THRESHOLD);

        let above = SRGB_LINEAR_THRESHOLD + 1e-6;
        let power = 1.055 * above.powf(1.0 / 2.4) - 0.055;
        assert_eq!(linear_to_srgb(above), power);

        assert!((at - power).abs() < 1e-4);
    }

    #[test]
    fn test_srgb_endpoints() {
        assert_eq!(linear_to_srgb(0.0), 0.0);
        assert!((linear_to_srgb(1.0) - 1.0).abs() < 1e-6);
        assert!((linear_to_srgb(0.5) - 0.735_357).abs() < 1e-4);
    }

    #[test]
    fn test_alpha_not_encoded() {
        let spec = ColorSpec::new(0.5, 0.0, 1.0, 0.5).srgb_encoded();
        assert_eq!(spec.a, 0.5);
        assert_eq!(spec.g, 0.0);
        assert!(spec.r > 0.7);
    }

    #[test]
    fn test_to_color() {
        assert_eq!(ColorSpec::new(1.0, 0.0, 0.5, 0.2).to_color(), (255, 0, 128, 51));
    }
}
