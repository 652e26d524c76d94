//! QR request primitives
//!
//! This module holds the pieces that turn raw user input into a request for the
//! remote QR API: the output format toggle, the fixed set of supported sizes,
//! input validation and URL construction. Encoding itself happens remotely.

mod input;
mod request;

pub use input::validate_input;
pub use request::{DEFAULT_API_BASE, GenerationRequest};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format requested from the QR API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrFormat {
    /// Raster PNG (default)
    #[default]
    Png,
    /// Vector SVG markup
    Svg,
}

impl QrFormat {
    /// Value used for the `format` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    /// Upper-case label shown on the download control.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Svg => "SVG",
        }
    }

    /// MIME type of the downloaded file.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    /// File name used when saving a download.
    pub fn download_file_name(&self) -> &'static str {
        match self {
            Self::Png => "qrcode.png",
            Self::Svg => "qrcode.svg",
        }
    }

    /// Parse a format identifier (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }
}

impl fmt::Display for QrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QrFormat {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value).ok_or_else(|| Error::UnsupportedFormat(value.to_string()))
    }
}

/// Square pixel dimension, restricted to the sizes offered by the size selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct QrSize(u32);

impl QrSize {
    /// Pixel dimensions offered to the user.
    pub const SUPPORTED: [u32; 6] = [150, 200, 250, 300, 400, 500];

    /// Create a size, rejecting dimensions outside [`QrSize::SUPPORTED`].
    pub fn new(pixels: u32) -> Result<Self> {
        if Self::SUPPORTED.contains(&pixels) {
            Ok(Self(pixels))
        } else {
            Err(Error::UnsupportedSize(pixels))
        }
    }

    /// Width (and height) in pixels.
    pub fn pixels(&self) -> u32 {
        self.0
    }

    /// Value used for the `size` query parameter (`{W}x{W}`).
    pub fn query_value(&self) -> String {
        format!("{0}x{0}", self.0)
    }
}

impl Default for QrSize {
    fn default() -> Self {
        Self(300)
    }
}

impl TryFrom<u32> for QrSize {
    type Error = Error;

    fn try_from(pixels: u32) -> Result<Self> {
        Self::new(pixels)
    }
}

impl From<QrSize> for u32 {
    fn from(size: QrSize) -> Self {
        size.0
    }
}

impl FromStr for QrSize {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        // Accept both "300" and the selector's "300x300" spelling.
        let trimmed = value.trim();
        let width = trimmed.split_once('x').map_or(trimmed, |(w, _)| w);
        let pixels = width
            .parse::<u32>()
            .map_err(|_| Error::Config(format!("Invalid QR size '{value}'")))?;
        Self::new(pixels)
    }
}

impl fmt::Display for QrSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(QrFormat::parse("PNG"), Some(QrFormat::Png));
        assert_eq!(QrFormat::parse(" svg "), Some(QrFormat::Svg));
        assert_eq!(QrFormat::parse("gif"), None);
        assert!(matches!(
            "jpeg".parse::<QrFormat>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_format_defaults_to_png() {
        assert_eq!(QrFormat::default(), QrFormat::Png);
        assert_eq!(QrFormat::Svg.download_file_name(), "qrcode.svg");
        assert_eq!(QrFormat::Svg.mime_type(), "image/svg+xml");
    }

    #[test]
    fn test_size_restricted_to_supported_set() {
        assert_eq!(QrSize::new(300).unwrap().pixels(), 300);
        assert!(matches!(QrSize::new(301), Err(Error::UnsupportedSize(301))));
        assert!(matches!(QrSize::new(0), Err(Error::UnsupportedSize(0))));
    }

    #[test]
    fn test_size_from_str() {
        assert_eq!("200".parse::<QrSize>().unwrap().pixels(), 200);
        assert_eq!("400x400".parse::<QrSize>().unwrap().pixels(), 400);
        assert!("huge".parse::<QrSize>().is_err());
    }

    #[test]
    fn test_size_query_value() {
        assert_eq!(QrSize::default().query_value(), "300x300");
    }

    #[test]
    fn test_size_deserialize_validates() {
        let ok: QrSize = serde_json::from_str("250").unwrap();
        assert_eq!(ok.pixels(), 250);
        assert!(serde_json::from_str::<QrSize>("251").is_err());
    }
}
