//! Error types for qrgen operations

use thiserror::Error;

/// Result type alias using qrgen's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrgen operations
#[derive(Error, Debug)]
pub enum Error {
    /// Input was empty after trimming whitespace
    #[error("Input is empty")]
    EmptyInput,

    /// Requested pixel dimension is not one of the supported sizes
    #[error("Unsupported QR size: {0}")]
    UnsupportedSize(u32),

    /// Requested output format is neither png nor svg
    #[error("Unsupported QR format '{0}', expected 'png' or 'svg'")]
    UnsupportedFormat(String),

    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Network or HTTP error while talking to the QR API
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// SVG payload was not valid text
    #[error("Failed to decode SVG payload: {0}")]
    SvgDecode(String),

    /// PNG could not be read back from the rasterized image
    #[error("Canvas readback failed: {0}")]
    CanvasReadback(String),

    /// A download was requested before any result was displayed
    #[error("No QR code is currently displayed")]
    NothingDisplayed,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true if the error is recovered locally and should only be reported to the user.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::Network(_)
                | Self::SvgDecode(_)
                | Self::CanvasReadback(_)
                | Self::NothingDisplayed
        )
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}
