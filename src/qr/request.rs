//! Request descriptors for the remote QR API

use crate::error::Result;
use crate::qr::{QrFormat, QrSize, validate_input};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Base endpoint of the QR generation API.
pub const DEFAULT_API_BASE: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Characters escaped in the `data` parameter; matches `encodeURIComponent`.
const DATA_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A validated (text, size, format) triple submitted to the QR API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    text: String,
    size: QrSize,
    format: QrFormat,
}

impl GenerationRequest {
    /// Validate raw input and build a request for the given size and format.
    pub fn new(raw: &str, size: QrSize, format: QrFormat) -> Result<Self> {
        let text = validate_input(raw)?;
        Ok(Self { text, size, format })
    }

    /// Trimmed text to encode.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Requested size.
    pub fn size(&self) -> QrSize {
        self.size
    }

    /// Requested format.
    pub fn format(&self) -> QrFormat {
        self.format
    }

    /// Percent-encoded text as it appears in the `data` parameter.
    pub fn encoded_text(&self) -> String {
        utf8_percent_encode(&self.text, DATA_ENCODE_SET).to_string()
    }

    /// Query string: `size={W}x{W}&data={text}&format={png|svg}`.
    pub fn query(&self) -> String {
        format!(
            "size={}&data={}&format={}",
            self.size.query_value(),
            self.encoded_text(),
            self.format.as_str()
        )
    }

    /// Full request URL against the given API base.
    ///
    /// The query is [`GenerationRequest::query`] after URL normalisation, which
    /// additionally escapes `'` as `%27` on http(s) bases. Both spellings decode
    /// to the same text.
    pub fn url(&self, base: &str) -> Result<Url> {
        let mut url = Url::parse(base)?;
        url.set_query(Some(&self.query()));
        Ok(url)
    }
}
