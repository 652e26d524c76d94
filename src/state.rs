//! View state and user selections
//!
//! Both are plain values: every transition consumes the old value and returns
//! the new one, and the controller owns the current copy.

use crate::fetch::{ImageLoad, LoadState};
use crate::qr::{GenerationRequest, QrFormat, QrSize};
use crate::theme::Theme;
use url::Url;

/// Format, size and theme currently chosen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Active output format
    pub format: QrFormat,
    /// Selected size
    pub size: QrSize,
    /// Active theme
    pub theme: Theme,
}

impl Selection {
    /// Same selection with a different format.
    pub fn with_format(self, format: QrFormat) -> Self {
        Self { format, ..self }
    }

    /// Same selection with a different size.
    pub fn with_size(self, size: QrSize) -> Self {
        Self { size, ..self }
    }

    /// Same selection with a different theme.
    pub fn with_theme(self, theme: Theme) -> Self {
        Self { theme, ..self }
    }
}

/// The image currently on screen plus its format tag.
#[derive(Debug, Clone)]
pub struct DisplayedResult {
    source_url: Url,
    format: QrFormat,
    load: ImageLoad,
}

impl DisplayedResult {
    /// Wrap a started image load, tagging it with the format it was generated in.
    pub fn new(format: QrFormat, load: ImageLoad) -> Self {
        Self {
            source_url: load.url().clone(),
            format,
            load,
        }
    }

    /// Image source URL.
    pub fn source_url(&self) -> &Url {
        &self.source_url
    }

    /// Format at generation time.
    pub fn format(&self) -> QrFormat {
        self.format
    }

    /// Label of the download control, fixed at generation time.
    pub fn download_label(&self) -> String {
        format!("Download QR {}", self.format.label())
    }

    /// True once the image pixels are available.
    pub fn is_loaded(&self) -> bool {
        self.load.is_loaded()
    }

    /// Current load state.
    pub fn load_state(&self) -> LoadState {
        self.load.state()
    }

    /// Handle to the underlying image load.
    pub fn load(&self) -> &ImageLoad {
        &self.load
    }
}

/// What the result area shows.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    /// Placeholder, nothing generated yet
    #[default]
    Idle,
    /// Spinner visible
    Loading {
        /// Request being displayed
        request: GenerationRequest,
        /// URL the image will be loaded from
        url: Url,
    },
    /// Image and download control visible
    Displayed(DisplayedResult),
}

impl ViewState {
    /// Enter `Loading` for a new request. Any current result or load is dropped.
    pub fn begin_loading(self, request: GenerationRequest, url: Url) -> Self {
        Self::Loading { request, url }
    }

    /// Show a result.
    pub fn display(self, result: DisplayedResult) -> Self {
        Self::Displayed(result)
    }

    /// The displayed result, if any.
    pub fn displayed(&self) -> Option<&DisplayedResult> {
        match self {
            Self::Displayed(result) => Some(result),
            _ => None,
        }
    }

    /// True while the spinner is visible.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// True before the first generation.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name for status output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading { .. } => "loading",
            Self::Displayed(_) => "displayed",
        }
    }
}
