//! Front end controller tying validation, display and download together

use crate::config::QrgenConfig;
use crate::download::{DirectoryTarget, DownloadOptions, DownloadOutcome, Downloader, SaveTarget};
use crate::error::{Error, Result};
use crate::events::{EventSender, Notice, SHAKE_DURATION, UiEvent};
use crate::fetch::{HttpImageSource, ImageLoad, ImageSource};
use crate::qr::{GenerationRequest, QrFormat, QrSize};
use crate::state::{DisplayedResult, Selection, ViewState};
use crate::theme::{PreferenceStore, Theme};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Settings the controller needs from configuration.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// QR API endpoint
    pub api_base: String,
    /// Minimum loading indicator time
    pub display_delay: Duration,
    /// Initial size selection
    pub default_size: QrSize,
    /// Initial format selection
    pub default_format: QrFormat,
    /// Downloader tunables
    pub download: DownloadOptions,
}

impl ControllerOptions {
    /// Extract controller settings from the loaded configuration.
    pub fn from_config(config: &QrgenConfig) -> Self {
        Self {
            api_base: config.api.base_url.clone(),
            display_delay: config.ui.display_delay(),
            default_size: config.ui.default_size,
            default_format: config.ui.default_format,
            download: config.download_options(),
        }
    }
}

/// A request that entered `Loading` and waits to be displayed.
#[derive(Debug, Clone)]
#[must_use = "a pending display does nothing until completed"]
pub struct PendingDisplay {
    request: GenerationRequest,
    url: Url,
}

impl PendingDisplay {
    /// The validated request.
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }

    /// URL the image will be loaded from.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// Owns the selection and view state and reacts to user actions.
pub struct QrController {
    options: ControllerOptions,
    source: Arc<dyn ImageSource>,
    downloader: Downloader,
    preferences: PreferenceStore,
    selection: Selection,
    view: ViewState,
    events: EventSender,
}

impl QrController {
    /// Build a controller talking HTTP to the configured API and saving into the
    /// configured download directory.
    pub fn from_config(config: &QrgenConfig, events: EventSender) -> Result<Self> {
        let source: Arc<dyn ImageSource> =
            Arc::new(HttpImageSource::new(&config.api.user_agent)?);
        let target: Arc<dyn SaveTarget> =
            Arc::new(DirectoryTarget::new(&config.storage.download_dir));
        let preferences = PreferenceStore::open(config.storage.preferences_path())?;

        Ok(Self::new(
            ControllerOptions::from_config(config),
            source,
            target,
            preferences,
            events,
        ))
    }

    /// Assemble a controller from its collaborators. The theme is read from
    /// `preferences`.
    pub fn new(
        options: ControllerOptions,
        source: Arc<dyn ImageSource>,
        target: Arc<dyn SaveTarget>,
        preferences: PreferenceStore,
        events: EventSender,
    ) -> Self {
        let selection = Selection::default()
            .with_format(options.default_format)
            .with_size(options.default_size)
            .with_theme(Theme::load(&preferences));
        let downloader = Downloader::new(Arc::clone(&source), target, options.download.clone());

        Self {
            options,
            source,
            downloader,
            preferences,
            selection,
            view: ViewState::Idle,
            events,
        }
    }

    /// Current selection.
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Current view state.
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// The displayed result, if any.
    pub fn displayed(&self) -> Option<&DisplayedResult> {
        self.view.displayed()
    }

    /// Downloader used by [`QrController::download`].
    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Activate a format for the next generation. The displayed result keeps its own tag.
    pub fn select_format(&mut self, format: QrFormat) {
        self.selection = self.selection.with_format(format);
        self.emit(UiEvent::FormatSelected { format });
    }

    /// Choose the size for the next generation.
    pub fn select_size(&mut self, size: QrSize) {
        self.selection = self.selection.with_size(size);
        self.emit(UiEvent::SizeSelected { size });
    }

    /// Flip between light and dark and persist the choice.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.selection.theme.toggled();
        theme.save(&mut self.preferences)?;
        self.selection = self.selection.with_theme(theme);
        tracing::debug!(%theme, "Theme changed");
        self.emit(UiEvent::ThemeChanged { theme });
        Ok(theme)
    }

    /// Validate input and enter `Loading`.
    ///
    /// Blank input emits [`UiEvent::InputRejected`], leaves the view untouched
    /// and returns `Ok(None)`.
    pub fn submit(&mut self, raw: &str) -> Result<Option<PendingDisplay>> {
        let request = match GenerationRequest::new(raw, self.selection.size, self.selection.format)
        {
            Ok(request) => request,
            Err(Error::EmptyInput) => {
                tracing::debug!("Rejected blank input");
                self.emit(UiEvent::InputRejected {
                    notice: Notice::empty_input().with_duration(self.options.download.notice_duration),
                    shake: SHAKE_DURATION,
                });
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let url = request.url(&self.options.api_base)?;
        tracing::info!(
            size = request.size().pixels(),
            format = %request.format(),
            chars = request.text().chars().count(),
            "Generating QR code"
        );

        self.view = std::mem::take(&mut self.view).begin_loading(request.clone(), url.clone());
        self.emit(UiEvent::LoadingStarted {
            url: url.to_string(),
        });

        Ok(Some(PendingDisplay { request, url }))
    }

    /// Leave `Loading`: point the image at the request URL and show the download control.
    ///
    /// The image load runs in the background and may finish before or after this
    /// returns. A newer pending display completed later replaces this one.
    pub fn complete(&mut self, pending: PendingDisplay) -> DisplayedResult {
        let format = pending.request.format();
        let load = ImageLoad::spawn(Arc::clone(&self.source), pending.url);
        let result = DisplayedResult::new(format, load);

        self.emit(UiEvent::ResultDisplayed {
            url: result.source_url().to_string(),
            format,
            label: result.download_label(),
        });
        self.view = std::mem::take(&mut self.view).display(result.clone());
        result
    }

    /// Submit, keep the loading indicator up for the display delay, then display.
    pub async fn generate(&mut self, raw: &str) -> Result<Option<DisplayedResult>> {
        let Some(pending) = self.submit(raw)? else {
            return Ok(None);
        };

        tokio::time::sleep(self.options.display_delay).await;
        Ok(Some(self.complete(pending)))
    }

    /// Download the displayed result and show the resulting notice.
    pub async fn download(&self) -> Result<DownloadOutcome> {
        let result = self.view.displayed().ok_or(Error::NothingDisplayed)?;
        let outcome = self.downloader.download(result).await?;
        self.emit(UiEvent::Notice(outcome.notice.clone()));
        Ok(outcome)
    }

    fn emit(&self, event: UiEvent) {
        // A front end that stopped listening is not an error.
        let _ = self.events.send(event);
    }
}
