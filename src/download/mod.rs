//! Saving the displayed QR code to disk
//!
//! SVG results are fetched again as text and saved through a short-lived blob.
//! PNG results wait for the displayed image to finish loading, are redrawn onto
//! a canvas at their natural size and re-encoded.

mod blob;
mod raster;

pub use blob::{Blob, BlobRegistry, BlobUrl};
pub use raster::reencode_png;

use crate::error::{Error, Result};
use crate::events::Notice;
use crate::fetch::{ImageSource, LoadState};
use crate::qr::QrFormat;
use crate::state::DisplayedResult;
use bytes::Bytes;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Where downloads end up.
pub trait SaveTarget: Send + Sync {
    /// Save `data` under `file_name` and return the final path.
    fn save(&self, file_name: &str, data: &[u8]) -> Result<PathBuf>;
}

/// Saves into a directory without overwriting: `qrcode.png`, `qrcode (1).png`, ...
#[derive(Debug, Clone)]
pub struct DirectoryTarget {
    dir: PathBuf,
}

impl DirectoryTarget {
    /// Save into `dir`, creating it on first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectoryTarget {
    fn save(&self, file_name: &str, data: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let (stem, ext) = match file_name.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (file_name, None),
        };

        for attempt in 0u32.. {
            let name = match (attempt, ext) {
                (0, _) => file_name.to_string(),
                (n, Some(ext)) => format!("{stem} ({n}).{ext}"),
                (n, None) => format!("{stem} ({n})"),
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    write_or_remove(&path, file, data)?;
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }

        Err(Error::Other(format!("No free file name for {file_name}")))
    }
}

/// Write `data` into the freshly created `path`, removing it again if the write fails.
fn write_or_remove(path: &Path, mut file: impl Write, data: &[u8]) -> Result<()> {
    match file.write_all(data).and_then(|()| file.flush()) {
        Ok(()) => Ok(()),
        Err(e) => {
            drop(file);
            if let Err(remove) = fs::remove_file(path) {
                tracing::warn!(path = %path.display(), error = %remove, "Failed to remove partial download");
            }
            Err(Error::Io(e))
        }
    }
}

/// Tunables for [`Downloader`].
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Delay before a saved SVG blob is released
    pub revoke_delay: Duration,
    /// Return PNG readback failures as errors instead of the soft notice
    pub strict_png_readback: bool,
    /// Display duration for notices
    pub notice_duration: Duration,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            revoke_delay: Duration::from_millis(100),
            strict_png_readback: false,
            notice_duration: crate::events::NOTICE_DURATION,
        }
    }
}

/// Result of a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// Format of the result that was downloaded
    pub format: QrFormat,
    /// Saved file, if any
    pub saved: Option<PathBuf>,
    /// Notice to show next to the download control
    pub notice: Notice,
}

/// Saves displayed results using the strategy matching their format tag.
pub struct Downloader {
    source: Arc<dyn ImageSource>,
    target: Arc<dyn SaveTarget>,
    blobs: BlobRegistry,
    options: DownloadOptions,
}

impl Downloader {
    /// Create a downloader fetching through `source` and saving into `target`.
    pub fn new(
        source: Arc<dyn ImageSource>,
        target: Arc<dyn SaveTarget>,
        options: DownloadOptions,
    ) -> Self {
        Self {
            source,
            target,
            blobs: BlobRegistry::new(),
            options,
        }
    }

    /// Blobs created for SVG downloads.
    pub fn blobs(&self) -> &BlobRegistry {
        &self.blobs
    }

    /// Download the displayed result.
    ///
    /// Recoverable failures come back as an outcome without a saved file; only
    /// strict PNG readback turns a failure into an error.
    pub async fn download(&self, result: &DisplayedResult) -> Result<DownloadOutcome> {
        match result.format() {
            QrFormat::Svg => Ok(self.download_svg(result.source_url()).await),
            QrFormat::Png => self.download_png(result).await,
        }
    }

    async fn download_svg(&self, url: &Url) -> DownloadOutcome {
        let saved = match self.fetch_svg(url).await {
            Ok(svg) => {
                let blob_url = self.blobs.create(svg, QrFormat::Svg.mime_type());
                let saved = self.save_blob(&blob_url, QrFormat::Svg.download_file_name());
                self.blobs.revoke_after(blob_url, self.options.revoke_delay);
                saved
            }
            Err(err) => Err(err),
        };

        match saved {
            Ok(path) => {
                tracing::info!(path = %path.display(), "SVG downloaded");
                self.outcome(QrFormat::Svg, Some(path), Notice::svg_downloaded())
            }
            Err(err) => {
                tracing::error!(error = %err, %url, "Error downloading SVG");
                self.outcome(QrFormat::Svg, None, Notice::download_failed())
            }
        }
    }

    async fn fetch_svg(&self, url: &Url) -> Result<Bytes> {
        let fetched = self.source.fetch(url).await?;
        if !fetched.is_success() {
            tracing::warn!(status = fetched.status, %url, "SVG request returned non-success status");
        }
        std::str::from_utf8(&fetched.body).map_err(|e| Error::SvgDecode(e.to_string()))?;
        Ok(fetched.body)
    }

    fn save_blob(&self, blob_url: &BlobUrl, file_name: &str) -> Result<PathBuf> {
        let blob = self
            .blobs
            .resolve(blob_url)
            .ok_or_else(|| Error::Other(format!("{blob_url} was revoked before saving")))?;
        self.target.save(file_name, &blob.data)
    }

    async fn download_png(&self, result: &DisplayedResult) -> Result<DownloadOutcome> {
        let load = result.load();
        if !load.is_complete() {
            tracing::debug!(url = %load.url(), "Image still loading, deferring PNG download");
        }

        let png = match load.wait().await {
            LoadState::Loaded(bytes) => reencode_png(&bytes),
            LoadState::Failed(reason) => Err(Error::CanvasReadback(format!(
                "image did not load: {reason}"
            ))),
            LoadState::Pending => Err(Error::CanvasReadback("image never loaded".to_string())),
        };

        let png = match png {
            Ok(png) => png,
            Err(err) if self.options.strict_png_readback => {
                tracing::error!(error = %err, "Error reading back PNG");
                return Err(err);
            }
            Err(err) => {
                tracing::error!(error = %err, "Error reading back PNG");
                return Ok(self.outcome(QrFormat::Png, None, Notice::download_started()));
            }
        };

        match self.target.save(QrFormat::Png.download_file_name(), &png) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "PNG downloaded");
                Ok(self.outcome(QrFormat::Png, Some(path), Notice::png_downloaded()))
            }
            Err(err) => {
                tracing::error!(error = %err, "Error saving PNG");
                Ok(self.outcome(QrFormat::Png, None, Notice::download_failed()))
            }
        }
    }

    fn outcome(&self, format: QrFormat, saved: Option<PathBuf>, notice: Notice) -> DownloadOutcome {
        DownloadOutcome {
            format,
            saved,
            notice: notice.with_duration(self.options.notice_duration),
        }
    }
}
