//! qrgen - terminal front end for a remote QR code image API
//!
//! Text typed by the user is validated, turned into a request against the
//! QR API (`size`, `data`, `format`), shown as the current result and can be
//! downloaded locally as `qrcode.png` or `qrcode.svg`.
//!
//! # Features
//!
//! - **Request building**: whitespace validation and `encodeURIComponent`-style encoding
//! - **View state**: `Idle -> Loading -> Displayed` with a minimum loading time
//! - **Downloads**: SVG saved from a re-fetched blob, PNG re-encoded from the loaded image
//! - **Preferences**: durable light/dark theme choice
//!
//! # Example
//!
//! ```no_run
//! use qrgen::{QrController, QrFormat, QrgenConfig, events};
//!
//! #[tokio::main]
//! async fn main() -> qrgen::Result<()> {
//!     let config = QrgenConfig::load(None)?;
//!     let (tx, _rx) = events::channel();
//!     let mut controller = QrController::from_config(&config, tx)?;
//!
//!     controller.select_format(QrFormat::Svg);
//!     if controller.generate("https://www.rust-lang.org").await?.is_some() {
//!         let outcome = controller.download().await?;
//!         println!("{}", outcome.notice.message);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2024_compatibility)]

pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod events;
pub mod fetch;
pub mod logging;
pub mod output;
pub mod qr;
pub mod state;
pub mod theme;

// Re-exports for convenience
pub use error::{Error, Result};

pub use config::{ApiOptions, LogRotation, LoggingOptions, QrgenConfig, StorageOptions, UiOptions};
pub use controller::{ControllerOptions, PendingDisplay, QrController};
pub use download::{DirectoryTarget, DownloadOptions, DownloadOutcome, Downloader, SaveTarget};
pub use events::{Notice, NoticeKind, UiEvent};
pub use fetch::{Fetched, HttpImageSource, ImageLoad, ImageSource, LoadState};
pub use qr::{GenerationRequest, QrFormat, QrSize};
pub use state::{DisplayedResult, Selection, ViewState};
pub use theme::{PreferenceStore, Theme};
