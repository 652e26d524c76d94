//! User-facing events emitted by the controller

use crate::qr::{QrFormat, QrSize};
use crate::theme::Theme;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// How long transient notices stay visible.
pub const NOTICE_DURATION: Duration = Duration::from_millis(2000);

/// How long the text field shakes after rejected input.
pub const SHAKE_DURATION: Duration = Duration::from_millis(600);

/// Tone of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Advisory, e.g. input hints or ambiguous outcomes
    Info,
    /// Completed action
    Success,
    /// Recoverable failure
    Failure,
}

/// Short-lived message shown next to a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Message text
    pub message: String,
    /// Tone
    pub kind: NoticeKind,
    /// Display duration
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl Notice {
    fn new(message: &str, kind: NoticeKind) -> Self {
        Self {
            message: message.to_string(),
            kind,
            duration: NOTICE_DURATION,
        }
    }

    /// Hint shown when the text field is blank.
    pub fn empty_input() -> Self {
        Self::new("Please enter some text or URL", NoticeKind::Info)
    }

    /// SVG saved.
    pub fn svg_downloaded() -> Self {
        Self::new("SVG Downloaded!", NoticeKind::Success)
    }

    /// PNG saved.
    pub fn png_downloaded() -> Self {
        Self::new("PNG Downloaded!", NoticeKind::Success)
    }

    /// SVG fetch failed.
    pub fn download_failed() -> Self {
        Self::new("Download failed. Try again.", NoticeKind::Failure)
    }

    /// Reported when PNG readback fails and the outcome is left ambiguous.
    pub fn download_started() -> Self {
        Self::new("Download started...", NoticeKind::Info)
    }

    /// Override the display duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Something the front end should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UiEvent {
    /// Blank input: shake the text field and show a hint
    InputRejected {
        /// Hint next to the text field
        notice: Notice,
        /// Shake animation length
        #[serde(serialize_with = "serialize_millis")]
        shake: Duration,
    },
    /// Format toggle changed
    FormatSelected {
        /// Newly active format
        format: QrFormat,
    },
    /// Size selector changed
    SizeSelected {
        /// Newly selected size
        size: QrSize,
    },
    /// Placeholder hidden, spinner shown
    LoadingStarted {
        /// URL about to be displayed
        url: String,
    },
    /// Spinner removed, image and download control shown
    ResultDisplayed {
        /// Image source
        url: String,
        /// Format tag of the displayed result
        format: QrFormat,
        /// Download control label
        label: String,
    },
    /// Transient notice next to the download control
    Notice(Notice),
    /// Appearance switched
    ThemeChanged {
        /// Newly active theme
        theme: Theme,
    },
}

/// Sending half used by the controller.
pub type EventSender = mpsc::UnboundedSender<UiEvent>;

/// Receiving half consumed by a front end.
pub type EventReceiver = mpsc::UnboundedReceiver<UiEvent>;

/// Create a connected event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::empty_input().message, "Please enter some text or URL");
        assert_eq!(Notice::download_started().kind, NoticeKind::Info);
        assert_eq!(Notice::download_failed().kind, NoticeKind::Failure);
        assert_eq!(Notice::svg_downloaded().duration, NOTICE_DURATION);
    }

    #[test]
    fn test_event_serialization() {
        let event = UiEvent::ResultDisplayed {
            url: "http://qr.test/".into(),
            format: QrFormat::Svg,
            label: "Download QR SVG".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "result_displayed");
        assert_eq!(value["format"], "svg");

        let rejected = UiEvent::InputRejected {
            notice: Notice::empty_input(),
            shake: SHAKE_DURATION,
        };
        let value = serde_json::to_value(&rejected).unwrap();
        assert_eq!(value["shake"], 600);
        assert_eq!(value["notice"]["duration"], 2000);
    }
}
