//! Helpers for rendering controller events and results in a terminal

use crate::download::DownloadOutcome;
use crate::events::{NoticeKind, UiEvent};
use crate::fetch::LoadState;
use crate::state::{Selection, ViewState};
use serde_json::{Map, Value, json};

/// Combined structured and human-readable representation of an event
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Structured JSON representation suitable for downstream consumers
    pub json: Value,
    /// Human-readable lines for terminal presentation
    pub human: Vec<String>,
}

/// Render a UI event into both JSON and human-readable forms.
pub fn render_event(event: &UiEvent) -> Rendered {
    let json = serde_json::to_value(event).unwrap_or_else(|e| json!({ "error": e.to_string() }));

    let human = match event {
        UiEvent::InputRejected { notice, .. } => vec![format!("! {}", notice.message)],
        UiEvent::FormatSelected { format } => vec![format!("Format: {}", format.label())],
        UiEvent::SizeSelected { size } => vec![format!("Size: {0}x{0}", size.pixels())],
        UiEvent::LoadingStarted { .. } => vec!["Generating QR code...".to_string()],
        UiEvent::ResultDisplayed { url, label, .. } => {
            vec![format!("QR code: {url}"), format!("  [{label}]")]
        }
        UiEvent::Notice(notice) => vec![format!("{} {}", notice_marker(notice.kind), notice.message)],
        UiEvent::ThemeChanged { theme } => vec![format!("Theme: {theme}")],
    };

    Rendered { json, human }
}

/// Render a finished download.
pub fn render_download(outcome: &DownloadOutcome) -> Rendered {
    let json = json!({
        "format": outcome.format,
        "saved": outcome.saved.as_ref().map(|p| p.display().to_string()),
        "notice": outcome.notice,
    });

    let mut human = vec![format!(
        "{} {}",
        notice_marker(outcome.notice.kind),
        outcome.notice.message
    )];
    if let Some(path) = &outcome.saved {
        human.push(format!("  Saved to {}", path.display()));
    }

    Rendered { json, human }
}

/// Render the current selection and view.
pub fn render_status(selection: &Selection, view: &ViewState) -> Rendered {
    let mut root = Map::new();
    root.insert("state".to_string(), Value::String(view.name().to_string()));
    root.insert(
        "selection".to_string(),
        json!({
            "format": selection.format,
            "size": selection.size,
            "theme": selection.theme,
        }),
    );

    let mut human = vec![
        format!("State: {}", view.name()),
        format!(
            "  Format: {}  Size: {}x{}  Theme: {}",
            selection.format.label(),
            selection.size.pixels(),
            selection.size.pixels(),
            selection.theme
        ),
    ];

    if let Some(result) = view.displayed() {
        let load = load_label(&result.load_state());
        root.insert(
            "displayed".to_string(),
            json!({
                "url": result.source_url().as_str(),
                "format": result.format(),
                "label": result.download_label(),
                "load": load,
            }),
        );
        human.push(format!("  Image: {} ({load})", result.source_url()));
        human.push(format!("  [{}]", result.download_label()));
    }

    Rendered {
        json: Value::Object(root),
        human,
    }
}

fn load_label(state: &LoadState) -> &'static str {
    match state {
        LoadState::Pending => "loading",
        LoadState::Loaded(_) => "loaded",
        LoadState::Failed(_) => "broken",
    }
}

fn notice_marker(kind: NoticeKind) -> &'static str {
    match kind {
        NoticeKind::Info => "i",
        NoticeKind::Success => "✓",
        NoticeKind::Failure => "✗",
    }
}
