//! Appearance preference persisted across sessions

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Key under which the theme preference is stored.
pub const THEME_KEY: &str = "theme";

/// Light or dark appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light appearance (default)
    #[default]
    Light,
    /// Dark appearance
    Dark,
}

impl Theme {
    /// Stored string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Read the saved preference; only an explicit `dark` switches away from light.
    pub fn load(store: &PreferenceStore) -> Self {
        match store.get(THEME_KEY) {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    /// Persist this theme as the saved preference.
    pub fn save(&self, store: &mut PreferenceStore) -> Result<()> {
        store.set(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable string key/value store backed by a JSON file.
///
/// Every `set` rewrites the file, so the store survives process restarts the
/// same way browser local storage does.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PreferenceStore {
    /// Open the store at `path`.
    ///
    /// A missing, empty or unparseable file yields an empty store; only a failed
    /// read is an error. The unparseable file is replaced on the next `set`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring unreadable preferences"
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Opened preference store");
        Ok(Self { path, values })
    }

    /// Default location: `$XDG_STATE_HOME/qrgen/preferences.json`, falling back to
    /// `$HOME/.local/state/qrgen/` and finally the working directory.
    pub fn default_path() -> PathBuf {
        let base = env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
            })
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("qrgen").join("preferences.json")
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a stored value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Store a value and flush the file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| {
                Error::Config(format!(
                    "Failed to create preference directory {}: {e}",
                    dir.display()
                ))
            })?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
