//! qrgen runtime configuration handling

use crate::download::DownloadOptions;
use crate::error::{Error, Result};
use crate::qr::{DEFAULT_API_BASE, QrFormat, QrSize};
use crate::theme::PreferenceStore;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration structure persisted to disk or environment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QrgenConfig {
    /// Remote QR API settings
    pub api: ApiOptions,
    /// Front end defaults and timings
    pub ui: UiOptions,
    /// Download directory and preference file
    pub storage: StorageOptions,
    /// Logging configuration
    pub logging: LoggingOptions,
}

impl QrgenConfig {
    /// Load configuration from an explicit path or fall back to discovered defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_file(path)?
        } else if let Some(path) = Self::discover_file()? {
            tracing::info!("Using configuration file: {}", path.display());
            Self::from_file(&path)?
        } else {
            tracing::debug!("No qrgen.toml / qrgen.yaml found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Attempt to locate a configuration file in common locations.
    fn discover_file() -> Result<Option<PathBuf>> {
        let cwd =
            env::current_dir().map_err(|e| Error::Config(format!("Failed to read cwd: {e}")))?;
        for candidate in ["qrgen.toml", "qrgen.yaml", "qrgen.yml"] {
            let path = cwd.join(candidate);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        if let Some(xdg_config) = env::var_os("XDG_CONFIG_HOME") {
            let base = PathBuf::from(xdg_config).join("qrgen");
            for candidate in ["config.toml", "config.yaml"] {
                let path = base.join(candidate);
                if path.exists() {
                    return Ok(Some(path));
                }
            }
        }

        Ok(None)
    }

    /// Read configuration from a concrete file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;

        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
            .as_str()
        {
            "toml" => Self::from_toml_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse TOML {}: {e}", path.display()))
            }),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse YAML {}: {e}", path.display()))
            }),
            other => Err(Error::Config(format!(
                "Unsupported config format '{}', expected toml/yaml",
                other
            ))),
        }
    }

    /// Parse TOML configuration text.
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply environment variable overrides after file/default loading.
    fn apply_env_overrides(&mut self) {
        self.api.apply_env_overrides();
        self.ui.apply_env_overrides();
        self.storage.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Options handed to the downloader.
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            revoke_delay: Duration::from_millis(self.ui.blob_revoke_delay_ms),
            strict_png_readback: self.ui.strict_png_readback,
            notice_duration: Duration::from_millis(self.ui.notice_duration_ms),
        }
    }
}

/// Remote QR API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiOptions {
    /// Endpoint receiving `size`, `data` and `format` query parameters
    pub base_url: String,
    /// `User-Agent` header sent with every request
    pub user_agent: String,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            user_agent: concat!("qrgen/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(base) = env::var("QRGEN_API_BASE") {
            if !base.trim().is_empty() {
                self.base_url = base;
            }
        }
        if let Ok(agent) = env::var("QRGEN_USER_AGENT") {
            self.user_agent = agent;
        }
    }
}

/// Front end defaults and timings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiOptions {
    /// Size preselected in the size selector
    pub default_size: QrSize,
    /// Format preselected in the format toggle
    pub default_format: QrFormat,
    /// Minimum time the loading indicator stays up, in milliseconds
    pub display_delay_ms: u64,
    /// How long notices stay visible, in milliseconds
    pub notice_duration_ms: u64,
    /// Delay before SVG blobs are released, in milliseconds
    pub blob_revoke_delay_ms: u64,
    /// Surface PNG readback failures as errors instead of a "download started" notice
    pub strict_png_readback: bool,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            default_size: QrSize::default(),
            default_format: QrFormat::Png,
            display_delay_ms: 600,
            notice_duration_ms: 2000,
            blob_revoke_delay_ms: 100,
            strict_png_readback: false,
        }
    }
}

impl UiOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(size) = env::var("QRGEN_SIZE") {
            if let Ok(parsed) = QrSize::from_str(&size) {
                self.default_size = parsed;
            }
        }
        if let Ok(format) = env::var("QRGEN_FORMAT") {
            if let Some(parsed) = QrFormat::parse(&format) {
                self.default_format = parsed;
            }
        }
        if let Ok(delay) = env::var("QRGEN_DISPLAY_DELAY_MS") {
            if let Ok(value) = delay.parse::<u64>() {
                self.display_delay_ms = value;
            }
        }
        if let Ok(strict) = env::var("QRGEN_STRICT_PNG_READBACK") {
            match strict.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" => self.strict_png_readback = true,
                "0" | "false" | "off" => self.strict_png_readback = false,
                _ => {}
            }
        }
    }

    /// Loading indicator duration.
    pub fn display_delay(&self) -> Duration {
        Duration::from_millis(self.display_delay_ms)
    }
}

/// Download directory and preference file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Directory downloads are saved into
    pub download_dir: PathBuf,
    /// Preference file; defaults to the XDG state directory
    pub preferences_file: Option<PathBuf>,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            preferences_file: None,
        }
    }
}

impl StorageOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(dir) = env::var("QRGEN_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Ok(file) = env::var("QRGEN_PREFERENCES_FILE") {
            if file.trim().is_empty() {
                self.preferences_file = None;
            } else {
                self.preferences_file = Some(PathBuf::from(file));
            }
        }
    }

    /// Resolved preference file path.
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_file
            .clone()
            .unwrap_or_else(PreferenceStore::default_path)
    }
}

/// Structured logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    /// Default log level (overridable via `QRGEN_LOG_LEVEL`)
    pub level: String,
    /// Optional log file path for teeing structured logs
    pub file: Option<PathBuf>,
    /// Force ANSI colors in terminal logging
    pub color: bool,
    /// Optional log rotation strategy applied to `file`
    pub rotation: Option<LogRotation>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            color: true,
            rotation: None,
        }
    }
}

impl LoggingOptions {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(level) = env::var(crate::logging::LOG_LEVEL_ENV) {
            self.level = level;
        }
        if let Ok(file) = env::var("QRGEN_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }
        if let Ok(color) = env::var("QRGEN_LOG_COLOR") {
            match color.to_ascii_lowercase().as_str() {
                "0" | "false" | "off" => self.color = false,
                "1" | "true" | "on" => self.color = true,
                _ => {}
            }
        }
        if let Ok(rotation) = env::var("QRGEN_LOG_ROTATION") {
            if let Some(parsed) = LogRotation::parse(&rotation) {
                self.rotation = Some(parsed);
            }
        }
    }
}

/// Supported log rotation policies for file sinks
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Rotate log files once per hour
    Hourly,
    /// Rotate log files once per day
    Daily,
}

impl LogRotation {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QrgenConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE);
        assert_eq!(config.ui.display_delay(), Duration::from_millis(600));
        assert_eq!(config.ui.default_format, QrFormat::Png);
        assert_eq!(config.ui.default_size.pixels(), 300);
        assert!(!config.ui.strict_png_readback);
    }

    #[test]
    fn test_partial_toml() {
        let config = QrgenConfig::from_toml_str(
            r#"
            [api]
            base_url = "http://127.0.0.1:9000/qr"

            [ui]
            default_size = 500
            default_format = "svg"
            strict_png_readback = true

            [logging]
            rotation = "daily"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://127.0.0.1:9000/qr");
        assert_eq!(config.ui.default_size.pixels(), 500);
        assert_eq!(config.ui.default_format, QrFormat::Svg);
        assert_eq!(config.ui.display_delay_ms, 600);
        assert!(config.download_options().strict_png_readback);
        assert_eq!(config.logging.rotation, Some(LogRotation::Daily));
    }

    #[test]
    fn test_unsupported_size_rejected() {
        let result = QrgenConfig::from_toml_str("[ui]\ndefault_size = 123\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_file() {
        let dir = env::temp_dir().join(format!("qrgen-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("qrgen.yaml");
        fs::write(
            &path,
            "storage:\n  download_dir: /tmp/qr-out\nui:\n  display_delay_ms: 0\n",
        )
        .unwrap();

        let config = QrgenConfig::from_file(&path).unwrap();
        assert_eq!(config.storage.download_dir, PathBuf::from("/tmp/qr-out"));
        assert_eq!(config.ui.display_delay_ms, 0);
    }

    #[test]
    fn test_unknown_extension() {
        let dir = env::temp_dir().join(format!("qrgen-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("qrgen.ini");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            QrgenConfig::from_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_explicit_preferences_path() {
        let storage = StorageOptions {
            preferences_file: Some(PathBuf::from("/tmp/prefs.json")),
            ..StorageOptions::default()
        };
        assert_eq!(storage.preferences_path(), PathBuf::from("/tmp/prefs.json"));
    }
}
