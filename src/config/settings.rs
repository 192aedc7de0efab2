//! Settings types and persistence.
//!
//! Settings are persisted to `~/.config/mailtree/settings.json` (or the
//! platform equivalent) and loaded at startup. Missing sections and fields
//! fall back to their defaults.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Errors raised while loading or saving settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The platform has no usable config directory.
    #[error("could not determine a config directory")]
    NoConfigDir,

    /// Reading or writing the settings file failed.
    #[error("settings file {path}: {source}")]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("invalid settings in {path}: {source}")]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Gmail API access.
    pub gmail: GmailSettings,
    /// Body window defaults.
    pub body: BodySettings,
    /// Attachment saving defaults.
    pub attachments: AttachmentSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl Settings {
    /// Default location of the settings file.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        ProjectDirs::from("", "", "mailtree")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Loads settings from the default location, or defaults if no file exists.
    pub fn load_or_default() -> Result<Self, SettingsError> {
        let path = Self::default_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads settings from `path`.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes settings to `path` as pretty JSON, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(io_err)
    }
}

/// Gmail REST API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailSettings {
    /// API root, without the `users/{id}` suffix.
    pub api_base: String,
    /// Mailbox owner; `me` is the authenticated user.
    pub user_id: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Default page size for message searches.
    pub max_results: u32,
}

impl Default for GmailSettings {
    fn default() -> Self {
        Self {
            api_base: "https://gmail.googleapis.com/gmail/v1".to_string(),
            user_id: "me".to_string(),
            request_timeout_secs: 30,
            max_results: 100,
        }
    }
}

/// Body window configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodySettings {
    /// Window length used when the caller gives none.
    pub window_limit: usize,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self { window_limit: 20_000 }
    }
}

/// Attachment saving configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentSettings {
    /// Directory relative save paths are resolved against.
    pub save_dir: Option<PathBuf>,
}

impl AttachmentSettings {
    /// Resolves `path` against the configured save directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.save_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
