//! Persisted viewer settings

use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ViewerError;
use crate::model::label::{DEFAULT_TIME_SHIFT_SECS, MAX_TIME_SHIFT_SECS};
use crate::model::refresh::DEFAULT_REFRESH;

/// Viewer configuration, stored as TOML in the platform config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the presence server; the log is read from `<server>/db`.
    pub server: String,
    /// Read this database file instead of querying the server.
    pub db_path: Option<PathBuf>,
    /// Auto-refresh period in seconds.
    pub refresh_secs: u64,
    /// Seconds subtracted from every interval before display.
    pub time_shift_secs: i64,
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: "http://127.0.0.1:5000".to_string(),
            db_path: None,
            refresh_secs: DEFAULT_REFRESH.as_secs(),
            time_shift_secs: DEFAULT_TIME_SHIFT_SECS,
            timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn config_dir() -> Result<PathBuf, ViewerError> {
        let dirs = ProjectDirs::from("com", "presence-gantt", "presence-gantt")
            .ok_or(ViewerError::NoConfigDir)?;
        Ok(dirs.config_dir().to_path_buf())
    }

    fn config_path() -> Result<PathBuf, ViewerError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load settings from disk, falling back to defaults when no file exists.
    pub fn load() -> Result<Self, ViewerError> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|e| ViewerError::io(&path, e))?;
        let settings = Self::from_toml(&content)?;
        tracing::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self) -> Result<PathBuf, ViewerError> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).map_err(|e| ViewerError::io(&dir, e))?;

        let path = Self::config_path()?;
        fs::write(&path, toml::to_string_pretty(self)?).map_err(|e| ViewerError::io(&path, e))?;
        tracing::info!("saved settings to {}", path.display());
        Ok(path)
    }

    pub fn from_toml(content: &str) -> Result<Self, ViewerError> {
        let settings: Self = toml::from_str(content)?;
        if !(-MAX_TIME_SHIFT_SECS..=MAX_TIME_SHIFT_SECS).contains(&settings.time_shift_secs) {
            return Err(ViewerError::InvalidTimeShift(settings.time_shift_secs));
        }
        Ok(settings)
    }

    /// Full URL of the presence log endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/db", self.server.trim_end_matches('/'))
    }
}
