//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Feedback settings (vibration, sound, dark mode)
//! - Session lengths and the frame interval of the live loop
//! - Calibration length
//! - Location of the HRV export
//!
//! Configuration is stored at `~/.config/breathwork/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::calibration::DEFAULT_CALIBRATION_SECS;
use crate::error::ConfigError;
use crate::hrv::DEFAULT_WINDOW_DAYS;
use crate::session::{FeedbackSettings, SessionKind};

/// Feedback toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_true")]
    pub vibration: bool,
    #[serde(default)]
    pub sound: bool,
    #[serde(default)]
    pub dark_mode: bool,
}

/// Session lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_quick_minutes")]
    pub quick_minutes: u64,
    #[serde(default = "default_full_minutes")]
    pub full_minutes: u64,
    /// Interval between engine ticks in the live loop.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    #[serde(default = "default_calibration_secs")]
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrvConfig {
    /// Path to the readiness/HRV JSON export.
    #[serde(default)]
    pub data_path: Option<String>,
    #[serde(default = "default_window_days")]
    pub window_days: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathwork/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub hrv: HrvConfig,
}

fn default_true() -> bool {
    true
}
fn default_quick_minutes() -> u64 {
    5
}
fn default_full_minutes() -> u64 {
    10
}
fn default_frame_interval_ms() -> u64 {
    50
}
fn default_calibration_secs() -> u64 {
    DEFAULT_CALIBRATION_SECS
}
fn default_window_days() -> usize {
    DEFAULT_WINDOW_DAYS
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            vibration: true,
            sound: false,
            dark_mode: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quick_minutes: default_quick_minutes(),
            full_minutes: default_full_minutes(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_calibration_secs(),
        }
    }
}

impl Default for HrvConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            window_days: default_window_days(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    // Optional strings serialize as null until first set.
                    serde_json::Value::Null | serde_json::Value::String(_) => {
                        if value.is_empty() {
                            serde_json::Value::Null
                        } else {
                            serde_json::Value::String(value.into())
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, writing defaults", path.display());
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Falling back to default config: {}", e);
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, in memory only.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    pub fn feedback(&self) -> FeedbackSettings {
        FeedbackSettings {
            sound: self.settings.sound,
            vibration: self.settings.vibration,
        }
    }

    /// Target length of a session of `kind`, in seconds.
    pub fn target_secs(&self, kind: SessionKind) -> u64 {
        match kind {
            SessionKind::Quick => self.session.quick_minutes.saturating_mul(60),
            SessionKind::Full | SessionKind::Custom => self.session.full_minutes.saturating_mul(60),
            SessionKind::Calibration => self.calibration.duration_secs,
        }
    }
}
