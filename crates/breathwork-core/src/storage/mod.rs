mod config;
pub mod database;

pub use config::{CalibrationConfig, Config, HrvConfig, SessionConfig, SettingsConfig};
pub use database::{Database, HistoryStats};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/breathwork[-dev]/` based on BREATHWORK_ENV.
///
/// Set BREATHWORK_ENV=dev to use the development data directory, or
/// BREATHWORK_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("BREATHWORK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("BREATHWORK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("breathwork-dev")
            } else {
                base_dir.join("breathwork")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
