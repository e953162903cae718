//! User configuration and store locations

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "csvex";

/// File name of the store holding the last opened directory
pub const SETTINGS_STORE_FILE: &str = ".settings.dat";

/// File name of the store holding per-file notes
pub const NOTES_STORE_FILE: &str = "notes.dat";

fn default_python_command() -> String {
    "python".to_string()
}

fn default_preview_rows() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Interpreter used by the code runner
    #[serde(default = "default_python_command")]
    pub python_command: String,
    /// Number of records shown below the header row
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            python_command: default_python_command(),
            preview_rows: default_preview_rows(),
        }
    }
}

impl UserConfig {
    /// Get the config file path (~/.config/csvex/config.json)
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.json"))
    }

    /// Load config from the default location, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
    }
}

/// Locations of the two named settings stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub settings: PathBuf,
    pub notes: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            settings: dir.join(SETTINGS_STORE_FILE),
            notes: dir.join(NOTES_STORE_FILE),
        }
    }

    /// Stores under ~/.config/csvex
    pub fn resolve() -> Result<Self> {
        config_dir()
            .map(|dir| Self::in_dir(&dir))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }
}

/// Default log file location (~/.cache/csvex/csvex.log)
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR).join("csvex.log"))
}

fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}
