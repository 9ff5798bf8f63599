use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FinsiftError, Result};
use crate::importer::validate::RecordShape;

const APP_DIR: &str = "finsift";
const SETTINGS_FILE: &str = "settings.json";

/// Keys missing from `settings.json` take their value from `Default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: String,
    /// Year for month headers without one. Unset means the current year.
    pub anchor_year: Option<i32>,
    pub max_file_mb: u64,
    pub default_shape: RecordShape,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: home().join("Documents").join(APP_DIR).to_string_lossy().into_owned(),
            anchor_year: None,
            max_file_mb: 10,
            default_shape: RecordShape::default(),
        }
    }
}

fn home() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

impl Settings {
    /// `~/.config/finsift/settings.json`.
    pub fn path() -> PathBuf {
        home().join(".config").join(APP_DIR).join(SETTINGS_FILE)
    }

    pub fn exists() -> bool {
        Self::path().exists()
    }

    /// Reads the settings file. A missing file gives the defaults, and so does
    /// one that no longer parses, with a warning.
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), "ignoring unreadable settings: {e}");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| FinsiftError::Settings(e.to_string()))?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }

    /// Points the data directory at `dir`. A leading `~` is the home
    /// directory; an existing path is made absolute.
    pub fn set_data_dir(&mut self, dir: &str) {
        self.data_dir = match dir.strip_prefix('~') {
            Some(rest) => format!("{}{rest}", home().to_string_lossy()),
            None => std::fs::canonicalize(dir)
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|_| dir.to_string()),
        };
    }

    pub fn anchor_year(&self) -> i32 {
        self.anchor_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("finsift.db")
    }
}
