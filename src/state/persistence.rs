// Local persistence
// Saves and loads activity history and user settings as versioned JSON documents

use super::activity::{ActivityItem, ActivityLog};
use super::settings::UserSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// Error types for persistence operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// File I/O error
    IoError(String),
    /// JSON serialization/deserialization error
    JsonError(String),
    /// Invalid data format
    InvalidData(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::IoError(msg) => write!(f, "IO Error: {}", msg),
            PersistenceError::JsonError(msg) => write!(f, "JSON Error: {}", msg),
            PersistenceError::InvalidData(msg) => write!(f, "Invalid Data: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

#[derive(Debug, Serialize, Deserialize)]
struct ActivitiesDocument {
    version: u32,
    activities: Vec<ActivityItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsDocument {
    version: u32,
    settings: UserSettings,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

fn write_document<T: Serialize>(value: &T, path: &Path) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::IoError(e.to_string()))?;
    }

    let json =
        serde_json::to_string_pretty(value).map_err(|e| PersistenceError::JsonError(e.to_string()))?;

    // Write beside the target, then rename over it
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| PersistenceError::IoError(e.to_string()))?;
    fs::rename(&tmp, path).map_err(|e| PersistenceError::IoError(e.to_string()))?;
    Ok(())
}

/// Read a document, or `None` when the file does not exist
fn read_document<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, PersistenceError> {
    if !path.exists() {
        return Ok(None);
    }

    let json = fs::read_to_string(path).map_err(|e| PersistenceError::IoError(e.to_string()))?;

    let probe: VersionProbe =
        serde_json::from_str(&json).map_err(|e| PersistenceError::JsonError(e.to_string()))?;
    if probe.version != FORMAT_VERSION {
        return Err(PersistenceError::InvalidData(format!(
            "Unsupported document version: {}",
            probe.version
        )));
    }

    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| PersistenceError::JsonError(e.to_string()))
}

/// Activity history persistence
#[derive(Debug, Clone)]
pub struct ActivityStore {
    path: PathBuf,
}

impl ActivityStore {
    /// Store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the whole log
    pub fn save(&self, log: &ActivityLog) -> Result<(), PersistenceError> {
        let document = ActivitiesDocument {
            version: FORMAT_VERSION,
            activities: log.list().to_vec(),
        };
        write_document(&document, &self.path)
    }

    /// Load the log; a missing file yields an empty log
    pub fn load(&self) -> Result<ActivityLog, PersistenceError> {
        Ok(read_document::<ActivitiesDocument>(&self.path)?
            .map(|document| ActivityLog::from_items(document.activities))
            .unwrap_or_default())
    }
}

/// User settings persistence
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Save settings
    pub fn save(&self, settings: &UserSettings) -> Result<(), PersistenceError> {
        let document = SettingsDocument {
            version: FORMAT_VERSION,
            settings: settings.clone(),
        };
        write_document(&document, &self.path)
    }

    /// Load settings; a missing file yields defaults
    pub fn load(&self) -> Result<UserSettings, PersistenceError> {
        Ok(read_document::<SettingsDocument>(&self.path)?
            .map(|document| document.settings)
            .unwrap_or_default())
    }
}
