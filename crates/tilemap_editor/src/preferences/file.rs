//! Reading and writing the preferences file
//!
//! Preferences live as pretty-printed JSON in the platform config directory.
//! The editor never fails to start over them: a missing file means defaults
//! and an unreadable one is logged and replaced on the next save.

use super::EditorPreferences;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const PREFERENCES_FILE: &str = "tilemap_editor.json";

#[derive(Debug)]
pub enum PreferencesError {
    /// Reading or writing the file at this path failed
    Io(PathBuf, String),
    /// The file is not valid preferences JSON
    Parse(PathBuf, String),
    Serialize(String),
    /// The platform has no config directory for this user
    NoConfigDir,
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::Io(path, e) => write!(f, "{}: {}", path.display(), e),
            PreferencesError::Parse(path, e) => {
                write!(f, "{} is not valid preferences JSON: {}", path.display(), e)
            }
            PreferencesError::Serialize(e) => write!(f, "Could not encode preferences: {}", e),
            PreferencesError::NoConfigDir => write!(f, "No config directory for this user"),
        }
    }
}

impl std::error::Error for PreferencesError {}

/// Where the editor keeps its preferences file
fn preferences_path() -> Result<PathBuf, PreferencesError> {
    ProjectDirs::from("io", "tilemap_editor", "tilemap_editor")
        .map(|dirs| dirs.config_dir().join(PREFERENCES_FILE))
        .ok_or(PreferencesError::NoConfigDir)
}

impl EditorPreferences {
    /// Preferences from the config directory, or defaults with a warning
    pub fn load() -> Self {
        match preferences_path().and_then(|path| Self::load_from(&path)) {
            Ok(prefs) => prefs,
            Err(e) => {
                bevy::log::warn!("Using default preferences: {}", e);
                Self::default()
            }
        }
    }

    /// A missing file yields defaults; fields absent from the file keep theirs
    pub fn load_from(path: &Path) -> Result<Self, PreferencesError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(PreferencesError::Io(path.to_path_buf(), e.to_string())),
        };

        serde_json::from_str(&content)
            .map_err(|e| PreferencesError::Parse(path.to_path_buf(), e.to_string()))
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        let path = preferences_path()?;
        self.save_to(&path)?;
        bevy::log::debug!("Saved preferences to {}", path.display());
        Ok(())
    }

    /// Write to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), PreferencesError> {
        let io_error = |e: std::io::Error| PreferencesError::Io(path.to_path_buf(), e.to_string());

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(io_error)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| PreferencesError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(io_error)
    }
}
