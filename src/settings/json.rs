use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};
use crate::error::types::{FileSystemError, Result, RollbackError};
use crate::fs::FileOperation;
use super::SettingsStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(rename = "settings-format-version", default)]
    settings_version: u32,

    #[serde(rename = "application-version", default, skip_serializing_if = "Option::is_none")]
    app_version: Option<String>,

    #[serde(rename = "last-backup-path", default, skip_serializing_if = "Option::is_none")]
    last_backup_path: Option<PathBuf>,

    /// Keys owned by other parts of the application, written back untouched.
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

/// Settings kept in a JSON file. Writes go straight back to disk.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
    settings: StoredSettings,
}

impl JsonSettingsStore {
    /// Loads the store at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let settings = if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| FileSystemError::ReadFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            serde_json::from_str(&text)
                .map_err(|e| RollbackError::Settings(format!("{}: {}", path.display(), e)))?
        } else {
            debug!("No settings file at {}, starting empty", path.display());
            StoredSettings::default()
        };

        Ok(Self { path, settings })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| RollbackError::Settings(e.to_string()))?;
        self.path.ensure_parent_exists()?;
        std::fs::write(&self.path, text)
            .map_err(|e| FileSystemError::WriteFile {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

impl SettingsStore for JsonSettingsStore {
    fn settings_version(&self) -> u32 {
        self.settings.settings_version
    }

    fn app_version(&self) -> Option<String> {
        self.settings.app_version.clone()
    }

    fn last_backup_path(&self) -> Option<PathBuf> {
        self.settings.last_backup_path.clone()
    }

    fn set_last_backup_path(&mut self, path: &Path) -> Result<()> {
        self.settings.last_backup_path = Some(path.to_path_buf());
        self.save()
    }
}
