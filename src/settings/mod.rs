//! Persisted settings consumed and produced by backup and restore.
//!
//! Only three values cross this boundary: the settings-format version and the
//! application version (both read), and the directory of the last successful
//! backup (written).

mod json;

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use crate::error::types::Result;

pub use json::JsonSettingsStore;

pub trait SettingsStore: Debug {
    /// Settings-format version of the live settings, `0` when nothing was installed before.
    fn settings_version(&self) -> u32;

    /// Version of the application that last wrote the settings, if recorded.
    ///
    /// This is the previous release after an upgrade, not the running one. Backups
    /// record the running release, which the api is built with.
    fn app_version(&self) -> Option<String>;

    fn last_backup_path(&self) -> Option<PathBuf>;

    fn set_last_backup_path(&mut self, path: &Path) -> Result<()>;
}

/// A store that lives only as long as the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySettingsStore {
    settings_version: u32,
    app_version: Option<String>,
    last_backup_path: Option<PathBuf>,
}

impl MemorySettingsStore {
    pub fn new(settings_version: u32, app_version: impl Into<String>) -> Self {
        Self {
            settings_version,
            app_version: Some(app_version.into()),
            last_backup_path: None,
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn settings_version(&self) -> u32 {
        self.settings_version
    }

    fn app_version(&self) -> Option<String> {
        self.app_version.clone()
    }

    fn last_backup_path(&self) -> Option<PathBuf> {
        self.last_backup_path.clone()
    }

    fn set_last_backup_path(&mut self, path: &Path) -> Result<()> {
        self.last_backup_path = Some(path.to_path_buf());
        Ok(())
    }
}
