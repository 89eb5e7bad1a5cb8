use std::fmt;
use std::path::{Path, PathBuf};
use std::ops::Deref;
use std::time::{Duration, SystemTime};
use log::{warn, debug};
use uuid::Uuid;
use crate::error::types::{FileSystemError, Result};

/// What a staging directory is used for. The kind is encoded in the directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingKind {
    Backup,
    Restore,
}

impl StagingKind {
    pub fn prefix(self) -> &'static str {
        match self {
            StagingKind::Backup => "backup_",
            StagingKind::Restore => "restore_",
        }
    }

    fn from_dir_name(name: &str) -> Option<Self> {
        [StagingKind::Backup, StagingKind::Restore]
            .into_iter()
            .find(|kind| {
                name.strip_prefix(kind.prefix())
                    .map_or(false, |rest| Uuid::try_parse(rest).is_ok())
            })
    }
}

impl fmt::Display for StagingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingKind::Backup => write!(f, "backup"),
            StagingKind::Restore => write!(f, "restore"),
        }
    }
}

/// A staging directory owned by a single backup or restore operation.
///
/// The directory and everything in it is removed when the value is dropped,
/// whether the operation succeeded or not.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    kind: StagingKind,
}

impl StagingDir {
    fn new(base_path: impl AsRef<Path>, kind: StagingKind) -> Result<Self> {
        let uuid = Uuid::new_v4();
        let path = base_path.as_ref().join(format!("{}{}", kind.prefix(), uuid.simple()));
        std::fs::create_dir_all(&path)
            .map_err(|e| FileSystemError::CreateDir {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!("Created {} staging directory: {}", kind, path.display());

        Ok(Self {
            path,
            kind,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> StagingKind {
        self.kind
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.path.join(path)
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        debug!("Cleaning up staging directory: {}", self.path.display());
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!("Failed to cleanup staging dir {}: {}", self.path.display(), e);
        }
    }
}

impl AsRef<Path> for StagingDir {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Deref for StagingDir {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.path
    }
}

/// Hands out staging directories below a common base directory.
#[derive(Debug, Clone)]
pub struct TempFileManager {
    temp_base: PathBuf,
    max_age: Duration,
}

impl Default for TempFileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TempFileManager {
    pub fn new() -> Self {
        Self::with_max_age(Duration::from_secs(24 * 3600))
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        let temp_base = std::env::temp_dir().join("settings_rollback");
        Self::with_base(temp_base, max_age)
    }

    pub fn with_base(temp_base: impl Into<PathBuf>, max_age: Duration) -> Self {
        let temp_base = temp_base.into();
        debug!("Initialized TempFileManager with base path: {}", temp_base.display());
        Self { temp_base, max_age }
    }

    pub fn create_staging(&self, kind: StagingKind) -> Result<StagingDir> {
        std::fs::create_dir_all(&self.temp_base)
            .map_err(|e| FileSystemError::CreateDir {
                path: self.temp_base.clone(),
                reason: e.to_string(),
            })?;

        self.cleanup_stale();
        StagingDir::new(&self.temp_base, kind)
    }

    /// Removes staging directories left behind by a process that never got to drop them.
    pub fn cleanup_stale(&self) {
        let entries = match std::fs::read_dir(&self.temp_base) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Skipping stale staging sweep of {}: {}", self.temp_base.display(), e);
                return;
            }
        };

        let now = SystemTime::now();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_dir() || Self::staging_kind(&path).is_none() {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| {
                    now.duration_since(modified)
                        .map(|age| age > self.max_age)
                        .unwrap_or(false)
                })
                .unwrap_or(false);

            if expired {
                debug!("Removing expired staging directory: {}", path.display());
                if let Err(e) = std::fs::remove_dir_all(&path) {
                    warn!("Failed to remove expired staging dir {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Returns the kind of staging directory `path` is, judging by its name.
    pub fn staging_kind(path: &Path) -> Option<StagingKind> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(StagingKind::from_dir_name)
    }

    pub fn temp_base(&self) -> &Path {
        &self.temp_base
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }
}
