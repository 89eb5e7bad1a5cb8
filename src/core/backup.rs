use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use log::{debug, info};
use crate::archive::ArchiveTool;
use crate::error::types::Result;
use crate::fs::{FileOperation, StagingKind, TempFileManager};
use super::constants::TIMESTAMP_FORMAT;
use super::manifest::BackupManifest;
use super::version::{VersionHeader, VersionInfo};

/// Outcome of a finished backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub archive_path: PathBuf,
    /// Directory holding the archive, remembered as the last backup location.
    pub backup_dir: PathBuf,
    pub file_count: usize,
}

/// One backup run: a resolved manifest and the archive it goes into.
#[derive(Debug)]
pub struct BackupSettings {
    archive_path: PathBuf,
    manifest: BackupManifest,
}

impl BackupSettings {
    pub fn new(archive_path: impl Into<PathBuf>, manifest: BackupManifest) -> Self {
        Self {
            archive_path: archive_path.into(),
            manifest,
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn manifest(&self) -> &BackupManifest {
        &self.manifest
    }

    /// Stages every manifest file plus the version header and compresses the lot.
    ///
    /// The staging directory is gone when this returns, and no archive exists at
    /// the target unless the call succeeded.
    pub fn backup_settings(
        &self,
        temp_manager: &TempFileManager,
        tool: &dyn ArchiveTool,
        header: &VersionHeader,
    ) -> Result<BackupReport> {
        header.check()?;
        let staging = temp_manager.create_staging(StagingKind::Backup)?;

        for (archive_path, source) in self.manifest.iter() {
            let dest = staging.join(archive_path);
            debug!("{} --> {}", source.display(), dest.display());
            source.copy_file_to(&dest)?;
        }
        header.save(staging.path())?;

        info!(
            "Compressing {} files into {} with {}",
            self.manifest.len(),
            self.archive_path.display(),
            tool.name()
        );
        tool.compress(staging.path(), &self.archive_path)?;

        Ok(BackupReport {
            archive_path: self.archive_path.clone(),
            backup_dir: backup_dir(&self.archive_path),
            file_count: self.manifest.len(),
        })
    }
}

fn backup_dir(archive_path: &Path) -> PathBuf {
    let parent = archive_path
        .canonicalize()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .or_else(|| archive_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    if parent.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        parent
    }
}

/// File name suggested for a new backup of `game`.
pub fn default_backup_filename(game: &str, versions: &VersionInfo, now: &DateTime<Local>) -> String {
    format!(
        "Backup Bash Settings {} ({}) v{}-{}.7z",
        game,
        now.format(TIMESTAMP_FORMAT),
        versions.settings_version,
        versions.app_version
    )
}
