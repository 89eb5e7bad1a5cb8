use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use chrono::Local;
use log::{debug, info, warn};
use walkdir::WalkDir;
use crate::archive::ArchiveTool;
use crate::error::types::{FileSystemError, Result, RollbackError};
use crate::fs::{FileOperation, StagingDir, StagingKind, TempFileManager};
use super::catalog::PathCatalog;
use super::config::GameDirs;
use super::constants::{APP_INI, MODS_DIR_SUFFIX, SAVES_DIR, TIMESTAMP_FORMAT, USER_SAVES_DIR};
use super::version::{self, CompatibilityIssue, VersionHeader, VersionInfo};

/// Where the unpacked backup lives while it is being restored.
#[derive(Debug)]
enum Staging {
    /// Extracted from an archive into a directory this crate created.
    Extracted(StagingDir),
    /// A directory handed in by the caller.
    Existing { path: PathBuf, remove_on_drop: bool },
}

impl Staging {
    fn path(&self) -> &Path {
        match self {
            Staging::Extracted(dir) => dir.path(),
            Staging::Existing { path, .. } => path,
        }
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Staging::Existing { path, remove_on_drop: true } = self {
            debug!("Cleaning up leftover restore directory: {}", path.display());
            if let Err(e) = path.remove_if_exists() {
                warn!("Failed to cleanup restore dir {}: {}", path.display(), e);
            }
        }
    }
}

/// What a restore changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub game: String,
    pub files_restored: usize,
    /// The backup's `bash.ini`, if it carried one.
    pub restored_ini: Option<PathBuf>,
    /// Where the previous live `bash.ini` was moved, if there was one.
    pub previous_ini: Option<PathBuf>,
}

/// An opened backup, ready to be checked and restored.
///
/// The unpacked content is removed when this value is dropped. A directory passed
/// in by the caller is left alone unless it is a restore staging directory
/// created by an earlier run.
#[derive(Debug)]
pub struct RestoreSettings {
    staging: Staging,
    versions: VersionInfo,
    header: OnceCell<VersionHeader>,
}

impl RestoreSettings {
    /// Opens a backup archive by extracting it, or a backup directory as it is.
    pub fn open(
        backup_path: &Path,
        versions: VersionInfo,
        temp_manager: &TempFileManager,
        tool: &dyn ArchiveTool,
    ) -> Result<Self> {
        let staging = if backup_path.is_file() {
            let dir = temp_manager.create_staging(StagingKind::Restore)?;
            info!("Extracting {} with {}", backup_path.display(), tool.name());
            tool.extract(backup_path, dir.path())?;
            Staging::Extracted(dir)
        } else if backup_path.is_dir() {
            let remove_on_drop = TempFileManager::staging_kind(backup_path) == Some(StagingKind::Restore);
            debug!("Restoring from directory {} (remove afterwards: {})", backup_path.display(), remove_on_drop);
            Staging::Existing {
                path: backup_path.to_path_buf(),
                remove_on_drop,
            }
        } else {
            return Err(RollbackError::InvalidLocation(backup_path.to_path_buf()));
        };

        Ok(Self {
            staging,
            versions,
            header: OnceCell::new(),
        })
    }

    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    /// True when the backup had to be unpacked from an archive.
    pub fn is_extracted(&self) -> bool {
        matches!(self.staging, Staging::Extracted(_))
    }

    /// The backup's version header, read on first use.
    pub fn header(&self) -> Result<&VersionHeader> {
        if let Some(header) = self.header.get() {
            return Ok(header);
        }
        let header = VersionHeader::load(self.staging_path())?;
        debug!(
            "Backup was written by v{} with settings format {}",
            header.app_version, header.settings_version
        );
        Ok(self.header.get_or_init(|| header))
    }

    /// Name of the game the backup was made for.
    pub fn backup_game(&self) -> Result<String> {
        let root = self.staging_path();
        let entries = std::fs::read_dir(root)
            .map_err(|e| FileSystemError::ListDir {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();

        names
            .into_iter()
            .find(|name| name != USER_SAVES_DIR && !name.ends_with(MODS_DIR_SUFFIX))
            .ok_or_else(|| RollbackError::NoGameDir(root.to_path_buf()))
    }

    /// A reason this backup must not be restored for `current_game`, if any.
    pub fn incompatibility_error(&self, current_game: &str) -> Result<Option<CompatibilityIssue>> {
        if let Some(issue) = version::format_issue(self.header()?, &self.versions) {
            return Ok(Some(issue));
        }
        let backup_game = self.backup_game()?;
        Ok(version::game_issue(&backup_game, current_game))
    }

    /// A reason to ask before restoring this backup, if any.
    pub fn incompatibility_warning(&self) -> Result<Option<CompatibilityIssue>> {
        Ok(version::version_warning(self.header()?, &self.versions))
    }

    fn find_backup_ini(&self) -> Option<PathBuf> {
        WalkDir::new(self.staging_path())
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_file() && e.file_name() == APP_INI)
            .map(|e| e.into_path())
    }

    /// Moves the live `bash.ini` aside as `bash(<timestamp>).ini` and puts the
    /// backup's copy in its place.
    ///
    /// Returns the backup ini used and the path the old one was moved to.
    pub fn restore_ini(&self, app_dir: &Path) -> Result<(Option<PathBuf>, Option<PathBuf>)> {
        let backup_ini = self.find_backup_ini();
        let live_ini = app_dir.join(APP_INI);

        let previous = if live_ini.is_file() {
            let stamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
            let aside = set_aside_path(app_dir, &stamp);
            std::fs::rename(&live_ini, &aside)
                .map_err(|e| FileSystemError::Rename {
                    from: live_ini.clone(),
                    to: aside.clone(),
                    reason: e.to_string(),
                })?;
            info!("Moved {} to {}", live_ini.display(), aside.display());
            Some(aside)
        } else {
            None
        };

        if let Some(backup_ini) = &backup_ini {
            backup_ini.copy_file_to(&live_ini)?;
        }

        Ok((backup_ini, previous))
    }

    /// Copies the backup's files over the live ones.
    ///
    /// The game is detected before anything is written, so a backup without a
    /// game directory leaves the live tree untouched.
    pub fn restore_settings(&self, dirs: &GameDirs) -> Result<RestoreReport> {
        let game = self.backup_game()?;
        info!("Restoring settings for {} from {}", game, self.staging_path().display());

        let (restored_ini, previous_ini) = self.restore_ini(&dirs.app_dir)?;

        let mut files_restored = 0;
        let catalog = PathCatalog::build(&game, dirs);
        for entry in catalog.entries() {
            let backup_dir = self.staging_path().join(&entry.archive_dir);
            for name in backup_dir.list_files()? {
                let source = backup_dir.join(&name);
                let dest = entry.source_dir.join(&name);
                debug!("{} --> {}", entry.archive_dir.join(&name).display(), dest.display());
                source.copy_file_to(&dest)?;
                files_restored += 1;
            }
        }

        let backup_saves = self
            .staging_path()
            .join(USER_SAVES_DIR)
            .join(&game)
            .join(SAVES_DIR);
        if backup_saves.is_dir() {
            files_restored += backup_saves.copy_tree_to(&dirs.saves_dir())?;
        }

        info!("Restored {} files", files_restored);
        Ok(RestoreReport {
            game,
            files_restored,
            restored_ini,
            previous_ini,
        })
    }
}

/// A free name for the previous `bash.ini`: `bash(<stamp>).ini`, or
/// `bash(<stamp>) 2.ini` and up when an earlier restore took that name.
fn set_aside_path(app_dir: &Path, stamp: &str) -> PathBuf {
    let stem = Path::new(APP_INI)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut candidate = app_dir.join(format!("{}({}).ini", stem, stamp));
    let mut n = 2;
    while candidate.exists() {
        candidate = app_dir.join(format!("{}({}) {}.ini", stem, stamp, n));
        n += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::TarGzTool;
    use crate::core::test_utils::TestFixture;
    use std::fs;

    fn open_dir(fixture: &TestFixture, dir: &Path, versions: VersionInfo) -> RestoreSettings {
        RestoreSettings::open(dir, versions, &fixture.temp_manager, &TarGzTool::new()).unwrap()
    }

    #[test]
    fn test_missing_location() {
        let fixture = TestFixture::new();
        let missing = fixture.root().join("nowhere.7z");
        let result = RestoreSettings::open(&missing, VersionInfo::new(1, "1"), &fixture.temp_manager, &TarGzTool::new());
        assert!(matches!(result, Err(RollbackError::InvalidLocation(p)) if p == missing));
    }

    #[test]
    fn test_backup_game_skips_user_and_mods_dirs() {
        let fixture = TestFixture::new();
        let dir = fixture.root().join("unpacked");
        fs::create_dir_all(dir.join("My Games/Oblivion")).unwrap();
        fs::create_dir_all(dir.join("Oblivion Mods/Bash Mod Data")).unwrap();
        fs::create_dir_all(dir.join("Oblivion/Mopy")).unwrap();
        fs::write(dir.join("backup.dat"), b"").unwrap();

        let restore = open_dir(&fixture, &dir, VersionInfo::new(1, "1"));
        assert!(!restore.is_extracted());
        assert_eq!(restore.backup_game().unwrap(), "Oblivion");
    }

    #[test]
    fn test_no_game_dir() {
        let fixture = TestFixture::new();
        let dir = fixture.root().join("unpacked");
        fs::create_dir_all(dir.join("My Games/Oblivion")).unwrap();
        VersionHeader::new(1, "1").save(&dir).unwrap();

        let restore = open_dir(&fixture, &dir, VersionInfo::new(1, "1"));
        assert!(matches!(restore.backup_game(), Err(RollbackError::NoGameDir(_))));
        assert!(matches!(restore.incompatibility_error("Oblivion"), Err(RollbackError::NoGameDir(_))));
    }

    #[test]
    fn test_format_checked_before_game() {
        let fixture = TestFixture::new();
        let dir = fixture.root().join("unpacked");
        fs::create_dir_all(&dir).unwrap();
        VersionHeader::new(9, "9").save(&dir).unwrap();

        let restore = open_dir(&fixture, &dir, VersionInfo::new(8, "8"));
        assert_eq!(
            restore.incompatibility_error("Oblivion").unwrap(),
            Some(CompatibilityIssue::FormatTooNew { backup: 9, current: 8 })
        );
        assert!(restore.incompatibility_warning().unwrap().is_some());
    }

    #[test]
    fn test_restore_ini_sets_previous_aside() {
        let fixture = TestFixture::new();
        let dir = fixture.root().join("unpacked");
        fixture.write(dir.join("Oblivion/Mopy/bash.ini"), b"[Settings]\nfrom=backup");
        let app_dir = fixture.config.dirs().app_dir.clone();
        fixture.write(app_dir.join("bash.ini"), b"[Settings]\nfrom=live");

        let restore = open_dir(&fixture, &dir, VersionInfo::new(1, "1"));
        let (restored, previous) = restore.restore_ini(&app_dir).unwrap();

        assert_eq!(restored, Some(dir.join("Oblivion/Mopy/bash.ini")));
        let previous = previous.unwrap();
        let name = previous.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("bash(") && name.ends_with(").ini"), "{}", name);
        assert_eq!(fs::read(&previous).unwrap(), b"[Settings]\nfrom=live");
        assert_eq!(fs::read(app_dir.join("bash.ini")).unwrap(), b"[Settings]\nfrom=backup");
    }

    #[test]
    fn test_set_aside_name_not_reused() {
        let fixture = TestFixture::new();
        let app_dir = fixture.config.dirs().app_dir.clone();
        let first = set_aside_path(&app_dir, "2026-10-18 12.17.10");
        assert_eq!(first, app_dir.join("bash(2026-10-18 12.17.10).ini"));

        fixture.write(&first, b"taken");
        let second = set_aside_path(&app_dir, "2026-10-18 12.17.10");
        assert_eq!(second, app_dir.join("bash(2026-10-18 12.17.10) 2.ini"));
        fixture.write(&second, b"taken");
        assert_eq!(
            set_aside_path(&app_dir, "2026-10-18 12.17.10"),
            app_dir.join("bash(2026-10-18 12.17.10) 3.ini")
        );
    }

    #[test]
    fn test_back_to_back_restores_keep_every_ini() {
        let fixture = TestFixture::new();
        let app_dir = fixture.config.dirs().app_dir.clone();
        fixture.write(app_dir.join("bash.ini"), b"ORIGINAL");
        let first = fixture.root().join("first");
        let second = fixture.root().join("second");
        fixture.write(first.join("Oblivion/Mopy/bash.ini"), b"A");
        fixture.write(second.join("Oblivion/Mopy/bash.ini"), b"B");

        let (_, aside_a) = open_dir(&fixture, &first, VersionInfo::new(1, "1")).restore_ini(&app_dir).unwrap();
        let (_, aside_b) = open_dir(&fixture, &second, VersionInfo::new(1, "1")).restore_ini(&app_dir).unwrap();

        let (aside_a, aside_b) = (aside_a.unwrap(), aside_b.unwrap());
        assert_ne!(aside_a, aside_b);
        assert_eq!(fs::read(&aside_a).unwrap(), b"ORIGINAL");
        assert_eq!(fs::read(&aside_b).unwrap(), b"A");
        assert_eq!(fs::read(app_dir.join("bash.ini")).unwrap(), b"B");
    }

    #[test]
    fn test_restore_ini_without_live_copy() {
        let fixture = TestFixture::new();
        let dir = fixture.root().join("unpacked");
        fs::create_dir_all(dir.join("Oblivion")).unwrap();
        let app_dir = fixture.config.dirs().app_dir.clone();

        let restore = open_dir(&fixture, &dir, VersionInfo::new(1, "1"));
        assert_eq!(restore.restore_ini(&app_dir).unwrap(), (None, None));
        assert!(!app_dir.join("bash.ini").exists());
    }

    #[test]
    fn test_leftover_restore_dir_removed_on_drop() {
        let fixture = TestFixture::new();
        let leftover = fixture.temp_manager.create_staging(StagingKind::Restore).unwrap();
        let leftover_path = leftover.path().to_path_buf();
        let user_dir = fixture.root().join("kept");
        fs::create_dir_all(&user_dir).unwrap();

        // Keep the directory alive past the guard, as a crashed run would.
        std::mem::forget(leftover);
        drop(open_dir(&fixture, &leftover_path, VersionInfo::new(1, "1")));
        drop(open_dir(&fixture, &user_dir, VersionInfo::new(1, "1")));

        assert!(!leftover_path.exists());
        assert!(user_dir.exists());
    }
}
