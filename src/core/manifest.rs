use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use log::debug;
use crate::error::types::{FileSystemError, Result};
use crate::fs::FileOperation;
use super::catalog::{FileSet, PathCatalog};
use super::config::GameDirs;
use super::constants::{
    BACKUP_SUFFIX, PROFILE_DATA_DIR, PROFILE_TABLE, PROFILE_TEXT_FILES, SAVES_DIR, USER_SAVES_DIR,
};

/// Files selected for one backup: archive-relative path to live source path.
///
/// Only files that existed when the manifest was built are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupManifest {
    files: BTreeMap<PathBuf, PathBuf>,
}

impl BackupManifest {
    /// Resolves the catalog against the live file system and adds the save profile files.
    pub fn build(catalog: &PathCatalog, game: &str, dirs: &GameDirs) -> Result<Self> {
        let mut manifest = Self::default();

        for entry in catalog.entries() {
            let names = match &entry.files {
                FileSet::All => entry.source_dir.list_files()?,
                FileSet::Named(names) => names.iter().cloned().collect(),
            };
            for name in names {
                manifest.add_if_exists(entry.archive_dir.join(&name), entry.source_dir.join(&name));
            }
        }

        let archive_saves = Path::new(USER_SAVES_DIR).join(game).join(SAVES_DIR);
        let live_saves = dirs.saves_dir();
        for profile in save_profiles(&live_saves)? {
            let archive_profile = archive_saves.join(&profile);
            let live_profile = live_saves.join(&profile);

            for name in PROFILE_TEXT_FILES {
                manifest.add_if_exists(archive_profile.join(name), live_profile.join(name));
            }

            let table = Path::new(PROFILE_DATA_DIR).join(PROFILE_TABLE);
            let table_bak = Path::new(PROFILE_DATA_DIR).join(format!("{}{}", PROFILE_TABLE, BACKUP_SUFFIX));
            for relative in [table, table_bak] {
                manifest.add_if_exists(archive_profile.join(&relative), live_profile.join(&relative));
            }
        }

        debug!("Backup manifest holds {} files", manifest.len());
        Ok(manifest)
    }

    fn add_if_exists(&mut self, archive_path: PathBuf, source: PathBuf) {
        if source.is_file() {
            self.files.insert(archive_path, source);
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, archive_path: impl AsRef<Path>) -> Option<&Path> {
        self.files.get(archive_path.as_ref()).map(PathBuf::as_path)
    }

    pub fn contains(&self, archive_path: impl AsRef<Path>) -> bool {
        self.files.contains_key(archive_path.as_ref())
    }

    /// Pairs of (archive-relative path, live source path), ordered by archive path.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.files.iter().map(|(archive, source)| (archive.as_path(), source.as_path()))
    }
}

/// Save profile names below `saves_dir`, starting with the default profile `""`.
///
/// The default profile keeps its table in `Saves/Bash`, so that directory is
/// never treated as a profile of its own.
pub fn save_profiles(saves_dir: &Path) -> Result<Vec<String>> {
    let mut profiles = vec![String::new()];
    if !saves_dir.is_dir() {
        return Ok(profiles);
    }

    let entries = std::fs::read_dir(saves_dir)
        .map_err(|e| FileSystemError::ListDir {
            path: saves_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut named = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FileSystemError::ListDir {
            path: saves_dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.eq_ignore_ascii_case(PROFILE_DATA_DIR) {
            named.push(name);
        }
    }
    named.sort();
    profiles.extend(named);
    Ok(profiles)
}
