//! Which live files belong in a backup, and where they go inside the archive.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use crate::error::types::{Result, RollbackError};
use super::config::GameDirs;
use super::constants::{APP_INI, BACKUP_SUFFIX, DATA_SUFFIX, MODS_DIR_SUFFIX, USER_SAVES_DIR};

/// The files taken from one source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSet {
    /// Every regular file present in the directory when the backup runs.
    All,
    Named(BTreeSet<String>),
}

impl FileSet {
    /// Builds a named set. Each `.dat` file brings its `.dat.bak` sibling along.
    pub fn named(names: &[&str]) -> Self {
        let mut files = BTreeSet::new();
        for name in names {
            if name.ends_with(DATA_SUFFIX) {
                files.insert(format!("{}{}", name, BACKUP_SUFFIX));
            }
            files.insert(name.to_string());
        }
        FileSet::Named(files)
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            FileSet::All => true,
            FileSet::Named(files) => files.contains(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Absolute live directory.
    pub source_dir: PathBuf,
    /// Directory inside the archive, relative to its root.
    pub archive_dir: PathBuf,
    pub files: FileSet,
}

/// Ordered table of catalog entries for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCatalog {
    entries: Vec<CatalogEntry>,
}

impl PathCatalog {
    pub fn build(game: &str, dirs: &GameDirs) -> Self {
        let game_dir = PathBuf::from(game);
        let mods_dir = PathBuf::from(format!("{} {}", game, MODS_DIR_SUFFIX));
        let save_dir = Path::new(USER_SAVES_DIR).join(game);

        let entry = |source_dir: PathBuf, archive_dir: PathBuf, files: FileSet| CatalogEntry {
            source_dir,
            archive_dir,
            files,
        };

        let entries = vec![
            entry(
                dirs.app_dir.clone(),
                game_dir.join("Mopy"),
                FileSet::named(&[APP_INI]),
            ),
            entry(
                dirs.mods_dir.join("Bash"),
                game_dir.join("Data").join("Bash"),
                FileSet::named(&["Table.dat"]),
            ),
            entry(
                dirs.mods_dir.join("Docs"),
                game_dir.join("Data").join("Docs"),
                FileSet::named(&[
                    "Bash Readme Template.txt",
                    "Bash Readme Template.html",
                    "My Readme Template.txt",
                    "My Readme Template.html",
                    "wtxt_sand_small.css",
                    "wtxt_teal.css",
                ]),
            ),
            entry(
                dirs.mods_bash_dir.clone(),
                mods_dir.join("Bash Mod Data"),
                FileSet::named(&["Table.dat"]),
            ),
            entry(
                dirs.mods_bash_dir.join("INI Data"),
                mods_dir.join("Bash Mod Data").join("INI Data"),
                FileSet::named(&["Table.dat"]),
            ),
            entry(
                dirs.installers_data_dir.clone(),
                mods_dir.join("Bash Installers").join("Bash"),
                FileSet::named(&["Converters.dat", "Installers.dat"]),
            ),
            entry(
                dirs.save_base.clone(),
                save_dir,
                FileSet::named(&[
                    "BashProfiles.dat",
                    "BashSettings.dat",
                    "BashLoadOrders.dat",
                    "People.dat",
                ]),
            ),
            entry(
                dirs.l10n_dir.clone(),
                game_dir.join("Mopy").join("bash").join("l10n"),
                FileSet::All,
            ),
            entry(
                dirs.mods_dir.join("Bash Patches"),
                game_dir.join("Data").join("Bash Patches"),
                FileSet::All,
            ),
            entry(
                dirs.mods_dir.join("INI Tweaks"),
                game_dir.join("Data").join("INI Tweaks"),
                FileSet::All,
            ),
        ];

        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Checks that no archive directory is claimed by two different source directories.
    pub fn validate(&self) -> Result<()> {
        let mut claimed: HashMap<&Path, &Path> = HashMap::new();
        for entry in &self.entries {
            match claimed.insert(&entry.archive_dir, &entry.source_dir) {
                Some(previous) if previous != entry.source_dir.as_path() => {
                    return Err(RollbackError::Config(format!(
                        "archive directory {} is used by both {} and {}",
                        entry.archive_dir.display(),
                        previous.display(),
                        entry.source_dir.display()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
