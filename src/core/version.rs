//! Version header stored in every backup, and the checks run against it on restore.
//!
//! Two different versions are involved and must not be confused:
//! the *settings-format version* (an integer schema number of the settings files)
//! and the *application version* (the release string of the program).
//! A backup whose settings-format version is newer than the running one cannot be
//! restored. A backup made by a different application release only warrants a warning.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crate::error::types::{FileSystemError, Result, RollbackError};
use crate::settings::SettingsStore;
use super::constants::HEADER_FILE;

/// Upper bound for the stored application version string.
const MAX_VERSION_LEN: u32 = 1024;

/// The two values recorded at the start of `backup.dat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHeader {
    /// Settings-format version the backed up settings were created with.
    pub settings_version: u32,
    /// Application version that wrote the backup.
    pub app_version: String,
}

impl VersionHeader {
    pub fn new(settings_version: u32, app_version: impl Into<String>) -> Self {
        Self {
            settings_version,
            app_version: app_version.into(),
        }
    }

    /// Fails with `InvalidHeader` for a header [`read_from`](Self::read_from) would reject.
    pub fn check(&self) -> Result<()> {
        let len = self.app_version.len();
        if len > MAX_VERSION_LEN as usize {
            return Err(RollbackError::InvalidHeader(format!(
                "application version is {} bytes long",
                len
            )));
        }
        Ok(())
    }

    /// Writes `settings_version` as u32 LE, then the app version as u32 LE byte length plus UTF-8.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        self.check()?;
        let write_error = |e: std::io::Error| RollbackError::InvalidHeader(e.to_string());

        out.write_u32::<LittleEndian>(self.settings_version).map_err(write_error)?;
        out.write_u32::<LittleEndian>(self.app_version.len() as u32).map_err(write_error)?;
        out.write_all(self.app_version.as_bytes()).map_err(write_error)?;
        Ok(())
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        let truncated = |e: std::io::Error| RollbackError::InvalidHeader(e.to_string());

        let settings_version = input.read_u32::<LittleEndian>().map_err(truncated)?;
        let len = input.read_u32::<LittleEndian>().map_err(truncated)?;
        if len > MAX_VERSION_LEN {
            return Err(RollbackError::InvalidHeader(format!(
                "application version is {} bytes long",
                len
            )));
        }

        let mut bytes = vec![0u8; len as usize];
        input.read_exact(&mut bytes).map_err(truncated)?;
        let app_version = String::from_utf8(bytes)
            .map_err(|_| RollbackError::InvalidHeader("application version is not UTF-8".to_string()))?;

        Ok(Self {
            settings_version,
            app_version,
        })
    }

    /// Writes the header file into the root of `dir`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(HEADER_FILE);
        let write_error = |e: std::io::Error| FileSystemError::WriteFile {
            path: path.clone(),
            reason: e.to_string(),
        };

        let mut bytes = Vec::with_capacity(8 + self.app_version.len());
        self.write_to(&mut bytes)?;

        let mut out = BufWriter::new(File::create(&path).map_err(write_error)?);
        out.write_all(&bytes).map_err(write_error)?;
        out.flush().map_err(write_error)?;
        Ok(())
    }

    /// Reads the header file from the root of `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(HEADER_FILE);
        let file = File::open(&path)
            .map_err(|e| FileSystemError::ReadFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        Self::read_from(&mut BufReader::new(file))
    }
}

/// The live settings format and the running release, compared against a backup's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub settings_version: u32,
    pub app_version: String,
}

impl VersionInfo {
    pub fn new(settings_version: u32, app_version: impl Into<String>) -> Self {
        Self {
            settings_version,
            app_version: app_version.into(),
        }
    }

    /// The live settings format from `store`, paired with the running release.
    pub fn from_store(store: &dyn SettingsStore, running_app_version: &str) -> Self {
        Self {
            settings_version: store.settings_version(),
            app_version: running_app_version.to_string(),
        }
    }

    /// The header a backup taken now would carry.
    pub fn header(&self) -> VersionHeader {
        VersionHeader::new(self.settings_version, self.app_version.clone())
    }

    /// Whether settings last written by `previous_app_version` should be backed up
    /// before this release overwrites them. A fresh install has nothing to save.
    pub fn needs_upgrade_backup(&self, previous_app_version: Option<&str>) -> bool {
        self.settings_version != 0 && previous_app_version != Some(self.app_version.as_str())
    }
}

/// Why a backup should not, or should only hesitantly, be restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityIssue {
    /// The backup uses a newer settings format than this build understands. Blocking.
    FormatTooNew { backup: u32, current: u32 },
    /// The backup belongs to another game. Blocking.
    GameMismatch { backup_game: String, current_game: String },
    /// The backup was written by a different application release. Warning only.
    VersionMismatch { backup: String, current: String },
}

impl CompatibilityIssue {
    pub fn is_blocking(&self) -> bool {
        !matches!(self, CompatibilityIssue::VersionMismatch { .. })
    }

    pub fn title(&self) -> &'static str {
        match self {
            CompatibilityIssue::FormatTooNew { .. } => "Error: Settings are from newer version",
            CompatibilityIssue::GameMismatch { .. } => "Error: Settings are from a different game",
            CompatibilityIssue::VersionMismatch { .. } => "Warning: Version Mismatch!",
        }
    }

    pub fn message(&self) -> String {
        match self {
            CompatibilityIssue::FormatTooNew { backup, current } => [
                "The data format of the selected backup file is newer than the current version!".to_string(),
                format!("Backup v{} is not compatible with v{}", backup, current),
                String::new(),
                "You cannot use this backup with this version.".to_string(),
            ]
            .join("\n"),
            CompatibilityIssue::GameMismatch { backup_game, current_game } => [
                format!(
                    "The selected backup file is for {} while your current game is {}",
                    backup_game, current_game
                ),
                "You cannot use this backup with this game.".to_string(),
            ]
            .join("\n"),
            CompatibilityIssue::VersionMismatch { backup, current } => [
                "The version used to create the selected backup file does not match the current version!".to_string(),
                format!("Backup v{} does not match v{}", backup, current),
                String::new(),
                "Do you want to restore this backup anyway?".to_string(),
            ]
            .join("\n"),
        }
    }
}

impl fmt::Display for CompatibilityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.title(), self.message())
    }
}

/// Blocking check on the settings format alone.
pub fn format_issue(header: &VersionHeader, current: &VersionInfo) -> Option<CompatibilityIssue> {
    (header.settings_version > current.settings_version).then(|| CompatibilityIssue::FormatTooNew {
        backup: header.settings_version,
        current: current.settings_version,
    })
}

/// Blocking check on the game a backup was made for.
pub fn game_issue(backup_game: &str, current_game: &str) -> Option<CompatibilityIssue> {
    (backup_game != current_game).then(|| CompatibilityIssue::GameMismatch {
        backup_game: backup_game.to_string(),
        current_game: current_game.to_string(),
    })
}

/// Non-blocking check on the application release that wrote a backup.
pub fn version_warning(header: &VersionHeader, current: &VersionInfo) -> Option<CompatibilityIssue> {
    (header.app_version != current.app_version).then(|| CompatibilityIssue::VersionMismatch {
        backup: header.app_version.clone(),
        current: current.app_version.clone(),
    })
}
