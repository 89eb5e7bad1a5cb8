use std::path::PathBuf;
use thiserror::Error;
use crate::core::version::CompatibilityIssue;

pub type Result<T> = std::result::Result<T, RollbackError>;

#[derive(Error, Debug)]
pub enum RollbackError {
    #[error("{} is not a valid backup location", .0.display())]
    InvalidLocation(PathBuf),

    #[error("{} does not contain a game directory", .0.display())]
    NoGameDir(PathBuf),

    #[error("{}: {}", .0.title(), .0.message())]
    Incompatible(CompatibilityIssue),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    #[error("Invalid backup header: {0}")]
    InvalidHeader(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RollbackError {
    /// True for errors raised by the compatibility checks, as opposed to I/O or tool failures.
    pub fn is_incompatibility(&self) -> bool {
        matches!(self, RollbackError::Incompatible(_))
    }
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Command failed: {cmd} - {reason}")]
    CommandFailed {
        cmd: String,
        reason: String,
    },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u32),

    #[error("Archive I/O failed for {}: {reason}", .path.display())]
    Io {
        path: PathBuf,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum FileSystemError {
    #[error("Failed to create directory {}: {reason}", .path.display())]
    CreateDir {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to copy {} to {}: {reason}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Failed to rename {} to {}: {reason}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Failed to read file {}: {reason}", .path.display())]
    ReadFile {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to write file {}: {reason}", .path.display())]
    WriteFile {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to list directory {}: {reason}", .path.display())]
    ListDir {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to remove directory {}: {reason}", .path.display())]
    RemoveDir {
        path: PathBuf,
        reason: String,
    },

    #[error("Failed to remove file {}: {reason}", .path.display())]
    RemoveFile {
        path: PathBuf,
        reason: String,
    },
}
