use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;
use log::debug;
use tempfile::TempPath;
use crate::error::types::{ArchiveError, Result};
use crate::fs::FileOperation;
use super::seven_zip::SevenZipTool;
use super::tar_gz::TarGzTool;

/// The two operations backup and restore need from an archiver.
///
/// `compress` produces a single solid archive at `dest_archive` or fails without
/// leaving a file there. `extract` unpacks the whole archive into `dest_dir`;
/// after a failure the content of `dest_dir` must not be trusted.
pub trait ArchiveTool: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn compress(&self, source_dir: &Path, dest_archive: &Path) -> Result<()>;
    fn extract(&self, archive: &Path, dest_dir: &Path) -> Result<()>;
    fn clone_box(&self) -> Box<dyn ArchiveTool>;
}

impl Clone for Box<dyn ArchiveTool> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Picks the archiver matching the archive's extension: `.7z` goes to the external
/// 7-Zip executable, everything else is handled in-process as tar+gzip.
pub fn tool_for_path(archive: &Path, timeout: Duration) -> Box<dyn ArchiveTool> {
    let is_7z = archive
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("7z"));

    if is_7z {
        debug!("Using 7z for {}", archive.display());
        Box::new(SevenZipTool::new().with_timeout(timeout))
    } else {
        debug!("Using tar.gz for {}", archive.display());
        Box::new(TarGzTool::new())
    }
}

/// Reserves a path next to `dest` for the archive being written.
///
/// Nothing exists at the returned path yet. Dropping it removes whatever was
/// written there; `TempPath::persist` moves the finished archive onto `dest`.
pub(crate) fn partial_archive_path(dest: &Path) -> Result<TempPath> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.ensure_directory()?;

    let suffix = dest
        .extension()
        .map(|ext| format!(".partial.{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".partial".to_string());

    let temp_path = tempfile::Builder::new()
        .prefix(".settings_rollback")
        .suffix(&suffix)
        .tempfile_in(parent)
        .map_err(|e| ArchiveError::Io {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?
        .into_temp_path();

    std::fs::remove_file(&temp_path)
        .map_err(|e| ArchiveError::Io {
            path: temp_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(temp_path)
}

/// Moves a finished archive into place.
pub(crate) fn persist_archive(partial: TempPath, dest: &Path) -> Result<()> {
    partial.persist(dest)
        .map_err(|e| ArchiveError::Io {
            path: dest.to_path_buf(),
            reason: e.error.to_string(),
        })?;
    Ok(())
}
