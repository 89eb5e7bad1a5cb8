use std::io::{BufRead, Write};
use std::path::Path;
use log::{info, warn};
use crate::core::api::{RestorePolicy, RollbackOps};
use crate::core::backup::BackupReport;
use crate::core::restore::RestoreReport;
use crate::core::version::CompatibilityIssue;
use crate::error::types::{Result, RollbackError};

pub fn backup(api: &mut dyn RollbackOps, archive: &Path) -> Result<BackupReport> {
    let report = api.backup(archive)?;
    info!("Backup saved to {}", report.archive_path.display());
    Ok(report)
}

/// Restores `backup_path`, asking `confirm` whether to go on when the backup was
/// written by another release.
///
/// Returns `None` when the user declined.
pub fn restore(
    api: &dyn RollbackOps,
    backup_path: &Path,
    confirm: &mut dyn FnMut(&CompatibilityIssue) -> bool,
) -> Result<Option<RestoreReport>> {
    let restore = api.open_backup(backup_path)?;

    if let Some(issue) = restore.incompatibility_error(api.game())? {
        return Err(RollbackError::Incompatible(issue));
    }
    if let Some(issue) = restore.incompatibility_warning()? {
        if !confirm(&issue) {
            warn!("Restore of {} canceled", backup_path.display());
            return Ok(None);
        }
    }

    api.apply_restore(&restore).map(Some)
}

/// Restores `backup_path` without asking anything.
pub fn restore_quietly(api: &dyn RollbackOps, backup_path: &Path) -> Result<RestoreReport> {
    api.restore(backup_path, RestorePolicy::Lenient)
}

/// Shows `issue` on `output` and reads a yes/no answer from `input`. Anything but
/// an answer starting with `y` counts as no.
pub fn ask_to_continue<R: BufRead, W: Write>(issue: &CompatibilityIssue, input: &mut R, output: &mut W) -> bool {
    if writeln!(output, "{}\n{}\n[y/N] ", issue.title(), issue.message())
        .and_then(|_| output.flush())
        .is_err()
    {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => answer.trim_start().to_ascii_lowercase().starts_with('y'),
        Err(_) => false,
    }
}
