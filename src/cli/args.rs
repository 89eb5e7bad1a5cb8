use std::path::PathBuf;
use clap::Parser;
use crate::core::constants::DEFAULT_TIMEOUT;
use crate::error::types::{Result, RollbackError};

/// Backup or restore the settings of the mod manager.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Backup all settings to an archive file. The path is given with -f/--filename.
    #[arg(short, long, conflicts_with = "restore", requires = "filename", help_heading = "Backup and Restore")]
    pub backup: bool,

    /// Restore all settings from an archive file or an unpacked backup directory.
    /// The path is given with -f/--filename.
    #[arg(short, long, requires = "filename", help_heading = "Backup and Restore")]
    pub restore: bool,

    /// The file to use with -b or -r. Must not exist for -b and must exist for -r.
    #[arg(short, long, value_name = "PATH", help_heading = "Backup and Restore")]
    pub filename: Option<PathBuf>,

    /// Do not prompt or print messages; exit after the backup or restore.
    #[arg(short, long = "quiet-quit", help_heading = "Backup and Restore")]
    pub quiet_quit: bool,

    /// The game directory, the one containing the game's executable. Must be absolute.
    #[arg(short = 'o', long = "game-path", value_name = "DIR", help_heading = "Paths")]
    pub game_path: Option<PathBuf>,

    /// The user's personal (documents) directory. Must be absolute.
    #[arg(short, long = "personal-path", value_name = "DIR", help_heading = "Paths")]
    pub personal_path: Option<PathBuf>,

    /// The user profile directory; its Documents folder is used when -p is not given.
    #[arg(short, long = "user-path", value_name = "DIR", help_heading = "Paths")]
    pub user_path: Option<PathBuf>,

    /// Name of the game whose settings are handled
    #[arg(short, long)]
    pub game: Option<String>,

    /// JSON file holding the application's persisted settings
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Timeout in seconds for the external archiver
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT)]
    pub timeout: u32,

    /// Print a lot of information
    #[arg(short, long)]
    pub debug: bool,
}

/// The single action requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Backup(PathBuf),
    Restore(PathBuf),
}

impl Cli {
    pub fn operation(&self) -> Option<Operation> {
        let filename = self.filename.clone()?;
        if self.backup {
            Some(Operation::Backup(filename))
        } else if self.restore {
            Some(Operation::Restore(filename))
        } else {
            None
        }
    }

    /// Checks what clap cannot: the backup target must be new, the restore source must exist.
    pub fn validate(&self) -> Result<()> {
        match self.operation() {
            Some(Operation::Backup(path)) if path.exists() => Err(RollbackError::Config(format!(
                "backup file {} already exists",
                path.display()
            ))),
            Some(Operation::Restore(path)) if !path.exists() => Err(RollbackError::Config(format!(
                "backup file {} does not exist",
                path.display()
            ))),
            _ if self.filename.is_some() && !self.backup && !self.restore => Err(RollbackError::Config(
                "--filename needs --backup or --restore".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// The user profile directory from the command line, or else from the environment.
    pub fn user_root(&self) -> Option<PathBuf> {
        self.user_path.clone().or_else(|| {
            std::env::var_os("USERPROFILE")
                .or_else(|| std::env::var_os("HOME"))
                .map(PathBuf::from)
        })
    }

    /// The game directory from the command line, or else the working directory.
    pub fn game_root(&self) -> Result<PathBuf> {
        match &self.game_path {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir()
                .map_err(|e| RollbackError::Config(format!("no game directory given: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("settings_rollback").chain(args.iter().copied()))
    }

    #[test]
    fn test_backup_and_restore_conflict() {
        let err = parse(&["-b", "-r", "-f", "x.7z"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_filename_required() {
        assert_eq!(parse(&["--backup"]).unwrap_err().kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(parse(&["--restore"]).unwrap_err().kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_operation() {
        let cli = parse(&["-b", "-f", "settings.7z", "-q", "-g", "Skyrim"]).unwrap();
        assert_eq!(cli.operation(), Some(Operation::Backup(PathBuf::from("settings.7z"))));
        assert!(cli.quiet_quit);
        assert_eq!(cli.game.as_deref(), Some("Skyrim"));
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT);

        let cli = parse(&["--restore", "--filename", "settings.7z"]).unwrap();
        assert_eq!(cli.operation(), Some(Operation::Restore(PathBuf::from("settings.7z"))));

        assert_eq!(parse(&[]).unwrap().operation(), None);
    }

    #[test]
    fn test_validate_filename() {
        let temp = tempfile::tempdir().unwrap();
        let existing = temp.path().join("old.7z");
        std::fs::write(&existing, b"7z").unwrap();
        let missing = temp.path().join("new.7z");

        let backup_existing = parse(&["-b", "-f", existing.to_str().unwrap()]).unwrap();
        assert!(matches!(backup_existing.validate(), Err(RollbackError::Config(_))));
        parse(&["-b", "-f", missing.to_str().unwrap()]).unwrap().validate().unwrap();

        let restore_missing = parse(&["-r", "-f", missing.to_str().unwrap()]).unwrap();
        assert!(matches!(restore_missing.validate(), Err(RollbackError::Config(_))));
        parse(&["-r", "-f", existing.to_str().unwrap()]).unwrap().validate().unwrap();
        parse(&["-r", "-f", temp.path().to_str().unwrap()]).unwrap().validate().unwrap();

        let orphan = parse(&["-f", missing.to_str().unwrap()]).unwrap();
        assert!(orphan.validate().is_err());
    }
}
