pub mod args;
pub mod commands;

use std::io;
use log::{debug, error, info};
use crate::core::api::{RollbackApi, RollbackOps};
use crate::core::config::RollbackConfig;
use crate::error::types::{Result, RollbackError};
use crate::settings::JsonSettingsStore;
use self::args::{Cli, Operation};

const BACKUP_FAILED: &str = "There was an error while trying to backup the settings!\nNo backup was created.";
const RESTORE_FAILED: &str = "There was an error while trying to restore your settings from the backup file!\nNo settings were restored.";

/// Runs the operation requested on the command line against a configured api.
pub struct CliProcessor {
    api: RollbackApi,
    quiet: bool,
}

impl CliProcessor {
    pub fn new(api: RollbackApi, quiet: bool) -> Self {
        Self { api, quiet }
    }

    /// Builds the game configuration and settings store the arguments describe.
    pub fn from_args(cli: &Cli) -> Result<Self> {
        cli.validate()?;

        let mut config = RollbackConfig::builder().game_root(cli.game_root()?);
        if let Some(game) = &cli.game {
            config = config.game(game.clone());
        }
        if let Some(personal) = &cli.personal_path {
            config = config.personal_root(personal.clone());
        }
        if let Some(user) = cli.user_root() {
            config = config.user_root(user);
        }
        let config = config.build()?;
        debug!("Using {:?}", config);

        let settings = cli
            .settings
            .clone()
            .unwrap_or_else(|| config.dirs().settings_file());
        debug!("Using settings from {}", settings.display());
        let api = RollbackApi::builder()
            .with_store(JsonSettingsStore::load(settings)?)
            .with_config(config)
            .with_timeout(cli.timeout)
            .build()?;

        Ok(Self::new(api, cli.quiet_quit))
    }

    pub fn api(&self) -> &RollbackApi {
        &self.api
    }

    /// Runs `operation`, printing the outcome unless quiet.
    pub fn process(&mut self, operation: Option<Operation>) -> Result<()> {
        debug!("Processing operation: {:?}", operation);
        match operation {
            Some(Operation::Backup(path)) => match commands::backup(&mut self.api, &path) {
                Ok(report) => {
                    self.say(&format!("Backup saved to {}", report.archive_path.display()));
                    Ok(())
                }
                Err(e) => {
                    self.fail(BACKUP_FAILED, &e);
                    Err(e)
                }
            },
            Some(Operation::Restore(path)) => {
                let result = if self.quiet {
                    commands::restore_quietly(&self.api, &path).map(Some)
                } else {
                    let stdin = io::stdin();
                    let mut input = stdin.lock();
                    let mut output = io::stdout();
                    commands::restore(&self.api, &path, &mut |issue| {
                        commands::ask_to_continue(issue, &mut input, &mut output)
                    })
                };

                match result {
                    Ok(Some(report)) => {
                        self.say(&format!(
                            "Restored {} files for {} from {}",
                            report.files_restored,
                            report.game,
                            path.display()
                        ));
                        if let Some(previous) = &report.previous_ini {
                            self.say(&format!("Your previous bash.ini was saved as {}", previous.display()));
                        }
                        Ok(())
                    }
                    Ok(None) => {
                        self.say("No settings were restored.");
                        Ok(())
                    }
                    Err(e) => {
                        self.fail(RESTORE_FAILED, &e);
                        Err(e)
                    }
                }
            }
            None => {
                if self.api.needs_upgrade_backup() {
                    self.say(&format!(
                        "Settings from a previous version were found. Consider a backup first, e.g. -b -f \"{}\"",
                        self.api.default_backup_filename()
                    ));
                } else if let Some(dir) = self.api.last_backup_path() {
                    info!("Last backup was saved in {}", dir.display());
                }
                Ok(())
            }
        }
    }

    fn say(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    fn fail(&self, message: &str, e: &RollbackError) {
        error!("{}", e);
        if !self.quiet {
            if e.is_incompatibility() {
                eprintln!("{}", e);
            }
            eprintln!("{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_utils::TestFixture;
    use crate::settings::{MemorySettingsStore, SettingsStore};

    #[test]
    fn test_backup_then_quiet_restore() {
        let fixture = TestFixture::new();
        fixture.populate();
        let archive = fixture.root().join("settings.tar.gz");

        let mut processor = CliProcessor::new(fixture.api(MemorySettingsStore::new(307, "307")), true);
        processor.process(Some(Operation::Backup(archive.clone()))).unwrap();
        assert!(archive.is_file());

        std::fs::remove_file(fixture.config.dirs().mods_dir.join("Bash/Table.dat")).unwrap();
        processor.process(Some(Operation::Restore(archive))).unwrap();
        assert!(fixture.config.dirs().mods_dir.join("Bash/Table.dat").is_file());
    }

    #[test]
    fn test_failed_restore_is_reported() {
        let fixture = TestFixture::new();
        let mut processor = CliProcessor::new(fixture.api(MemorySettingsStore::default()), true);
        let result = processor.process(Some(Operation::Restore(fixture.root().join("missing.7z"))));
        assert!(matches!(result, Err(RollbackError::InvalidLocation(_))));
    }

    #[test]
    fn test_from_args_validates_first() {
        let temp = tempfile::tempdir().unwrap();
        let existing = temp.path().join("taken.7z");
        std::fs::write(&existing, b"").unwrap();
        let cli = <Cli as clap::Parser>::try_parse_from([
            "settings_rollback",
            "-b",
            "-f",
            existing.to_str().unwrap(),
            "-o",
            temp.path().to_str().unwrap(),
            "-p",
            temp.path().to_str().unwrap(),
        ])
        .unwrap();

        assert!(matches!(CliProcessor::from_args(&cli), Err(RollbackError::Config(_))));
    }

    #[test]
    fn test_from_args_builds_config() {
        let temp = tempfile::tempdir().unwrap();
        let game_root = temp.path().join("Games/Skyrim");
        let cli = <Cli as clap::Parser>::try_parse_from([
            "settings_rollback",
            "-g",
            "Skyrim",
            "-o",
            game_root.to_str().unwrap(),
            "-u",
            temp.path().to_str().unwrap(),
        ])
        .unwrap();

        let processor = CliProcessor::from_args(&cli).unwrap();
        let config = processor.api().config();
        assert_eq!(config.game(), "Skyrim");
        assert_eq!(config.dirs().app_dir, game_root.join("Mopy"));
        assert_eq!(config.dirs().save_base, temp.path().join("Documents/My Games/Skyrim"));
        assert_eq!(processor.api().store().settings_version(), 0);
        assert!(!config.dirs().settings_file().exists());
    }
}
