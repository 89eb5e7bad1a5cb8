use std::path::{Path, PathBuf};
use crate::error::types::{Result, RollbackError};
use super::constants::{DEFAULT_GAME, MODS_DIR_SUFFIX, USER_SAVES_DIR};

/// The live directories whose files take part in a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDirs {
    /// Application install directory (`Mopy`).
    pub app_dir: PathBuf,
    /// The game's `Data` directory.
    pub mods_dir: PathBuf,
    /// `<game> Mods/Bash Mod Data`, next to the game install.
    pub mods_bash_dir: PathBuf,
    /// `<game> Mods/Bash Installers/Bash`, next to the game install.
    pub installers_data_dir: PathBuf,
    /// `My Games/<game>` in the user's documents.
    pub save_base: PathBuf,
    /// Translation files shipped with the application.
    pub l10n_dir: PathBuf,
}

impl GameDirs {
    /// Derives the standard layout from the game install directory and the
    /// user's personal (documents) directory.
    pub fn from_roots(game: &str, game_root: &Path, personal_root: &Path) -> Self {
        let app_dir = game_root.join("Mopy");
        let mods_root = game_root
            .parent()
            .unwrap_or(game_root)
            .join(format!("{} {}", game, MODS_DIR_SUFFIX));

        Self {
            l10n_dir: app_dir.join("bash").join("l10n"),
            app_dir,
            mods_dir: game_root.join("Data"),
            mods_bash_dir: mods_root.join("Bash Mod Data"),
            installers_data_dir: mods_root.join("Bash Installers").join("Bash"),
            save_base: personal_root.join(USER_SAVES_DIR).join(game),
        }
    }

    /// Root of the live save tree.
    pub fn saves_dir(&self) -> PathBuf {
        self.save_base.join(super::constants::SAVES_DIR)
    }

    /// The persisted settings file used when no other is configured.
    pub fn settings_file(&self) -> PathBuf {
        self.save_base.join(super::constants::SETTINGS_FILE)
    }
}

/// Which game is being managed and where its files live.
#[derive(Debug, Clone)]
pub struct RollbackConfig {
    game: String,
    dirs: GameDirs,
}

impl RollbackConfig {
    pub fn new(game: impl Into<String>, dirs: GameDirs) -> Self {
        Self {
            game: game.into(),
            dirs,
        }
    }

    pub fn builder() -> RollbackConfigBuilder {
        RollbackConfigBuilder::new()
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn dirs(&self) -> &GameDirs {
        &self.dirs
    }
}

#[derive(Debug, Default)]
pub struct RollbackConfigBuilder {
    game: Option<String>,
    game_root: Option<PathBuf>,
    personal_root: Option<PathBuf>,
    user_root: Option<PathBuf>,
    app_dir: Option<PathBuf>,
    save_base: Option<PathBuf>,
}

impl RollbackConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(mut self, game: impl Into<String>) -> Self {
        self.game = Some(game.into());
        self
    }

    /// Directory containing the game executable.
    pub fn game_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.game_root = Some(path.into());
        self
    }

    /// The user's documents directory, parent of `My Games`.
    pub fn personal_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.personal_root = Some(path.into());
        self
    }

    /// The user's profile directory; `<user>/Documents` is used when no personal root is set.
    pub fn user_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_root = Some(path.into());
        self
    }

    /// Overrides the application directory derived from the game root.
    pub fn app_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.app_dir = Some(path.into());
        self
    }

    /// Overrides the save base derived from the personal root.
    pub fn save_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_base = Some(path.into());
        self
    }

    pub fn build(self) -> Result<RollbackConfig> {
        let game = self.game.unwrap_or_else(|| DEFAULT_GAME.to_string());
        if game.trim().is_empty() {
            return Err(RollbackError::Config("game name cannot be empty".to_string()));
        }

        let game_root = self.game_root
            .ok_or_else(|| RollbackError::Config("game directory is not set".to_string()))?;
        let personal_root = self.personal_root
            .or_else(|| self.user_root.map(|user| user.join("Documents")))
            .ok_or_else(|| RollbackError::Config("personal directory is not set".to_string()))?;

        if !game_root.is_absolute() || !personal_root.is_absolute() {
            return Err(RollbackError::Config(format!(
                "directories must be absolute: {}, {}",
                game_root.display(),
                personal_root.display()
            )));
        }

        let mut dirs = GameDirs::from_roots(&game, &game_root, &personal_root);
        if let Some(app_dir) = self.app_dir {
            dirs.l10n_dir = app_dir.join("bash").join("l10n");
            dirs.app_dir = app_dir;
        }
        if let Some(save_base) = self.save_base {
            dirs.save_base = save_base;
        }

        Ok(RollbackConfig::new(game, dirs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(path: &str) -> PathBuf {
        std::env::temp_dir().join(path)
    }

    #[test]
    fn test_layout_from_roots() {
        let dirs = GameDirs::from_roots("Oblivion", &abs("Games/Oblivion"), &abs("Docs"));

        assert_eq!(dirs.app_dir, abs("Games/Oblivion/Mopy"));
        assert_eq!(dirs.mods_dir, abs("Games/Oblivion/Data"));
        assert_eq!(dirs.mods_bash_dir, abs("Games/Oblivion Mods/Bash Mod Data"));
        assert_eq!(dirs.installers_data_dir, abs("Games/Oblivion Mods/Bash Installers/Bash"));
        assert_eq!(dirs.save_base, abs("Docs/My Games/Oblivion"));
        assert_eq!(dirs.l10n_dir, abs("Games/Oblivion/Mopy/bash/l10n"));
        assert_eq!(dirs.saves_dir(), abs("Docs/My Games/Oblivion/Saves"));
    }

    #[test]
    fn test_builder_defaults_and_overrides() {
        let config = RollbackConfig::builder()
            .game_root(abs("Games/Skyrim"))
            .user_root(abs("Users/player"))
            .game("Skyrim")
            .app_dir(abs("Apps/Mopy"))
            .build()
            .unwrap();

        assert_eq!(config.game(), "Skyrim");
        assert_eq!(config.dirs().app_dir, abs("Apps/Mopy"));
        assert_eq!(config.dirs().l10n_dir, abs("Apps/Mopy/bash/l10n"));
        assert_eq!(config.dirs().save_base, abs("Users/player/Documents/My Games/Skyrim"));
    }

    #[test]
    fn test_builder_requires_absolute_roots() {
        assert!(RollbackConfig::builder().personal_root(abs("Docs")).build().is_err());
        assert!(RollbackConfig::builder()
            .game_root("relative/game")
            .personal_root(abs("Docs"))
            .build()
            .is_err());

        let config = RollbackConfig::builder()
            .game_root(abs("Games/Oblivion"))
            .personal_root(abs("Docs"))
            .build()
            .unwrap();
        assert_eq!(config.game(), DEFAULT_GAME);
    }
}
