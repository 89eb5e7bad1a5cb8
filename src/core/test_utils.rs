use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use walkdir::WalkDir;
use crate::archive::TarGzTool;
use crate::fs::TempFileManager;
use crate::settings::SettingsStore;
use super::api::RollbackApi;
use super::catalog::PathCatalog;
use super::config::RollbackConfig;

/// A throwaway game install and documents folder, plus a private staging base.
///
/// Layout below [`TestFixture::root`]:
/// `live/Games/Oblivion` (game root), `live/Documents` (personal root) and `staging`.
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub config: RollbackConfig,
    pub temp_manager: TempFileManager,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create fixture directory");
        let live = temp_dir.path().join("live");
        let config = RollbackConfig::builder()
            .game("Oblivion")
            .game_root(live.join("Games").join("Oblivion"))
            .personal_root(live.join("Documents"))
            .build()
            .expect("Failed to build fixture config");
        let temp_manager = TempFileManager::with_base(
            temp_dir.path().join("staging"),
            Duration::from_secs(24 * 3600),
        );

        Self {
            temp_dir,
            config,
            temp_manager,
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Everything a backup may read from or a restore may write to.
    pub fn live_root(&self) -> PathBuf {
        self.root().join("live")
    }

    pub fn game(&self) -> &str {
        self.config.game()
    }

    pub fn catalog(&self) -> PathCatalog {
        PathCatalog::build(self.game(), self.config.dirs())
    }

    /// Writes `content` to `path`, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>, content: &[u8]) -> PathBuf {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Fills the live tree with one or more files for every catalog entry and
    /// two save profiles, plus some files a backup must leave out.
    pub fn populate(&self) {
        let dirs = self.config.dirs();
        let saves = dirs.saves_dir();

        self.write(dirs.app_dir.join("bash.ini"), b"[General]\nsOblivionMods=..\\Oblivion Mods\n");
        self.write(dirs.mods_dir.join("Bash/Table.dat"), b"data table");
        self.write(dirs.mods_dir.join("Bash/Table.dat.bak"), b"data table, previous");
        self.write(dirs.mods_dir.join("Docs/My Readme Template.txt"), b"= My Mod");
        self.write(dirs.mods_dir.join("Docs/wtxt_teal.css"), b"body {}");
        self.write(dirs.mods_bash_dir.join("Table.dat"), b"mod data table");
        self.write(dirs.mods_bash_dir.join("INI Data/Table.dat"), b"ini table");
        self.write(dirs.installers_data_dir.join("Installers.dat"), b"installers");
        self.write(dirs.installers_data_dir.join("Converters.dat"), b"converters");
        self.write(dirs.save_base.join("BashSettings.dat"), b"settings");
        self.write(dirs.save_base.join("BashLoadOrders.dat"), b"load orders");
        self.write(dirs.l10n_dir.join("German.txt"), b"translations");
        self.write(dirs.mods_dir.join("Bash Patches/Oblivion_Tweaks.csv"), b"tweaks");
        self.write(dirs.mods_dir.join("INI Tweaks/Fast Start.ini"), b"[General]\nbFastStart=1");
        self.write(saves.join("plugins.txt"), b"Oblivion.esm\n");
        self.write(saves.join("Bash/Table.dat"), b"default profile table");
        self.write(saves.join("Knight/loadorder.txt"), b"Oblivion.esm\nKnights.esp\n");
        self.write(saves.join("Knight/Bash/Table.dat"), b"knight table");
        self.write(saves.join("Knight/Bash/Table.dat.bak"), b"knight table, previous");

        self.write(dirs.mods_dir.join("Oblivion.esm"), b"master file");
        self.write(saves.join("Knight/autosave.ess"), b"save game");
    }

    /// An api over this fixture using the in-process archiver. The running release
    /// is the one `store` says last wrote the settings.
    pub fn api(&self, store: impl SettingsStore + 'static) -> RollbackApi {
        let app_version = store.app_version().unwrap_or_else(|| crate::VERSION.to_string());
        RollbackApi::builder()
            .with_config(self.config.clone())
            .with_store(store)
            .with_app_version(app_version)
            .with_archive_tool(TarGzTool::new())
            .with_temp_manager(self.temp_manager.clone())
            .build()
            .expect("Failed to build fixture api")
    }

    /// Relative path and content of every file below `dir`.
    pub fn snapshot(&self, dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(dir).ok()?.to_path_buf();
                let content = fs::read(e.path()).ok()?;
                Some((relative, content))
            })
            .collect()
    }

    /// Directories currently present in the staging base.
    pub fn staging_dirs(&self) -> Vec<PathBuf> {
        fs::read_dir(self.temp_manager.temp_base())
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
