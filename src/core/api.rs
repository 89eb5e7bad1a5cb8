use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use chrono::Local;
use log::{debug, info, warn};
use crate::archive::{tool_for_path, ArchiveTool};
use crate::error::types::{Result, RollbackError};
use crate::fs::TempFileManager;
use crate::settings::{MemorySettingsStore, SettingsStore};
use super::backup::{self, BackupReport, BackupSettings};
use super::catalog::PathCatalog;
use super::config::RollbackConfig;
use super::constants::DEFAULT_TIMEOUT;
use super::manifest::BackupManifest;
use super::restore::{RestoreReport, RestoreSettings};
use super::version::VersionInfo;

/// How a restore treats a backup written by a different application release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestorePolicy {
    /// Refuse with [`RollbackError::Incompatible`].
    #[default]
    Strict,
    /// Log the mismatch and restore anyway.
    Lenient,
}

/// Backup and restore operations for the configured game.
///
/// # Examples
///
/// ```no_run
/// use settings_rollback::core::{RollbackApi, RollbackConfig, RollbackOps, RestorePolicy};
/// use std::path::Path;
///
/// let config = RollbackConfig::builder()
///     .game_root("/games/Oblivion")
///     .personal_root("/home/player/Documents")
///     .build()
///     .unwrap();
/// let mut api = RollbackApi::builder().with_config(config).build().unwrap();
///
/// api.backup(Path::new("/backups/settings.7z")).unwrap();
/// api.restore(Path::new("/backups/settings.7z"), RestorePolicy::Strict).unwrap();
/// ```
pub trait RollbackOps {
    /// Name of the game whose settings are managed.
    fn game(&self) -> &str;

    /// Writes every cataloged file that exists, plus the version header, into `archive_path`.
    fn backup(&mut self, archive_path: &Path) -> Result<BackupReport>;

    /// Extracts a backup archive, or takes a backup directory as it is, for inspection.
    fn open_backup(&self, backup_path: &Path) -> Result<RestoreSettings>;

    /// Copies an opened backup over the live files. No compatibility checks are made.
    fn apply_restore(&self, restore: &RestoreSettings) -> Result<RestoreReport>;

    /// Opens, checks and applies a backup in one go.
    fn restore(&self, backup_path: &Path, policy: RestorePolicy) -> Result<RestoreReport> {
        let restore = self.open_backup(backup_path)?;

        if let Some(issue) = restore.incompatibility_error(self.game())? {
            return Err(RollbackError::Incompatible(issue));
        }
        if let Some(issue) = restore.incompatibility_warning()? {
            match policy {
                RestorePolicy::Strict => return Err(RollbackError::Incompatible(issue)),
                RestorePolicy::Lenient => warn!("{}", issue),
            }
        }

        self.apply_restore(&restore)
    }
}

#[derive(Debug)]
pub struct RollbackApi {
    config: Arc<RollbackConfig>,
    store: Box<dyn SettingsStore>,
    archive_tool: Option<Box<dyn ArchiveTool>>,
    temp_manager: TempFileManager,
    timeout: Duration,
    app_version: String,
}

impl RollbackApi {
    pub fn builder() -> RollbackApiBuilder {
        RollbackApiBuilder::new()
    }

    pub fn new(config: RollbackConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Box::new(MemorySettingsStore::default()),
            archive_tool: None,
            temp_manager: TempFileManager::new(),
            timeout: Duration::from_secs(u64::from(DEFAULT_TIMEOUT)),
            app_version: crate::VERSION.to_string(),
        }
    }

    pub fn config(&self) -> &RollbackConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    pub fn temp_manager(&self) -> &TempFileManager {
        &self.temp_manager
    }

    pub fn catalog(&self) -> PathCatalog {
        PathCatalog::build(self.config.game(), self.config.dirs())
    }

    /// Release of the running application, written into every backup.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Settings format of the live settings and the running release.
    pub fn versions(&self) -> VersionInfo {
        VersionInfo::from_store(self.store.as_ref(), &self.app_version)
    }

    /// Whether the live settings come from another release and should be backed up
    /// before this one starts using them.
    pub fn needs_upgrade_backup(&self) -> bool {
        self.versions()
            .needs_upgrade_backup(self.store.app_version().as_deref())
    }

    pub fn default_backup_filename(&self) -> String {
        backup::default_backup_filename(self.config.game(), &self.versions(), &Local::now())
    }

    /// Directory of the last successful backup, to start a file dialog in.
    pub fn last_backup_path(&self) -> Option<PathBuf> {
        self.store.last_backup_path()
    }

    fn archive_tool_for(&self, archive: &Path) -> Box<dyn ArchiveTool> {
        match &self.archive_tool {
            Some(tool) => tool.clone(),
            None => tool_for_path(archive, self.timeout),
        }
    }
}

impl RollbackOps for RollbackApi {
    fn game(&self) -> &str {
        self.config.game()
    }

    fn backup(&mut self, archive_path: &Path) -> Result<BackupReport> {
        info!("Backing up {} settings to {}", self.game(), archive_path.display());

        let catalog = self.catalog();
        catalog.validate()?;
        let manifest = BackupManifest::build(&catalog, self.game(), self.config.dirs())?;

        let tool = self.archive_tool_for(archive_path);
        let report = BackupSettings::new(archive_path, manifest)
            .backup_settings(&self.temp_manager, tool.as_ref(), &self.versions().header())?;

        self.store.set_last_backup_path(&report.backup_dir)?;
        info!("Backed up {} files to {}", report.file_count, report.archive_path.display());
        Ok(report)
    }

    fn open_backup(&self, backup_path: &Path) -> Result<RestoreSettings> {
        let tool = self.archive_tool_for(backup_path);
        RestoreSettings::open(backup_path, self.versions(), &self.temp_manager, tool.as_ref())
    }

    fn apply_restore(&self, restore: &RestoreSettings) -> Result<RestoreReport> {
        debug!("Restoring into {:?}", self.config.dirs());
        restore.restore_settings(self.config.dirs())
    }
}

/// Builder for [`RollbackApi`]. Only the configuration is required.
#[derive(Debug, Default)]
pub struct RollbackApiBuilder {
    config: Option<RollbackConfig>,
    store: Option<Box<dyn SettingsStore>>,
    archive_tool: Option<Box<dyn ArchiveTool>>,
    temp_manager: Option<TempFileManager>,
    temp_base: Option<PathBuf>,
    timeout: Option<Duration>,
    app_version: Option<String>,
}

impl RollbackApiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RollbackConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_store(mut self, store: impl SettingsStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Uses `tool` for every archive instead of choosing one by file extension.
    pub fn with_archive_tool(mut self, tool: impl ArchiveTool + 'static) -> Self {
        self.archive_tool = Some(Box::new(tool));
        self
    }

    /// Time limit for the external archiver.
    pub fn with_timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(Duration::from_secs(u64::from(seconds.max(1))));
        self
    }

    /// Directory below which staging directories are created.
    pub fn with_temp_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_base = Some(path.into());
        self
    }

    pub fn with_temp_manager(mut self, temp_manager: TempFileManager) -> Self {
        self.temp_manager = Some(temp_manager);
        self
    }

    /// Release string of the embedding application. Defaults to this crate's version.
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    pub fn build(self) -> Result<RollbackApi> {
        let config = self.config
            .ok_or_else(|| RollbackError::Config("no game configuration given".to_string()))?;

        let temp_manager = match (self.temp_manager, self.temp_base) {
            (Some(manager), _) => manager,
            (None, Some(base)) => TempFileManager::with_base(base, TempFileManager::new().max_age()),
            (None, None) => TempFileManager::new(),
        };

        let mut api = RollbackApi::new(config);
        api.temp_manager = temp_manager;
        api.archive_tool = self.archive_tool;
        if let Some(store) = self.store {
            api.store = store;
        }
        if let Some(timeout) = self.timeout {
            api.timeout = timeout;
        }
        if let Some(version) = self.app_version {
            api.app_version = version;
        }
        Ok(api)
    }
}
