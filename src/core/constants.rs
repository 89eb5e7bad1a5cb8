/// Seconds an external archiver may run before it is killed.
pub const DEFAULT_TIMEOUT: u32 = 300;

pub const DEFAULT_GAME: &str = "Oblivion";

/// Version header written at the root of every backup.
pub const HEADER_FILE: &str = "backup.dat";

/// The application's own ini, set aside before a restore overwrites it.
pub const APP_INI: &str = "bash.ini";

/// Top-level archive directory holding the per-user save data.
pub const USER_SAVES_DIR: &str = "My Games";

/// Suffix of the top-level archive directories holding mod data.
pub const MODS_DIR_SUFFIX: &str = "Mods";

pub const SAVES_DIR: &str = "Saves";

/// Settings store used when none is given, kept in the save base.
pub const SETTINGS_FILE: &str = "settings_rollback.json";

/// Directory of a save profile holding its table file.
pub const PROFILE_DATA_DIR: &str = "Bash";
pub const PROFILE_TABLE: &str = "Table.dat";
pub const PROFILE_TEXT_FILES: &[&str] = &["plugins.txt", "loadorder.txt"];

pub const DATA_SUFFIX: &str = ".dat";
pub const BACKUP_SUFFIX: &str = ".bak";

/// chrono format used in generated file names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H.%M.%S";
