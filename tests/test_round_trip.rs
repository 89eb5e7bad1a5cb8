mod common;

use std::fs;
use std::path::PathBuf;
use settings_rollback::core::test_utils::TestFixture;
use settings_rollback::core::{RestorePolicy, RollbackOps};
use settings_rollback::settings::{JsonSettingsStore, MemorySettingsStore, SettingsStore};

fn not_backed_up() -> Vec<PathBuf> {
    vec![
        PathBuf::from("Games/Oblivion/Data/Oblivion.esm"),
        PathBuf::from("Documents/My Games/Oblivion/Saves/Knight/autosave.ess"),
    ]
}

#[test]
fn test_restore_recreates_deleted_tree() {
    common::setup();
    let fixture = TestFixture::new();
    fixture.populate();
    let mut expected = fixture.snapshot(&fixture.live_root());
    for path in not_backed_up() {
        assert!(expected.remove(&path).is_some(), "{} missing from fixture", path.display());
    }

    let mut api = fixture.api(MemorySettingsStore::new(307, "307"));
    let archive = fixture.root().join("backups/settings.tar.gz");
    let backup = api.backup(&archive).unwrap();

    fs::remove_dir_all(fixture.live_root()).unwrap();
    let report = api.restore(&archive, RestorePolicy::Strict).unwrap();

    assert_eq!(report.game, "Oblivion");
    assert_eq!(report.files_restored, backup.file_count);
    assert_eq!(report.previous_ini, None);
    assert_eq!(fixture.snapshot(&fixture.live_root()), expected);
}

#[test]
fn test_restore_overwrites_and_sets_ini_aside() {
    common::setup();
    let fixture = TestFixture::new();
    fixture.populate();
    let dirs = fixture.config.dirs().clone();

    let mut api = fixture.api(MemorySettingsStore::new(307, "307"));
    let archive = fixture.root().join("settings.tar.gz");
    api.backup(&archive).unwrap();
    let original_ini = fs::read(dirs.app_dir.join("bash.ini")).unwrap();

    fixture.write(dirs.app_dir.join("bash.ini"), b"[General]\nchanged=1");
    fixture.write(dirs.mods_dir.join("Bash/Table.dat"), b"changed");
    fixture.write(dirs.saves_dir().join("Knight/loadorder.txt"), b"changed");
    fixture.write(dirs.saves_dir().join("Knight/new.txt"), b"kept");

    let report = api.restore(&archive, RestorePolicy::Strict).unwrap();

    assert_eq!(fs::read(dirs.app_dir.join("bash.ini")).unwrap(), original_ini);
    assert_eq!(fs::read(dirs.mods_dir.join("Bash/Table.dat")).unwrap(), b"data table");
    assert_eq!(
        fs::read(dirs.saves_dir().join("Knight/loadorder.txt")).unwrap(),
        b"Oblivion.esm\nKnights.esp\n"
    );
    assert!(dirs.saves_dir().join("Knight/new.txt").is_file());

    let previous = report.previous_ini.unwrap();
    assert_eq!(previous.parent(), Some(dirs.app_dir.as_path()));
    assert_eq!(fs::read(previous).unwrap(), b"[General]\nchanged=1");
}

#[test]
fn test_bak_files_follow_presence() {
    common::setup();
    let fixture = TestFixture::new();
    fixture.populate();

    let mut api = fixture.api(MemorySettingsStore::new(307, "307"));
    let archive = fixture.root().join("settings.tar.gz");
    api.backup(&archive).unwrap();

    let opened = api.open_backup(&archive).unwrap();
    let staged = |relative: &str| opened.staging_path().join(relative).is_file();
    assert!(staged("Oblivion/Data/Bash/Table.dat.bak"));
    assert!(!staged("Oblivion Mods/Bash Mod Data/Table.dat.bak"));
    assert!(staged("My Games/Oblivion/Saves/Knight/Bash/Table.dat.bak"));
    assert!(!staged("My Games/Oblivion/Saves/Bash/Table.dat.bak"));
    assert!(!staged("My Games/Oblivion/Saves/Knight/autosave.ess"));
    assert!(staged("backup.dat"));
}

#[test]
fn test_backup_location_persisted() {
    common::setup();
    let fixture = TestFixture::new();
    fixture.populate();
    let settings_file = fixture.root().join("settings.json");
    fs::write(&settings_file, r#"{"settings-format-version": 307, "application-version": "307"}"#).unwrap();

    let mut api = fixture.api(JsonSettingsStore::load(&settings_file).unwrap());
    let archive = fixture.root().join("out/settings.tar.gz");
    let report = api.backup(&archive).unwrap();

    let reloaded = JsonSettingsStore::load(&settings_file).unwrap();
    assert_eq!(reloaded.last_backup_path(), Some(report.backup_dir));
    assert_eq!(reloaded.settings_version(), 307);
}
