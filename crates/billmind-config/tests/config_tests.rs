use billmind_config::{Config, ConfigError, ConfigManager};
use tempfile::tempdir;

#[test]
fn missing_config_loads_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let cfg = manager.load().expect("load defaults");

    assert_eq!(cfg, Config::default());
    assert!(!manager.config_path().exists());
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"), dir.path().join("backups"));

    let mut cfg = Config::default();
    cfg.currency = "USD".to_string();
    cfg.time_zone = "America/New_York".to_string();
    cfg.reminder_days = 3;

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert!(!dir.path().join("config.json.tmp").exists());
}

#[test]
fn saving_invalid_zone_is_refused() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    let cfg = Config {
        time_zone: "Nowhere/Special".into(),
        ..Config::default()
    };

    assert!(matches!(manager.save(&cfg), Err(ConfigError::InvalidTimeZone(_))));
    assert!(!manager.config_path().exists());
}

#[test]
fn update_applies_change_and_saves() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    manager
        .update(|cfg| cfg.ui_color_enabled = false)
        .expect("update");

    assert!(!manager.load().expect("reload").ui_color_enabled);
}

#[test]
fn backups_can_be_listed_and_restored() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let original = Config {
        currency: "EUR".into(),
        ..Config::default()
    };
    let backup = manager.backup(&original, Some("Before move")).expect("backup");
    assert!(backup.name.starts_with("config-"));
    assert!(backup.name.ends_with("-before-move.json"));
    assert!(backup.created_at.is_some());

    manager.save(&Config::default()).expect("save defaults");
    let listed = manager.list_backups().expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, backup.name);

    let restored = manager.restore(&backup.name).expect("restore");
    assert_eq!(restored.currency, "EUR");
    assert_eq!(manager.load().expect("load").currency, "EUR");

    assert!(matches!(
        manager.restore("config-missing.json"),
        Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound
    ));
}

#[test]
fn same_second_backups_do_not_overwrite() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let first = Config {
        currency: "EUR".into(),
        ..Config::default()
    };
    let second = Config {
        currency: "USD".into(),
        ..Config::default()
    };
    let names: Vec<String> = (0..3)
        .map(|idx| {
            let cfg = if idx == 0 { &first } else { &second };
            manager.backup(cfg, Some("snap")).expect("backup").name
        })
        .collect();

    assert_eq!(manager.list_backups().expect("list").len(), 3);
    assert_ne!(names[0], names[1]);
    assert_ne!(names[1], names[2]);
    assert_eq!(manager.restore(&names[0]).expect("restore").currency, "EUR");
}

#[test]
fn restore_refuses_paths_outside_backups() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    manager.save(&Config::default()).expect("save");

    assert!(matches!(
        manager.restore("../config.json"),
        Err(ConfigError::Invalid(_))
    ));
}
