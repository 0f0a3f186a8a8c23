use std::path::PathBuf;

use tally_config::{Config, ConfigError, ConfigManager};
use tally_domain::{NetIncomePolicy, RangeMode, TotalsStyle};
use tempfile::tempdir;

#[test]
fn default_config_uses_always_policy_and_insertion_range() {
    let cfg = Config::default();

    assert!(!cfg.currency.is_empty());
    assert_eq!(cfg.net_income_policy, NetIncomePolicy::Always);
    assert_eq!(cfg.export.range, RangeMode::Insertion);
    assert_eq!(cfg.export.totals_style, TotalsStyle::Formulas);
    assert_eq!(cfg.backup_retention, 5);
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let mut cfg = Config::default();
    cfg.net_income_policy = NetIncomePolicy::OnAdd;
    cfg.export.range = RangeMode::Chronological;
    cfg.data_root = Some(PathBuf::from("/srv/tally"));

    manager.save(&cfg).expect("save config");
    let loaded = manager.load().expect("load config");

    assert_eq!(loaded, cfg);
    assert_eq!(loaded.resolve_data_root(), PathBuf::from("/srv/tally"));
}

#[test]
fn sparse_config_files_fill_in_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    std::fs::write(
        manager.config_path(),
        r#"{"locale":"en-US","currency":"USD","net_income_policy":"manual"}"#,
    )
    .expect("write config");

    let loaded = manager.load().expect("load");
    assert_eq!(loaded.net_income_policy, NetIncomePolicy::Manual);
    assert_eq!(loaded.export.file_name, "finance_report.csv");
    assert!(loaded.ui_color_enabled);
}

#[test]
fn backups_can_be_listed_and_restored() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    let mut cfg = Config::default();
    cfg.currency = "USD".into();

    let name = manager.backup(&cfg, Some("before change")).expect("backup");
    assert!(name.ends_with("_before-change.json"));
    let listed = manager.list_backups().expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, name);
    assert!(listed[0].created_at.is_some());

    let restored = manager.restore(&name).expect("restore");
    assert_eq!(restored.currency, "USD");
    assert_eq!(manager.load().expect("load").currency, "USD");
}

#[test]
fn restoring_an_unknown_backup_fails() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let err = manager.restore("config_20990101_000000.json").unwrap_err();
    assert!(matches!(err, ConfigError::MissingBackup(_)));
}

#[test]
fn update_saves_only_successful_changes() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");

    let updated = manager
        .update(|cfg| -> Result<(), String> {
            cfg.currency = "EUR".into();
            Ok(())
        })
        .expect("io")
        .expect("change");
    assert_eq!(updated.currency, "EUR");

    let rejected = manager
        .update(|cfg| {
            cfg.currency = "XXX".into();
            Err("rejected")
        })
        .expect("io");
    assert_eq!(rejected, Err("rejected"));
    assert_eq!(manager.load().expect("load").currency, "EUR");
}

#[test]
fn backups_are_pruned_to_the_configured_retention() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
    let cfg = Config {
        backup_retention: 2,
        ..Config::default()
    };

    for note in ["one", "two", "three"] {
        manager.backup(&cfg, Some(note)).expect("backup");
    }
    assert_eq!(manager.list_backups().expect("list").len(), 2);
}
