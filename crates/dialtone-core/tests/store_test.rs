#![allow(clippy::unwrap_used)]
// Integration tests for the atomic inventory store: backup-then-rename
// writes, retention pruning, and corrupt-load recovery.

use std::fs;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use pretty_assertions::assert_eq;

use dialtone_core::{
    GlobalSettings, Inventory, InventoryStore, MacAddr, Phone, PhonebookEntry, StoreConfig,
    StoreError,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn store(dir: &Path) -> InventoryStore {
    InventoryStore::new(StoreConfig {
        phones_path: dir.join("phones.yml"),
        secrets_path: None,
        backup_count: 10,
    })
}

fn store_with_secrets(dir: &Path) -> InventoryStore {
    InventoryStore::new(StoreConfig {
        phones_path: dir.join("phones.yml"),
        secrets_path: Some(dir.join("secrets.yml")),
        backup_count: 10,
    })
}

fn phone(mac: &str, extension: &str) -> Phone {
    Phone {
        mac: MacAddr::parse(mac).unwrap(),
        model: "T54W".to_owned(),
        extension: extension.to_owned(),
        display_name: format!("Ext {extension}"),
        label: None,
        password: Some(format!("pw-{extension}")),
        transport: None,
        pbx_server: None,
        pbx_port: None,
        codecs: None,
    }
}

fn sample_inventory() -> Inventory {
    let mut inventory = Inventory::default();
    inventory.settings.pbx_server = "pbx.lan".to_owned();
    inventory.add_phone(phone("001565aabbcc", "101")).unwrap();
    inventory.add_phone(phone("0c383e010203", "102")).unwrap();
    inventory
        .add_phonebook_entry(PhonebookEntry {
            name: "Reception".to_owned(),
            number: "100".to_owned(),
        })
        .unwrap();
    inventory
}

fn backups(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir.join(".backups")) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Load ────────────────────────────────────────────────────────────

#[test]
fn test_missing_artifact_loads_empty_inventory() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = store(dir.path()).load().unwrap();
    assert!(loaded.phones().is_empty());
    assert_eq!(loaded.settings, GlobalSettings::default());
    assert!(loaded.phonebook.is_empty());
}

#[test]
fn test_empty_artifact_loads_empty_inventory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("phones.yml"), "").unwrap();
    let loaded = store(dir.path()).load().unwrap();
    assert!(loaded.phones().is_empty());
}

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let inventory = sample_inventory();

    store.save(&inventory).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, inventory);
}

#[test]
fn test_secrets_are_split_and_merged_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_secrets(dir.path());
    let inventory = sample_inventory();

    store.save(&inventory).unwrap();

    let phones_raw = fs::read_to_string(dir.path().join("phones.yml")).unwrap();
    assert!(!phones_raw.contains("password"), "credentials leaked:\n{phones_raw}");
    let secrets_raw = fs::read_to_string(dir.path().join("secrets.yml")).unwrap();
    assert!(secrets_raw.contains("phone_passwords"));
    assert!(secrets_raw.contains("pw-101"));
    assert!(secrets_raw.contains("pw-102"));

    let loaded = store.load().unwrap();
    assert_eq!(loaded, inventory);
}

// ── Backups ─────────────────────────────────────────────────────────

#[test]
fn test_first_save_makes_no_backup_then_saves_do() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());

    store.save(&sample_inventory()).unwrap();
    assert!(backups(dir.path()).is_empty());

    store.save(&sample_inventory()).unwrap();
    let names = backups(dir.path());
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("phones_"));
    assert!(names[0].ends_with(".yml"));
}

#[test]
fn test_pruning_keeps_retention_count_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = InventoryStore::new(StoreConfig {
        phones_path: dir.path().join("phones.yml"),
        secrets_path: None,
        backup_count: 3,
    });
    store.save(&sample_inventory()).unwrap();

    // Seed old backups with ascending modification times.
    let backup_dir = dir.path().join(".backups");
    fs::create_dir_all(&backup_dir).unwrap();
    for n in 1..=5 {
        fs::write(backup_dir.join(format!("phones_2024010{n}_000000.yml")), "old").unwrap();
        sleep(Duration::from_millis(5));
    }

    // The next save adds a sixth backup and prunes down to three.
    sleep(Duration::from_millis(5));
    store.save(&sample_inventory()).unwrap();

    let names = backups(dir.path());
    assert_eq!(names.len(), 3, "kept: {names:?}");
    assert!(names.contains(&"phones_20240104_000000.yml".to_owned()));
    assert!(names.contains(&"phones_20240105_000000.yml".to_owned()));
    assert!(!names.contains(&"phones_20240101_000000.yml".to_owned()));
    assert!(!names.contains(&"phones_20240102_000000.yml".to_owned()));
    assert!(!names.contains(&"phones_20240103_000000.yml".to_owned()));
}

#[test]
fn test_corrupt_artifact_recovers_from_newest_valid_backup() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());

    let mut v1 = Inventory::default();
    v1.add_phone(phone("001565aabbcc", "101")).unwrap();
    store.save(&v1).unwrap();

    let mut v2 = v1.clone();
    v2.add_phone(phone("0c383e010203", "102")).unwrap();
    store.save(&v2).unwrap();

    // Clobber the primary artifact with unparseable text.
    fs::write(dir.path().join("phones.yml"), "phones: [").unwrap();

    // The newest backup is v1 (taken when v2 was written).
    let recovered = store.load().unwrap();
    assert_eq!(recovered.phones().len(), 1);
    assert_eq!(recovered.phones()[0].extension, "101");
}

#[test]
fn test_corrupt_artifact_without_valid_backup_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("phones.yml"), "phones: [").unwrap();
    let error = store(dir.path()).load().unwrap_err();
    assert!(matches!(error, StoreError::Corrupt { .. }), "{error}");
}

#[test]
fn test_failed_backup_leaves_primary_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let v1 = sample_inventory();
    store.save(&v1).unwrap();

    // A file squatting on the backup directory makes backups fail.
    fs::write(dir.path().join(".backups"), "not a directory").unwrap();

    let mut v2 = v1.clone();
    v2.add_phone(phone("7c2f80000001", "103")).unwrap();
    let error = store.save(&v2).unwrap_err();
    assert!(matches!(error, StoreError::Backup { .. }), "{error}");

    // The committed artifact still loads as v1.
    let loaded = store.load().unwrap();
    assert_eq!(loaded, v1);
}

#[test]
fn test_load_merges_hand_written_secrets_artifact() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("phones.yml"),
        "phones:\n  - {mac: 001565aabbcc, model: T54W, extension: \"101\", display_name: A}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("secrets.yml"),
        "phone_passwords:\n  \"101\": from-vault\n",
    )
    .unwrap();

    let loaded = store_with_secrets(dir.path()).load().unwrap();
    let mac = MacAddr::parse("001565aabbcc").unwrap();
    assert_eq!(
        loaded.lookup(&mac).unwrap().password.as_deref(),
        Some("from-vault")
    );
}
