// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem store against a temporary directory.
#![allow(clippy::unwrap_used)]

use serde::{Deserialize, Serialize};
use ua_config::{ConfigError, ConfigService, ConfigStore, FsConfigStore};

#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Settings {
    uri: String,
    depth: u32,
}

#[test]
fn saved_value_lands_in_a_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsConfigStore::at(dir.path().join("nested")).unwrap();
    let service = ConfigService::new(store);
    let settings = Settings {
        uri: "urn:test".into(),
        depth: 4,
    };
    service.save("settings", &settings).unwrap();

    let file = dir.path().join("nested").join("settings.json");
    assert!(file.exists());
    let loaded: Settings = service.load("settings").unwrap().unwrap();
    assert_eq!(loaded, settings);
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsConfigStore::at(dir.path()).unwrap();
    assert!(matches!(store.load_raw("absent"), Err(ConfigError::NotFound)));
    let service = ConfigService::new(store);
    let value: Settings = service.load_or_default("absent").unwrap();
    assert_eq!(value, Settings::default());
}

#[test]
fn traversal_keys_never_touch_the_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsConfigStore::at(dir.path()).unwrap();
    assert!(matches!(
        store.save_raw("../escape", b"{}"),
        Err(ConfigError::InvalidKey(_))
    ));
    assert!(!dir.path().parent().unwrap().join("escape.json").exists());
}
