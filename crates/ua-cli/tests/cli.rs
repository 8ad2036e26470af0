// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end runs of the `ua-inspect` binary.
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn inspect(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ua-inspect").unwrap();
    cmd.arg("--config-dir").arg(dir.path());
    cmd
}

#[test]
fn browse_lists_the_server_under_objects() {
    let dir = tempfile::tempdir().unwrap();
    inspect(&dir)
        .args(["browse", "/Objects", "--reference-type", "Organizes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Server"))
        .stdout(predicate::str::contains("i=2253"));
}

#[test]
fn translate_reports_complete_targets() {
    let dir = tempfile::tempdir().unwrap();
    inspect(&dir)
        .args(["translate", "i=84", "/Objects/Server.NamespaceArray"])
        .assert()
        .success()
        .stdout(predicate::str::contains("i=2255"));
}

#[test]
fn translate_without_match_fails() {
    let dir = tempfile::tempdir().unwrap();
    inspect(&dir)
        .args(["translate", "i=84", "/Objects/Missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("BadNoMatch"));
}

#[test]
fn instantiate_prints_the_new_tree() {
    let dir = tempfile::tempdir().unwrap();
    inspect(&dir)
        .args(["instantiate", "FolderType", "Plant"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1:Plant [Object]"))
        .stdout(predicate::str::contains(": FolderType"));
}

#[test]
fn config_init_writes_then_keeps_the_file() {
    let dir = tempfile::tempdir().unwrap();
    inspect(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default config written"));
    assert!(dir.path().join("address-space.json").exists());
    inspect(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("left unchanged"));
}

#[test]
fn stored_config_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("address-space.json"),
        r#"{"own_namespace_uri": "urn:plant:test"}"#,
    )
    .unwrap();
    inspect(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("urn:plant:test"))
        .stdout(predicate::str::contains("\"first_numeric_id\": 1000"));
}
