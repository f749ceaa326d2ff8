use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_portico_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("portico")
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::new(get_portico_bin());
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("encode-secret"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn test_fetch_help_shows_portal_flags() {
    let mut cmd = Command::new(get_portico_bin());
    cmd.arg("fetch").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--name"))
        .stdout(predicate::str::contains("--partition"))
        .stdout(predicate::str::contains("--show-browser"))
        .stdout(predicate::str::contains("--chrome-path"));
}

#[test]
fn test_fetch_requires_name() {
    let mut cmd = Command::new(get_portico_bin());
    cmd.arg("fetch");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--name"));
}

#[test]
fn test_invalid_format_is_rejected() {
    let mut cmd = Command::new(get_portico_bin());
    cmd.arg("--format").arg("xml").arg("encode-secret").arg("pw");

    cmd.assert().failure();
}

#[test]
fn test_encode_secret() {
    let mut cmd = Command::new(get_portico_bin());
    cmd.arg("encode-secret").arg("pw");

    cmd.assert().success().stdout("cHc=\n");
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::new(get_portico_bin());
    cmd.arg("--config")
        .arg(dir.path().join("missing.json"))
        .arg("login");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}
