//! Integration tests for the CredVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.
//! The master password is supplied through `CREDVAULT_PASSWORD` so no
//! interactive prompt is needed.

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;

const OWNER: &str = "alice@example.com";
const MASTER: &str = "hunter2";

/// Helper: get a Command pointing at the credvault binary.
fn credvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("credvault").expect("binary should exist")
}

/// Helper: a command running inside `dir` as `OWNER` with `password`.
fn in_vault(dir: &TempDir, password: &str) -> Command {
    let mut cmd = credvault();
    cmd.current_dir(dir.path())
        .env("CREDVAULT_OWNER", OWNER)
        .env("CREDVAULT_PASSWORD", password)
        .env_remove("RUST_LOG");
    cmd
}

/// Helper: register `OWNER` and add one credential; returns its id.
fn setup_with_record(dir: &TempDir, secret: &str) -> String {
    // Keep the KDF cheap in debug builds.
    std::fs::write(dir.path().join(".credvault.toml"), "kdf_iterations = 1000\n").unwrap();

    in_vault(dir, MASTER).arg("register").assert().success();
    in_vault(dir, MASTER)
        .args(["add", "github.com", "alice", secret])
        .assert()
        .success();

    let raw = std::fs::read_to_string(dir.path().join(".credvault/records.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    doc["records"][0]["id"].as_str().unwrap().to_string()
}

#[test]
fn help_flag_shows_usage() {
    credvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Personal credential vault"))
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("reveal"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn no_args_shows_help() {
    credvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_owner_fails() {
    let tmp = TempDir::new().unwrap();
    credvault()
        .current_dir(tmp.path())
        .env_remove("CREDVAULT_OWNER")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no owner"));
}

#[test]
fn add_then_reveal_roundtrip() {
    let tmp = TempDir::new().unwrap();
    let id = setup_with_record(&tmp, "S3cret!");

    in_vault(&tmp, MASTER)
        .args(["reveal", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("S3cret!"));

    // The vault files never contain the secret or the master password.
    let records = std::fs::read_to_string(tmp.path().join(".credvault/records.json")).unwrap();
    assert!(!records.contains("S3cret!"));
    let accounts = std::fs::read_to_string(tmp.path().join(".credvault/accounts.json")).unwrap();
    assert!(!accounts.contains(MASTER));
}

#[test]
fn reveal_with_wrong_password_fails() {
    let tmp = TempDir::new().unwrap();
    let id = setup_with_record(&tmp, "S3cret!");

    in_vault(&tmp, "wrong")
        .args(["reveal", &id])
        .assert()
        .failure()
        .stdout(predicate::str::contains("S3cret!").not())
        .stderr(predicate::str::contains("Invalid master password"));
}

#[test]
fn reveal_accepts_unique_id_prefix() {
    let tmp = TempDir::new().unwrap();
    let id = setup_with_record(&tmp, "S3cret!");

    in_vault(&tmp, MASTER)
        .args(["reveal", &id[..8]])
        .assert()
        .success()
        .stdout(predicate::str::contains("S3cret!"));
}

#[test]
fn list_shows_labels_without_secret() {
    let tmp = TempDir::new().unwrap();
    setup_with_record(&tmp, "S3cret!");

    in_vault(&tmp, MASTER)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("github.com"))
        .stdout(predicate::str::contains("S3cret!").not());
}

#[test]
fn edit_replaces_secret() {
    let tmp = TempDir::new().unwrap();
    let id = setup_with_record(&tmp, "old-secret");

    in_vault(&tmp, MASTER)
        .args(["edit", &id, "new-secret"])
        .assert()
        .success();

    in_vault(&tmp, MASTER)
        .args(["reveal", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("new-secret"));
}

#[test]
fn delete_with_force_removes_record() {
    let tmp = TempDir::new().unwrap();
    let id = setup_with_record(&tmp, "S3cret!");

    in_vault(&tmp, MASTER)
        .args(["delete", &id, "--force"])
        .assert()
        .success();

    in_vault(&tmp, MASTER)
        .args(["reveal", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn register_twice_fails() {
    let tmp = TempDir::new().unwrap();
    setup_with_record(&tmp, "S3cret!");

    in_vault(&tmp, MASTER)
        .arg("register")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn empty_vault_dir_flag_is_rejected() {
    let tmp = TempDir::new().unwrap();
    in_vault(&tmp, MASTER)
        .args(["--vault-dir", "", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("vault_dir cannot be empty"));
}
