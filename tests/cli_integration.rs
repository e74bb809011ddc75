//! Integration tests for the `aura` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command with an isolated database and no config file
fn aura(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aura").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("AURA_PROVIDER")
        .env_remove("AURA_DB_PATH")
        .env_remove("RUST_LOG")
        .arg("--db")
        .arg(dir.path().join("aura.db"));
    cmd
}

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("aura")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("preflight"))
        .stdout(predicate::str::contains("setup-db"));
}

#[test]
fn test_setup_db_lists_tables() {
    let dir = TempDir::new().unwrap();
    aura(&dir)
        .arg("setup-db")
        .assert()
        .success()
        .stdout(predicate::str::contains("messages"))
        .stdout(predicate::str::contains("knowledge_chunks"))
        .stdout(predicate::str::contains("chunk_image_links"));

    assert!(dir.path().join("aura.db").exists());
}

#[test]
fn test_sessions_list_json_is_parseable() {
    let dir = TempDir::new().unwrap();
    let output = aura(&dir)
        .args(["sessions", "list", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed, serde_json::json!([]));
}

#[test]
fn test_invalid_provider_is_rejected() {
    let dir = TempDir::new().unwrap();
    aura(&dir)
        .args(["--provider", "gemini", "verify"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid provider type"));
}

#[test]
fn test_verify_empty_index_fails() {
    let dir = TempDir::new().unwrap();
    aura(&dir)
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("No text chunks found"));
}
