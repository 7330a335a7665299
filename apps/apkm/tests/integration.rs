//! Integration tests for the apkm CLI

use std::process::Command;
use tempfile::TempDir;

fn apkm(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_apkm"));
    cmd.env("APKM_DATA_DIR", dir.path().join("data"))
        .env("APKM_CACHE_DIR", dir.path().join("cache"))
        .env_remove("RUST_LOG")
        .args(["--config", &dir.path().join("config.toml").display().to_string()]);
    cmd
}

fn temp_env() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "").unwrap();
    dir
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_apkm"))
        .arg("--version")
        .output()
        .expect("Failed to execute apkm");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("apkm"));
}

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_apkm"))
        .arg("--help")
        .output()
        .expect("Failed to execute apkm");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("install"));
    assert!(stdout.contains("logs"));
    assert!(stdout.contains("cache"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(env!("CARGO_BIN_EXE_apkm"))
        .arg("invalid-command")
        .output()
        .expect("Failed to execute apkm");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_logs_list_empty_json() {
    let dir = temp_env();
    let output = apkm(&dir)
        .args(["--json", "logs", "list"])
        .output()
        .expect("Failed to execute apkm");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "records");
    assert_eq!(value["data"], serde_json::json!([]));
}

#[test]
fn test_logs_show_unknown_id_fails() {
    let dir = temp_env();
    let output = apkm(&dir)
        .args(["logs", "show", "00000000-0000-0000-0000-000000000000"])
        .output()
        .expect("Failed to execute apkm");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no installation record"));
}

#[test]
fn test_cache_clear() {
    let dir = temp_env();
    let apks = dir.path().join("cache").join("apks");
    std::fs::create_dir_all(&apks).unwrap();
    std::fs::write(apks.join("base-228.apk"), b"PK").unwrap();

    let output = apkm(&dir)
        .args(["cache", "clear"])
        .output()
        .expect("Failed to execute apkm");

    assert!(output.status.success());
    assert!(!dir.path().join("cache").exists());
}

#[test]
fn test_install_rejects_bad_icon_color() {
    let dir = temp_env();
    let output = apkm(&dir)
        .args(["install", "--icon", "color", "--icon-color", "#12345"])
        .output()
        .expect("Failed to execute apkm");

    assert!(!output.status.success());
}
