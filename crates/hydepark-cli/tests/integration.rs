#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hydepark(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("hydepark-deploy").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("HYDEPARK_CONFIG")
        .env("RUST_LOG", "error");
    cmd
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn config_show_prints_defaults() {
    let dir = TempDir::new().unwrap();
    hydepark(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 8080"))
        .stdout(predicate::str::contains("install_dir: /opt/hydepark-sync"));
}

#[test]
fn config_show_applies_flag_overrides() {
    let dir = TempDir::new().unwrap();
    let out = hydepark(&dir)
        .args(["--port", "9090", "--json", "config", "show"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["network"]["port"], 9090);
    assert_eq!(value["service"]["name"], "hydepark-sync");
}

#[test]
fn config_init_writes_file_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf/hydepark.yaml");

    hydepark(&dir)
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));
    assert!(path.exists());

    std::fs::write(&path, "network:\n  port: 9000\n").unwrap();
    hydepark(&dir)
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "network:\n  port: 9000\n"
    );
}

#[test]
fn config_from_env_var_is_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hydepark.yaml");
    std::fs::write(&path, "network:\n  port: 9001\n").unwrap();

    hydepark(&dir)
        .env("HYDEPARK_CONFIG", &path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 9001"));
}

#[test]
fn config_validate_accepts_defaults() {
    let dir = TempDir::new().unwrap();
    hydepark(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_rejects_bad_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(&path, "network:\n  port: 0\nlayout:\n  install_dir: relative/dir\n").unwrap();

    hydepark(&dir)
        .arg("--config")
        .arg(&path)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] network.port must be non-zero"))
        .stdout(predicate::str::contains("must be an absolute path"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    hydepark(&dir)
        .args(["--config", "does-not-exist.yaml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

// ---------------------------------------------------------------------------
// verify
// ---------------------------------------------------------------------------

#[test]
fn verify_fails_on_empty_install() {
    let dir = TempDir::new().unwrap();
    let install = dir.path().join("hydepark-sync");
    hydepark(&dir)
        .arg("--install-dir")
        .arg(&install)
        .args(["--port", "9", "verify"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL] data store"))
        .stdout(predicate::str::contains("[FAIL] virtualenv"))
        .stdout(predicate::str::contains("is NOT healthy"))
        .stdout(predicate::str::contains("journalctl -u hydepark-sync -n 50"))
        .stderr(predicate::str::contains("health checks failed"));
}

#[test]
fn verify_json_lists_every_check() {
    let dir = TempDir::new().unwrap();
    let out = hydepark(&dir)
        .arg("--install-dir")
        .arg(dir.path().join("absent"))
        .args(["--port", "9", "--json", "verify"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let checks = report["checks"].as_array().unwrap();
    assert_eq!(checks.len(), 7);
    assert!(checks.iter().any(|c| c["status"] == "fail"));
}

// ---------------------------------------------------------------------------
// deploy
// ---------------------------------------------------------------------------

#[test]
fn quick_update_requires_existing_install() {
    let dir = TempDir::new().unwrap();
    hydepark(&dir)
        .arg("--install-dir")
        .arg(dir.path().join("not-there"))
        .args(["deploy", "--update", "--source"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn unknown_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    hydepark(&dir).arg("launch").assert().failure();
}
