//! Integration tests for the DocPress CLI.

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

/// Command isolated from the developer's environment: no `.env`, no stored token.
fn docpress(workdir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("docpress");
    cmd.current_dir(workdir.path())
        .env_remove("RUST_LOG")
        .env_remove("DOCPRESS_API_BASE_URL")
        .env_remove("DOCPRESS_LOG_FORMAT")
        .env("DOCPRESS_STORAGE_DIR", workdir.path().join("store"))
        .env("DOCPRESS_LOG_LEVEL", "warn")
        .timeout(std::time::Duration::from_secs(20));
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("login"))
        .stdout(contains("projects"))
        .stdout(contains("files"))
        .stdout(contains("manual"))
        .stdout(contains("export"))
        .stdout(contains("navigate"));
}

#[test]
fn test_completion_bash() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .args(["completion", "--shell", "bash"])
        .assert()
        .success()
        .stdout(contains("docpress"));
}

#[test]
fn test_completion_rejects_unknown_shell() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .args(["completion", "--shell", "cmd"])
        .assert()
        .failure()
        .stderr(contains("invalid value"));
}

#[test]
fn test_config_writes_yaml_by_default() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(contains("config.yaml"));

    let written = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
    assert!(written.contains("api_base_url"));
    assert!(written.contains("request_timeout_secs: 10"));
}

#[test]
fn test_config_writes_json() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .args(["config", "--format", "json"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("config.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(value["api_base_url"], "http://localhost:8000/api/v1/");
}

#[test]
fn test_config_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .args(["config", "--format", "toml"])
        .assert()
        .failure()
        .stderr(contains("Unsupported format"));
}

#[test]
fn test_navigate_anonymous_is_sent_to_login() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .args(["navigate", "/projects/42"])
        .assert()
        .success()
        .stdout(contains("session: anonymous"))
        .stdout(contains("(login-required)"))
        .stdout(contains("final: /login?redirect=%2Fprojects%2F42 [login]"));
}

#[test]
fn test_navigate_open_route() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .args(["navigate", "/nope"])
        .assert()
        .success()
        .stdout(contains("final: /nope [not-found]"))
        .stdout(contains("redirect:").not());
}

#[test]
fn test_whoami_without_session_fails() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(contains("not logged in"));
}

#[test]
fn test_logout_without_session_succeeds() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .arg("logout")
        .assert()
        .success()
        .stdout(contains("No active session."));
}

#[test]
fn test_export_url_uses_configured_base() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("docpress.yaml");
    std::fs::write(&config, "api_base_url: https://docs.example.com/api/v1\n").unwrap();

    docpress(&dir)
        .arg("--config")
        .arg(&config)
        .args(["export", "url", "job-7"])
        .assert()
        .success()
        .stdout(contains("https://docs.example.com/api/v1/exports/job-7/download"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("docpress.yaml");
    std::fs::write(&config, "request_timeout_secs: 0\n").unwrap();

    docpress(&dir)
        .arg("--config")
        .arg(&config)
        .arg("logout")
        .assert()
        .failure()
        .stderr(contains("failed to load configuration"));
}

#[test]
fn test_projects_list_reports_unreachable_server() {
    let dir = TempDir::new().unwrap();
    docpress(&dir)
        .env("DOCPRESS_API_BASE_URL", "http://127.0.0.1:9/api/v1")
        .args(["projects", "list"])
        .assert()
        .failure()
        .stderr(contains("failed to list projects").or(contains("request failed")));
}
