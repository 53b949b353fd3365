//! Integration tests for the trainer binary.

use std::{fs, path::Path, time::Duration};

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::PredicateBooleanExt;
use tempfile::TempDir;

const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Command isolated from the caller's environment: no config file, no real
/// services, credential kept inside `dir`.
fn trainer(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("trainer");
    cmd.current_dir(dir)
        .env("TRAINER_AUTH_URL", UNREACHABLE)
        .env("TRAINER_CORE_URL", UNREACHABLE)
        .env("TRAINER_TOKEN_PATH", dir.join("token"))
        .env("TRAINER_REQUEST_TIMEOUT_SECS", "5")
        .env_remove("RUST_LOG")
        .timeout(Duration::from_secs(20));
    cmd
}

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("trainer");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("session"))
        .stdout(predicates::str::contains("topics"))
        .stdout(predicates::str::contains("assignments"))
        .stdout(predicates::str::contains("admin"))
        .stdout(predicates::str::contains("completion"))
        .stdout(predicates::str::contains("--config"));
}

#[test]
fn test_login_help() {
    let mut cmd = cargo_bin_cmd!("trainer");
    cmd.args(["session", "login", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("--email"))
        .stdout(predicates::str::contains("--password-stdin"))
        .stdout(predicates::str::contains("--from"));
}

#[test]
fn test_topic_show_requires_numeric_id() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["topics", "show", "abc"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid value"));
}

#[test]
fn test_config_generates_requested_format() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("conf").join("trainer.json");

    trainer(dir.path())
        .args(["config", "--format", "json", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicates::str::contains("generated successfully"));

    let written = fs::read_to_string(&output).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(parsed["auth_url"], "http://localhost:5000/auth");
    assert_eq!(parsed["request_timeout_secs"], 30);
}

#[test]
fn test_config_defaults_to_yaml_in_current_directory() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path()).arg("config").assert().success();

    let written = fs::read_to_string(dir.path().join("trainer.yaml")).unwrap();
    assert!(written.contains("core_url"));
}

#[test]
fn test_config_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["config", "--format", "xml"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("unsupported configuration format"));
}

#[test]
fn test_completion_script() {
    let mut cmd = cargo_bin_cmd!("trainer");
    cmd.args(["completion", "--shell", "bash"]);

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("trainer"));
}

#[test]
fn test_status_without_credential() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["session", "status"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Status: anonymous"))
        .stdout(predicates::str::contains("Not signed in."));
}

#[test]
fn test_status_keeps_credential_when_identity_service_is_down() {
    let dir = TempDir::new().unwrap();
    let token = dir.path().join("token");
    fs::write(&token, "tok1").unwrap();

    trainer(dir.path())
        .args(["session", "status"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Status: unverified"));

    assert_eq!(fs::read_to_string(&token).unwrap(), "tok1");
}

#[test]
fn test_me_reports_unreachable_service_and_keeps_credential() {
    let dir = TempDir::new().unwrap();
    let token = dir.path().join("token");
    fs::write(&token, "tok1").unwrap();

    trainer(dir.path())
        .args(["session", "me"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("could not load profile"))
        .stderr(predicates::str::contains("could not reach the identity service"));

    assert!(token.exists());
}

#[test]
fn test_me_without_credential() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["session", "me"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("not signed in"));
}

#[test]
fn test_logout_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let token = dir.path().join("token");
    fs::write(&token, "tok1").unwrap();

    for _ in 0..2 {
        trainer(dir.path())
            .args(["session", "logout"])
            .assert()
            .success()
            .stdout(predicates::str::contains("Signed out."));
    }
    assert!(!token.exists());
}

#[test]
fn test_login_against_unreachable_service() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["session", "login", "--email", "a@b.com", "--password-stdin"])
        .write_stdin("secret\n")
        .assert()
        .failure()
        .stderr(predicates::str::contains("login failed"))
        .stderr(predicates::str::contains("could not reach the identity service"));

    assert!(!dir.path().join("token").exists());
}

#[test]
fn test_login_rejects_empty_password() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["session", "login", "--email", "a@b.com", "--password-stdin"])
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicates::str::contains("password must not be empty"));
}

#[test]
fn test_protected_view_redirects_to_login() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["assignments", "show", "4"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("requires signing in"))
        .stderr(predicates::str::contains("--from /assignments/4"));
}

#[test]
fn test_admin_view_refuses_anonymous_user() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["admin", "users"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("only available to admins"));
}

#[test]
fn test_unverified_session_is_not_shown_protected_views() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("token"), "tok1").unwrap();

    trainer(dir.path())
        .args(["topics", "list"])
        .assert()
        .failure()
        .stderr(
            predicates::str::contains("could not verify the stored credential")
                .and(predicates::str::contains("trainer session login")),
        );
}

#[test]
fn test_empty_attempt_is_refused_before_any_request() {
    let dir = TempDir::new().unwrap();
    trainer(dir.path())
        .args(["assignments", "attempt", "3", "--code", "   "])
        .assert()
        .failure()
        .stderr(predicates::str::contains("nothing to submit"));
}
