// Binary-level tests for the approval-workflow CLI
//
// Each test runs in its own temporary directory so no stray
// approval-workflow.toml or .env from the checkout leaks into the run.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("approval-workflow").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("RUST_LOG")
        .env("APPROVAL_WORKFLOW__ACTIVITY__ECHO_DELAY_MS", "0")
        .env("APPROVAL_WORKFLOW__OBSERVABILITY__LOG_LEVEL", "warn");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_prints_effective_toml() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[workflow]"))
        .stdout(predicate::str::contains("approval_timeout_ms = 30000"))
        .stdout(predicate::str::contains("start_to_close_timeout_ms = 5000"));
}

#[test]
fn test_config_reflects_environment_overrides() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .env("APPROVAL_WORKFLOW__WORKFLOW__APPROVAL_TIMEOUT_MS", "45000")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("approval_timeout_ms = 45000"));
}

#[test]
fn test_run_with_immediate_approval_prints_result() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .args(["run", "Testing", "--id", "cli-happy", "--approve-after-ms", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Started workflow cli-happy"))
        .stdout(predicate::str::contains("The response from the query is Initializing"))
        .stdout(predicate::str::contains("Echo returned: Testing"));
}

#[test]
fn test_run_without_approval_reports_timeout_and_fails() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .env("APPROVAL_WORKFLOW__WORKFLOW__APPROVAL_TIMEOUT_MS", "200")
        .args(["run", "Testing", "--no-approve", "--json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(r#""failure_kind": "approval_timeout""#))
        .stdout(predicate::str::contains(
            "The workflow timed out while waiting to be approved",
        ))
        .stdout(predicate::str::contains(r#""state": "TimedOut""#))
        .stderr(predicate::str::contains("Workflow failed (approval_timeout)"));
}

#[test]
fn test_run_json_summary_on_success() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .args(["run", "Payload", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""result": "Echo returned: Payload""#))
        .stdout(predicate::str::contains(r#""state": "Complete""#))
        .stdout(predicate::str::contains("started_at"));
}

#[test]
fn test_run_with_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.toml");
    std::fs::write(&path, "[workflow]\napproval_timeout_ms = 100\n").unwrap();

    cli(&dir)
        .arg("--config")
        .arg(&path)
        .args(["run", "Testing", "--no-approve"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("approval_timeout"));
}

#[test]
fn test_run_rejects_invalid_configuration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("invalid.toml");
    std::fs::write(&path, "[workflow]\napproval_timeout_ms = 0\n").unwrap();

    cli(&dir)
        .arg("--config")
        .arg(&path)
        .args(["run", "Testing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("approval_timeout must be greater than zero"));
}

#[test]
fn test_malformed_env_file_is_reported_with_explicit_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("workflow.toml");
    std::fs::write(&path, "[workflow]\napproval_timeout_ms = 100\n").unwrap();
    std::fs::write(dir.path().join(".env"), "this line is not an assignment\n").unwrap();

    cli(&dir)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load .env file"));
}
