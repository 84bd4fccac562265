//! CLI integration tests.
//!
//! These run the compiled binary against the fixture addon and check the
//! terminal and JSON surfaces.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn cmd() -> Command {
    Command::cargo_bin("deadfield").expect("binary should build")
}

/// Arguments every fixture run needs: the addon path and a config that
/// clears the default **/tests/** exclusion.
fn fixture_args(cmd: &mut Command) -> &mut Command {
    cmd.arg(fixtures_path().join("crm"))
        .arg("--config")
        .arg(fixtures_path().join("deadfield.toml"))
        .arg("--quiet")
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deadfield"))
        .stdout(predicate::str::contains("--parallel"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--show-dangling"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deadfield"));
}

#[test]
fn test_cli_terminal_report() {
    let mut cmd = cmd();
    fixture_args(&mut cmd)
        .assert()
        .success()
        .stdout(predicate::str::contains("res.partner"))
        .stdout(predicate::str::contains("legacy_code"))
        .stdout(predicate::str::contains("_forgotten_helper"))
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn test_cli_parallel_mode() {
    let mut cmd = cmd();
    fixture_args(&mut cmd)
        .arg("--parallel")
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy_code"));
}

#[test]
fn test_cli_json_output() {
    let mut cmd = cmd();
    let output = fixture_args(&mut cmd)
        .arg("--format")
        .arg("json")
        .output()
        .expect("command should run");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    assert_eq!(report["summary"]["dead_fields"], 3);
    assert!(report["symbols"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s["symbol"]["name"] == "legacy_code"));
}

#[test]
fn test_cli_json_output_to_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = temp.path().join("report.json");

    let mut cmd = cmd();
    fixture_args(&mut cmd)
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let contents = std::fs::read_to_string(&out).expect("report file should exist");
    let report: serde_json::Value = serde_json::from_str(&contents).expect("valid JSON");
    assert_eq!(report["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_cli_min_confidence_high_drops_low_verdicts() {
    let mut cmd = cmd();
    fixture_args(&mut cmd)
        .arg("--min-confidence")
        .arg("high")
        .assert()
        .success()
        // Untouched symbols stay, the write-only field is low confidence.
        .stdout(predicate::str::contains("legacy_code"))
        .stdout(predicate::str::contains("score").not());
}

#[test]
fn test_cli_retain_pattern_hides_symbols() {
    let mut cmd = cmd();
    fixture_args(&mut cmd)
        .arg("--retain")
        .arg("legacy_*")
        .assert()
        .success()
        .stdout(predicate::str::contains("legacy_code").not());
}

#[test]
fn test_cli_empty_directory() {
    let temp = tempfile::tempdir().expect("tempdir");
    cmd()
        .arg(temp.path())
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("No Python or XML files found"));
}
