//! Integration tests for the cfgtree binary.

mod common;

use common::{TestEnv, BROKEN_SCRIPT, VALID_SCRIPT};
use predicates::prelude::*;

#[test]
fn test_help() {
    let env = TestEnv::new();
    env.command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_version() {
    let env = TestEnv::new();
    env.command()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_check_valid_script() {
    let env = TestEnv::new();
    let path = env.write_script("valid.py", VALID_SCRIPT);

    env.command()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid.py: ok (6 statements)"));
}

#[test]
fn test_check_reports_syntax_error_location() {
    let env = TestEnv::new();
    let path = env.write_script("broken.py", BROKEN_SCRIPT);

    env.command()
        .arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("broken.py:2:12:"))
        .stderr(predicate::str::contains("1 of 1 scripts failed to parse"));
}

#[test]
fn test_check_continues_after_a_failure() {
    let env = TestEnv::new();
    let broken = env.write_script("broken.py", BROKEN_SCRIPT);
    let valid = env.write_script("valid.py", VALID_SCRIPT);

    env.command()
        .arg("check")
        .arg(&broken)
        .arg(&valid)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("valid.py: ok"))
        .stderr(predicate::str::contains("1 of 2 scripts failed to parse"));
}

#[test]
fn test_check_quiet_prints_nothing_on_success() {
    let env = TestEnv::new();
    let path = env.write_script("valid.py", VALID_SCRIPT);

    env.command()
        .arg("--quiet")
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_check_missing_file() {
    let env = TestEnv::new();
    env.command()
        .arg("check")
        .arg(env.path().join("missing.py"))
        .assert()
        .code(4)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_check_requires_files() {
    let env = TestEnv::new();
    env.command().arg("check").assert().failure();
}

#[test]
fn test_show_json() {
    let env = TestEnv::new();
    let path = env.write_script("valid.py", VALID_SCRIPT);

    let output = env.command().arg("show").arg(&path).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let statements = json["statements"].as_array().unwrap();
    assert_eq!(statements.len(), 6);
    assert_eq!(statements[0]["kind"], "import");
    assert_eq!(statements[0]["module"], "pkg.sub");
    assert_eq!(statements[1]["kind"], "from_import");
    assert_eq!(statements[1]["names"][0]["alias"], "I");
    assert_eq!(statements[2]["kind"], "assign");
    assert_eq!(statements[2]["line"], 4);
    assert_eq!(statements[5]["kind"], "call");
}

#[test]
fn test_show_yaml() {
    let env = TestEnv::new();
    let path = env.write_script("valid.py", "config.f=0.5\n");

    env.command()
        .args(["show", "--format", "yaml"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: assign"))
        .stdout(predicate::str::contains("line: 1"));
}

#[test]
fn test_show_syntax_error() {
    let env = TestEnv::new();
    let path = env.write_script("broken.py", BROKEN_SCRIPT);

    env.command()
        .arg("show")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("line 2, column 12"));
}

#[test]
fn test_show_rejects_unknown_format() {
    let env = TestEnv::new();
    let path = env.write_script("valid.py", VALID_SCRIPT);

    env.command()
        .args(["show", "--format", "toml"])
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn test_verbose_logs_parsing() {
    let env = TestEnv::new();
    let path = env.write_script("valid.py", VALID_SCRIPT);

    env.command()
        .arg("--verbose")
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG: parsing"));
}

#[test]
fn test_log_mode_from_environment() {
    let env = TestEnv::new();
    let path = env.write_script("valid.py", VALID_SCRIPT);

    env.command()
        .env("CFGTREE_LOG_MODE", "verbose")
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG: parsing"));
}

#[test]
fn test_completions() {
    let env = TestEnv::new();
    env.command()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cfgtree"));
}
