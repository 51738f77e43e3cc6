//! Integration tests for the bench binary.
//!
//! None of these reach BigQuery: they cover local syntax checks, linting
//! and input errors.

use std::{fs, io::Write};

use assert_cmd::{Command, cargo::cargo_bin_cmd};
use predicates::prelude::*;
use tempfile::{NamedTempFile, TempDir};

/// Command isolated from the user's config, credentials and environment
fn cmd(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("bench");
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("BENCH_PROJECT")
        .env_remove("GOOGLE_CLOUD_PROJECT")
        .env_remove("BENCH_ACCESS_TOKEN")
        .env_remove("GOOGLE_APPLICATION_CREDENTIALS")
        .env_remove("BENCH_LOG");
    cmd
}

#[test]
fn test_dryrun_syntax_error_exits_one() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["dryrun", "SELEC 1 FROM t", "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗ Query invalid"))
        .stdout(predicate::str::contains("Error:"));
}

#[test]
fn test_dryrun_syntax_error_json() {
    let home = TempDir::new().unwrap();
    let output = cmd(&home)
        .args(["dryrun", "SELECT * FROM", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["valid"], false);
    assert!(parsed["error"].as_str().unwrap().starts_with("Syntax error"));
}

#[test]
fn test_dryrun_syntax_error_from_file() {
    let home = TempDir::new().unwrap();
    let mut sql = NamedTempFile::new().unwrap();
    writeln!(sql, "SELECT id FROM t WHERE").unwrap();
    cmd(&home)
        .args(["dryrun", "-f", sql.path().to_str().unwrap()])
        .assert()
        .code(1);
}

#[test]
fn test_dryrun_syntax_error_from_stdin() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("dryrun")
        .write_stdin("SELECT (1")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Query invalid"));
}

#[test]
fn test_query_without_sql_fails() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("query")
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: No SQL provided. Use a SQL string, --file, or pipe SQL to stdin."
        ));
}

#[test]
fn test_query_missing_file_fails() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["query", "-f", "/nonexistent/query.sql"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: File /nonexistent/query.sql not found"));
}

#[test]
fn test_schema_invalid_table_id_fails() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["schema", "a.b.c.d", "-p", "proj"])
        .env("BENCH_ACCESS_TOKEN", "token")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Invalid table_id format. Use 'dataset.table' or 'project.dataset.table'."
        ));
}

#[test]
fn test_query_without_credentials_explains_why() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["query", "SELECT 1", "-p", "proj"])
        .env("PATH", home.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Authentication failed: no credentials found"));
}

#[test]
fn test_dryrun_unreachable_endpoint_reports_local_error() {
    let home = TempDir::new().unwrap();
    fs::write(home.path().join(".bench.toml"), "[retry]\nmax_retries = 0\n").unwrap();
    cmd(&home)
        .args(["dryrun", "SELECT (1", "-p", "proj", "--no-color"])
        .env("BENCH_ACCESS_TOKEN", "token")
        .env("BENCH_API_ENDPOINT", "http://127.0.0.1:1/bigquery/v2")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗ Query invalid"))
        .stdout(predicate::str::contains("Error: Syntax error"));
}

#[test]
fn test_lint_delete_without_where() {
    let home = TempDir::new().unwrap();
    let mut sql = NamedTempFile::new().unwrap();
    writeln!(sql, "DELETE FROM t;").unwrap();
    cmd(&home)
        .args(["lint", sql.path().to_str().unwrap(), "--no-color"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Line 1:"))
        .stdout(predicate::str::contains("SEC002"));
}

#[test]
fn test_lint_clean_file_succeeds() {
    let home = TempDir::new().unwrap();
    let mut sql = NamedTempFile::new().unwrap();
    writeln!(sql, "SELECT o.id FROM orders AS o WHERE o.id > 1;").unwrap();
    cmd(&home)
        .args(["lint", sql.path().to_str().unwrap(), "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_lint_stdin_json() {
    let home = TempDir::new().unwrap();
    let output = cmd(&home)
        .args(["lint", "--format", "json"])
        .write_stdin("SELECT * FROM a AS a")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["violations"][0]["rule_id"], "STYLE001");
    assert_eq!(parsed["violations"][0]["severity"], "Warning");
}

#[test]
fn test_lint_fix_rewrites_file() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("report.sql");
    fs::write(&path, "select id from orders join customers on x = y").unwrap();
    cmd(&home)
        .args(["lint", path.to_str().unwrap(), "--fix", "--no-color"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Fixed SQL written to"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "SELECT id\nFROM orders AS o\nJOIN customers AS c ON x = y\n"
    );
}

#[test]
fn test_lint_fix_stdin_to_stdout() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["lint", "--fix"])
        .write_stdin("select a, b from t where a = 1")
        .assert()
        .success()
        .stdout(predicate::str::contains("SELECT a,\n    b\nFROM t AS t\nWHERE a = 1"));
}

#[test]
fn test_lint_missing_file_fails() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["lint", "/nonexistent/q.sql"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: File /nonexistent/q.sql not found"));
}

#[test]
fn test_lint_respects_local_config() {
    let home = TempDir::new().unwrap();
    fs::write(
        home.path().join(".bench.toml"),
        "[lint]\ndisabled = [\"SEC002\"]\n"
    )
    .unwrap();
    cmd(&home)
        .arg("lint")
        .write_stdin("DELETE FROM t")
        .assert()
        .success();
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bench"));
}
