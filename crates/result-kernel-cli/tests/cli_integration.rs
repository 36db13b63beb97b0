use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;

fn unique_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("resultkernel-cli-{}", ulid::Ulid::new()));
    fs::create_dir_all(&dir)
        .unwrap_or_else(|err| panic!("failed to create temp dir {}: {err}", dir.display()));
    dir
}

fn write_branch(dir: &Path, branch: &str, body: &str) {
    let path = dir.join(format!("{branch}.json"));
    fs::write(&path, body)
        .unwrap_or_else(|err| panic!("failed to write branch fixture {}: {err}", path.display()));
}

fn run_rk<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_rk"))
        .args(args)
        .output()
        .unwrap_or_else(|err| panic!("failed to execute rk binary: {err}"))
}

fn run_json<I, S>(args: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = run_rk(args);
    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!(
            "rk command failed (status={}):\nstdout:\n{}\nstderr:\n{}",
            output.status, stdout, stderr
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    serde_json::from_str(&stdout)
        .unwrap_or_else(|err| panic!("stdout is not valid JSON: {err}\nstdout:\n{stdout}"))
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap_or_else(|| panic!("path should be valid UTF-8: {}", path.display()))
}

#[test]
fn lookup_round_trips_a_stored_record() {
    let dir = unique_data_dir();
    write_branch(
        &dir,
        "CS",
        r#"[{"Reg. No": "PIET21CS001", "Name": "A. Student", "4CS4-05": "A+", "SGPA": 8.42}]"#,
    );

    let value = run_json(["--data-dir", path_str(&dir), "lookup", "--reg", "piet21cs001"]);
    let result = value
        .get("result")
        .and_then(Value::as_array)
        .unwrap_or_else(|| panic!("missing result array in output: {value}"));
    assert_eq!(result.len(), 1);
    assert_eq!(
        result[0].get("Database Management System (4CS4-05)").and_then(Value::as_str),
        Some("A+")
    );
    assert_eq!(result[0].get("Branch").and_then(Value::as_str), Some("CS"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn lookup_without_matches_prints_empty_result() {
    let dir = unique_data_dir();
    write_branch(&dir, "CS", r#"[{"Reg. No": "PIET21CS001"}]"#);

    let value = run_json(["--data-dir", path_str(&dir), "lookup", "--reg", "PIET99ZZ999"]);
    assert_eq!(value.get("result").and_then(Value::as_array).map(Vec::len), Some(0));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn blank_registration_fails_with_nonzero_status() {
    let dir = unique_data_dir();

    let output = run_rk(["--data-dir", path_str(&dir), "lookup", "--reg", "  "]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("registration number is required"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn strict_hint_rejects_unknown_branch() {
    let dir = unique_data_dir();

    let output = run_rk([
        "--data-dir",
        path_str(&dir),
        "--strict-branch-hint",
        "lookup",
        "--reg",
        "PIET21CS001",
        "--branch",
        "EEE-X",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown branch: EEE-X"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn branches_reports_presence_per_catalog_branch() {
    let dir = unique_data_dir();
    write_branch(&dir, "CSR-D", "[]");

    let value = run_json(["--data-dir", path_str(&dir), "branches"]);
    let statuses = value.as_array().unwrap_or_else(|| panic!("expected array output: {value}"));
    assert_eq!(statuses.len(), 6);
    assert!(statuses.iter().any(|status| {
        status.get("branch").and_then(Value::as_str) == Some("CSR-D")
            && status.get("exists").and_then(Value::as_bool) == Some(true)
    }));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn subjects_prints_the_branch_table() {
    let dir = unique_data_dir();

    let value = run_json(["--data-dir", path_str(&dir), "subjects", "--branch", "CS(DS)-G"]);
    let subjects = value.as_array().unwrap_or_else(|| panic!("expected array output: {value}"));
    assert_eq!(subjects.len(), 13);
    assert!(subjects.iter().any(|entry| {
        entry.get("code").and_then(Value::as_str) == Some("FEC12")
            && entry.get("name").and_then(Value::as_str) == Some("Foundation Course")
    }));

    let _ = fs::remove_dir_all(&dir);
}
