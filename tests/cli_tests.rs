//! Tests for the `scriptest` binary.
//!
//! `--python sh` plus a scripts directory holding shell versions of `test.py` and `detection_script.py` stands in for
//! a real interpreter.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const HARNESS: &str = r#"grep -v '^#' "$2"
"#;

const DETECTOR: &str = r#"grep -q DANGER "$1" && echo "Warning: dangerous call"
exit 0
"#;

fn scriptest() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scriptest"));
    cmd.env_remove("SCRIPTEST_PYTHON")
        .env_remove("SCRIPTEST_SCRIPTS_DIR")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null());
    cmd
}

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let harness_dir = dir.path().join("harness");
        fs::create_dir(&harness_dir).unwrap();
        fs::write(harness_dir.join("test.py"), HARNESS).unwrap();
        fs::write(harness_dir.join("detection_script.py"), DETECTOR).unwrap();
        fs::write(
            dir.path().join("spec.json"),
            r#"{"testfunc": "square", "tests": {"[[\"3\",\"int\"]]": ["9", "int"]}, "scriptPaths": {}}"#,
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn script(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn run(&self, extra: &[&Path]) -> Command {
        let mut cmd = scriptest();
        cmd.arg("run")
            .arg(self.path("spec.json"))
            .arg("--python")
            .arg("sh")
            .arg("--scripts-dir")
            .arg(self.path("harness"));
        for script in extra {
            cmd.arg("--script").arg(script);
        }
        cmd
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// run
// ============================================================================

#[test]
fn test_run_passing_script_exits_zero() {
    let ws = Workspace::new();
    let script = ws.script("solution.py", "[{'test': 'a', 'passed': True, 'received': 9}]");

    let output = ws.run(&[&script]).arg("--json").output().unwrap();

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["solution.py"]["summary"]["passed"], 1);
    assert!(stderr(&output).contains("1 passed"));
}

#[test]
fn test_run_failing_test_exits_one() {
    let ws = Workspace::new();
    let script = ws.script("solution.py", "[{'test': 'a', 'passed': False, 'error': 'nope'}]");

    let output = ws.run(&[&script]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nope"));
}

#[test]
fn test_run_flagged_script_without_terminal_cancels() {
    let ws = Workspace::new();
    let script = ws.script("risky.py", "#DANGER\n[{'test': 'a', 'passed': True}]");

    // stdin is closed, so the console prompt reads end of input
    let output = ws.run(&[&script]).arg("--json").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["risky.py"]["error"], "execution canceled by user");
}

#[test]
fn test_run_yes_and_skip_suspicious() {
    let ws = Workspace::new();
    let script = ws.script("risky.py", "#DANGER\n[{'test': 'a', 'passed': True}]");

    let output = ws.run(&[&script]).args(["--json", "--yes"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let output = ws.run(&[&script]).args(["--json", "--skip-suspicious"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "{}");
    assert!(stderr(&output).contains("risky.py SKIPPED"));
}

#[test]
fn test_run_missing_spec_is_usage_error() {
    let output = scriptest().args(["run", "/nonexistent/spec.json"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Error reading /nonexistent/spec.json"));
}

// ============================================================================
// scan / normalize / key
// ============================================================================

#[test]
fn test_scan_reports_verdict() {
    let ws = Workspace::new();
    let risky = ws.script("risky.py", "DANGER");
    let output = scriptest()
        .arg("scan")
        .arg(&risky)
        .args(["--python", "sh", "--scripts-dir"])
        .arg(ws.path("harness"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "suspicious\nWarning: dangerous call\n");
}

#[test]
fn test_normalize_from_file() {
    let ws = Workspace::new();
    let raw = ws.script("raw.txt", "[{'test': 'a', 'passed': True, 'received': (1, None)}]");
    let output = scriptest().arg("normalize").arg(&raw).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let records: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(records[0]["received"], "[1,null]");
}

#[test]
fn test_normalize_parse_failure() {
    let ws = Workspace::new();
    let raw = ws.script("raw.txt", "Traceback (most recent call last):");
    let output = scriptest().arg("normalize").arg(&raw).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).starts_with("Failed to parse interpreter output:"));
}

#[test]
fn test_key() {
    let output = scriptest().args(["key", "3:int", "abc:str"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "[[\"3\",\"int\"],[\"abc\",\"str\"]]\n");
}
