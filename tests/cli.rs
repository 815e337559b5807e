//! Integration tests driving the `filetest` binary.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::time::Instant;
use tempfile::TempDir;

fn filetest_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_filetest"))
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    filetest_cmd()
        .arg("run")
        .arg(dir)
        .args(args)
        .output()
        .unwrap()
}

fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

const ECHO_TESTS: &str = "\
### TEST: Echo words
DESCRIPTION: echo returns its argument
TAGS: echo
INPUT:
hello world
EXPECTED:
hello world

### TEST: Echo fragment
TYPE: contains
TAGS: echo, decimal
INPUT: 3.3333333333333335
EXPECTED: 3.3
";

#[test]
fn passing_file_exits_zero() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("echo.test"), ECHO_TESTS).unwrap();

    let output = run_in(temp_dir.path(), &[]);
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓ Echo words"), "{stdout}");
    assert!(stdout.contains("✓ Echo fragment"), "{stdout}");
    assert!(stdout.contains("Total: 2 | Passed: 2 | Failed: 0"), "{stdout}");
}

#[test]
fn failing_test_exits_one_with_details() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("bad.test"),
        "### TEST: Wrong answer\nINPUT: 5\nEXPECTED: 4\n",
    )
    .unwrap();

    let output = run_in(temp_dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✗ Wrong answer"), "{stdout}");
    assert!(stdout.contains("expected: 4"), "{stdout}");
    assert!(stdout.contains("actual:   5"), "{stdout}");
    assert!(!stdout.contains("error:"), "{stdout}");
}

#[test]
fn arithmetic_command_template() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("math.test"),
        "### TEST: Addition\nTYPE: exact\nINPUT:\n2 + 2\nEXPECTED:\n4\n",
    )
    .unwrap();

    let output = run_in(
        temp_dir.path(),
        &["--command", "sh -c 'echo $(($1))' _ {input}", "--output", "json"],
    );
    assert!(output.status.success(), "{}", describe(&output));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["results"][0]["passed"], true);
    assert_eq!(json["results"][0]["actual_output"], "4");
}

#[test]
fn json_results_follow_file_order() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("b_second.test"),
        "### TEST: test_b\nINPUT: b\nEXPECTED: b\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("a_first.test"),
        "### TEST: test_a1\nINPUT: a\nEXPECTED: a\n### TEST:\n### TEST: test_a2\nINPUT: x\nEXPECTED: y\n",
    )
    .unwrap();

    let output = run_in(temp_dir.path(), &["-o", "json"]);
    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["test"]["name"].as_str().unwrap().to_string())
        .collect();
    // The nameless section contributes nothing and does not disturb its neighbors
    assert_eq!(names, vec!["test_a1", "test_a2", "test_b"]);
    assert_eq!(json["summary"]["total"], 3);
    assert_eq!(json["summary"]["passed"], 2);
    assert_eq!(json["summary"]["failed"], 1);
}

#[test]
fn tag_filter_selects_tests() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("echo.test"), ECHO_TESTS).unwrap();

    let output = run_in(temp_dir.path(), &["--tags", "decimal"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Echo fragment"));
    assert!(!stdout.contains("Echo words"));
    assert!(stdout.contains("Total: 1 | Passed: 1 | Failed: 0"));
}

#[test]
fn no_matching_tests_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("echo.test"), ECHO_TESTS).unwrap();

    let output = run_in(temp_dir.path(), &["--tags", "network"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No tests found to run"));
}

#[test]
fn no_test_files_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("notes.md"), "nothing here").unwrap();

    let output = run_in(temp_dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No test files found"));
}

#[test]
fn suite_config_supplies_command_and_pattern() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("filetest.yaml"),
        "version: 1\ncommand: \"sh -c 'echo $(($1))' _ {input}\"\npattern: \"*.calc\"\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("math.calc"),
        "### TEST: Multiply\nINPUT: 5 * 3\nEXPECTED: 15\n",
    )
    .unwrap();
    // Not matched by the configured pattern
    fs::write(
        temp_dir.path().join("ignored.test"),
        "### TEST: Ignored\nINPUT: 1\nEXPECTED: 2\n",
    )
    .unwrap();

    let output = run_in(temp_dir.path(), &[]);
    assert!(output.status.success(), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✓ Multiply"));
    assert!(!stdout.contains("Ignored"));
}

#[test]
fn invalid_suite_config_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("filetest.yaml"), "invalid: [yaml: {").unwrap();
    fs::write(temp_dir.path().join("echo.test"), ECHO_TESTS).unwrap();

    let output = run_in(temp_dir.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error loading suite config"));
}

#[test]
fn timeout_flag_limits_each_test() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("slow.test"),
        "### TEST: Sleeper\nINPUT: 10\nEXPECTED: done\n",
    )
    .unwrap();

    let start = Instant::now();
    let output = run_in(
        temp_dir.path(),
        &["--command", "sleep {input}; echo done", "--timeout", "1", "-o", "json"],
    );
    let elapsed = start.elapsed();

    assert_eq!(output.status.code(), Some(1), "{}", describe(&output));
    assert!(
        elapsed.as_secs_f64() < 5.0,
        "run took {:.2}s, expected about 1s",
        elapsed.as_secs_f64()
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let result = &json["results"][0];
    assert_eq!(result["passed"], false);
    assert_eq!(result["status"], "timed_out");
    assert!(result["error_message"].as_str().unwrap().contains("timed out"));
}

#[test]
fn junit_output() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("echo.test"), ECHO_TESTS).unwrap();

    let output = run_in(temp_dir.path(), &["-o", "junit"]);
    assert!(output.status.success(), "{}", describe(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<?xml"));
    assert!(stdout.contains("<testsuites tests=\"2\" failures=\"0\""));
    assert!(stdout.contains("<testcase name=\"Echo words\""));
}

#[test]
fn validate_reports_case_counts() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("echo.test"), ECHO_TESTS).unwrap();

    let output = filetest_cmd()
        .arg("validate")
        .arg(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", describe(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(2 tests)"));
    assert!(stdout.contains("All 1 file(s) valid"));
}

#[test]
fn init_writes_sample_once() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("sample.test");

    let output = filetest_cmd().arg("init").arg(&path).output().unwrap();
    assert!(output.status.success(), "{}", describe(&output));
    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(filetest::parser::parse(&contents, &path).len(), 3);

    let again = filetest_cmd().arg("init").arg(&path).output().unwrap();
    assert_eq!(again.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));
}

#[test]
fn schema_describes_suite_config() {
    let output = filetest_cmd().arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(schema["properties"]["command"].is_object());
    assert!(schema["properties"]["pattern"].is_object());
}
