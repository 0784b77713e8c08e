//! CLI tests for `grower search`, `grower grow` and `grower init`.
//!
//! Spawns the grower binary with `printf`-backed oracles and verifies output
//! and exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use grower::exit_codes;
use grower::io::config::{FailurePolicy, OracleCommandConfig, SearchConfig, load_config, write_config};

fn oracle(command: &[&str]) -> OracleCommandConfig {
    OracleCommandConfig {
        command: command.iter().map(|s| s.to_string()).collect(),
        ..OracleCommandConfig::default()
    }
}

fn write_test_config(dir: &Path, generator: &[&str], evaluator: &[&str]) -> PathBuf {
    let path = dir.join("grower.toml");
    let cfg = SearchConfig {
        iterations: 3,
        cycles: 2,
        retry_backoff_ms: 0,
        generator: oracle(generator),
        evaluator: oracle(evaluator),
        ..SearchConfig::default()
    };
    write_config(&path, &cfg).expect("write config");
    path
}

fn grower(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_grower"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run grower")
}

#[test]
fn search_prints_chosen_continuation() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), &["printf", "A"], &["printf", "5"]);

    let output = grower(temp.path(), &["search", "--goal", "letters"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "A\n");
}

#[test]
fn search_json_reports_statistics() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), &["printf", "A"], &["printf", "5"]);

    let output = grower(temp.path(), &["search", "--goal", "letters", "--json"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(report["iterations"], 3);
    assert_eq!(report["expanded"], 3);
    assert_eq!(report["decision"]["increment"], "A");
    assert_eq!(report["decision"]["state"], "A");
    assert_eq!(report["decision"]["visits"], 3);
    assert_eq!(report["principal_line"], serde_json::json!(["A", "A", "A"]));
}

#[test]
fn zero_iterations_exits_with_no_decision() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), &["printf", "A"], &["printf", "5"]);

    let output = grower(
        temp.path(),
        &["search", "--goal", "letters", "--iterations", "0"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::NO_DECISION));
    assert!(output.stdout.is_empty());
}

#[test]
fn failing_generator_aborts_by_default() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), &["false"], &["printf", "5"]);

    let output = grower(temp.path(), &["search", "--goal", "letters"]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("expand oracle failed"));
}

#[test]
fn failing_generator_under_skip_policy_has_no_decision() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_test_config(temp.path(), &["false"], &["printf", "5"]);
    let mut cfg = load_config(&path).expect("load");
    cfg.failure_policy = FailurePolicy::Skip;
    write_config(&path, &cfg).expect("rewrite");

    let output = grower(temp.path(), &["search", "--goal", "letters"]);

    assert_eq!(output.status.code(), Some(exit_codes::NO_DECISION));
}

#[test]
fn grow_prints_artifact() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), &["printf", "line"], &["printf", "4"]);

    let output = grower(
        temp.path(),
        &["grow", "--goal", "lines", "--state", "title"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "title\nline\nline\n"
    );
}

#[test]
fn goal_file_is_read() {
    let temp = tempfile::tempdir().expect("tempdir");
    write_test_config(temp.path(), &["printf", "A"], &["printf", "5"]);
    std::fs::write(temp.path().join("GOAL.md"), "letters\n").expect("write goal");

    let output = grower(temp.path(), &["search", "--goal-file", "GOAL.md"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");

    let first = grower(temp.path(), &["init"]);
    assert_eq!(first.status.code(), Some(exit_codes::OK));
    let cfg = load_config(&temp.path().join("grower.toml")).expect("load");
    assert_eq!(cfg, SearchConfig::default());

    let second = grower(temp.path(), &["init"]);
    assert_eq!(second.status.code(), Some(exit_codes::INVALID));

    let forced = grower(temp.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(exit_codes::OK));
}
