//! Integration tests for the init and targets commands

use crate::common::{assertions, CliTestRunner};
use querydiff::config::SETTINGS_FILE;
use std::fs;

#[test]
fn test_init_command_success() {
    let runner = CliTestRunner::new().unwrap();
    runner.expect_success(&["init"]);

    let root = runner.fixture().root();
    assertions::assert_file_exists_and_not_empty(&root.join(SETTINGS_FILE));
    assertions::assert_file_exists_and_not_empty(&root.join("TestInfos.json"));
    assertions::assert_dir_exists(&root.join("BenchMarks"));
    assertions::assert_dir_exists(&root.join("SqlScripts"));
}

#[test]
fn test_init_command_is_idempotent() {
    let runner = CliTestRunner::new().unwrap();
    runner.expect_success(&["init"]);
    runner.expect_success(&["init"]);
}

#[test]
fn test_init_command_with_force_resets_settings() {
    let runner = CliTestRunner::new().unwrap();
    let settings_path = runner.fixture().root().join(SETTINGS_FILE);
    fs::write(&settings_path, r#"{ "sort": "fingerprint" }"#).unwrap();

    runner.expect_success(&["init"]);
    assert!(fs::read_to_string(&settings_path).unwrap().contains("fingerprint"));

    runner.expect_success(&["init", "--force"]);
    let content = fs::read_to_string(&settings_path).unwrap();
    assert!(content.contains("\"sort\": \"none\""));
}

#[test]
fn test_init_with_workspace_flag() {
    let runner = CliTestRunner::new().unwrap();
    let nested = runner.fixture().root().join("site");
    runner.expect_success(&["init", "--workspace", nested.to_str().unwrap()]);
    assertions::assert_dir_exists(&nested.join("BenchMarks"));
}

#[test]
fn test_targets_command() {
    let runner = CliTestRunner::new().unwrap();
    runner.fixture().create_test_infos(":memory:").unwrap();
    runner.expect_success(&["targets"]);
}

#[test]
fn test_targets_command_invalid_file() {
    let runner = CliTestRunner::new().unwrap();
    fs::write(runner.fixture().workspace.test_infos_path(), "not json").unwrap();

    let err = runner.expect_failure(&["targets"]);
    assert!(matches!(err, querydiff::QuerydiffError::Config { .. }));
}

#[test]
fn test_fingerprint_command() {
    let runner = CliTestRunner::new().unwrap();
    runner.expect_success(&["fingerprint", "SELECT 1"]);

    let sql_path = runner.fixture().root().join("query.sql");
    fs::write(&sql_path, "SELECT *\nFROM orders\n").unwrap();
    runner.expect_success(&["fingerprint", "--file", sql_path.to_str().unwrap()]);

    let err = runner.expect_failure(&["fingerprint"]);
    assert!(err.to_string().contains("No SQL statement found"));
}
