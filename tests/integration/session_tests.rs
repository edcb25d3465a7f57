//! Integration tests for commands that talk to a query-tracking store

use crate::common::{assertions, sample_data, CliTestRunner, SITE_NAME};
use querydiff::data::DataProcessor;
use querydiff::{fingerprint, QuerydiffError, StatVariant};

#[test]
fn test_setup_runs_all_scripts_by_default() {
    let runner = CliTestRunner::new().unwrap();
    runner.fixture().create_site(&sample_data::store_rows()).unwrap();

    runner.expect_success(&["setup", "--target", SITE_NAME]);

    assert_eq!(
        runner.fixture().store_log().unwrap(),
        vec!["on shop", "clear shop", "frequent view", "expensive view"]
    );
}

#[test]
fn test_setup_selected_scripts() {
    let runner = CliTestRunner::new().unwrap();
    runner.fixture().create_site(&sample_data::store_rows()).unwrap();

    runner.expect_success(&["setup", "--target", SITE_NAME, "--clear"]);
    assert_eq!(runner.fixture().store_log().unwrap(), vec!["clear shop"]);
}

#[test]
fn test_setup_missing_script() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_site(&sample_data::store_rows()).unwrap();
    std::fs::remove_file(fixture.workspace.scripts_dir().join("QueryStoreOn.sql")).unwrap();

    let err = runner.expect_failure(&["setup", "--target", SITE_NAME, "--enable"]);
    assert!(matches!(err, QuerydiffError::SourceNotFound { .. }));
}

#[test]
fn test_setup_unknown_target() {
    let runner = CliTestRunner::new().unwrap();
    runner.fixture().create_site(&sample_data::store_rows()).unwrap();

    let err = runner.expect_failure(&["setup", "--target", "Forum"]);
    assert!(matches!(err, QuerydiffError::Config { .. }));
}

#[test]
fn test_capture_then_compare_against_itself() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_site(&sample_data::store_rows()).unwrap();

    runner.expect_success(&["setup", "--target", SITE_NAME, "--views"]);
    runner.expect_success(&["capture", "--target", SITE_NAME, "--variant", "expensive"]);

    let baseline_path = fixture.workspace.baseline_path(StatVariant::MostExpensive);
    assertions::assert_file_exists_and_not_empty(&baseline_path);
    let baseline = DataProcessor::new().unwrap().load_csv(&baseline_path, "baseline").unwrap();
    assert_eq!(
        baseline.columns(),
        ["Sql", "Executions", "TotalDurationMS", "AverageDurationMS"]
    );
    assert_eq!(baseline.row_count(), 3);

    runner.expect_success(&[
        "compare", "--variant", "expensive", "--target", SITE_NAME, "--output", "self.json",
    ]);

    let rows = assertions::read_report(&fixture.root().join("self.json"));
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.executions_delta(), 0);
        assert_eq!(row.duration_delta(), Some(0.0));
    }
}

#[test]
fn test_run_command_writes_report() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_site(&sample_data::store_rows()).unwrap();
    fixture
        .create_baseline(StatVariant::MostFrequent, sample_data::frequent_baseline())
        .unwrap();

    runner.expect_success(&[
        "run", "--target", SITE_NAME, "--variant", "frequent", "--output", "run.json",
    ]);

    let rows = assertions::read_report(&fixture.root().join("run.json"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].fingerprint, fingerprint("SELECT * FROM orders"));
    assert_eq!(rows[0].current_executions, 12);
}

#[cfg(unix)]
#[test]
fn test_run_command_with_failing_warm_up() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_site(&sample_data::store_rows()).unwrap();
    fixture
        .create_baseline(StatVariant::MostFrequent, sample_data::frequent_baseline())
        .unwrap();

    let err = runner.expect_failure(&[
        "run", "--target", SITE_NAME, "--variant", "frequent", "--warm-up", "false",
    ]);
    assert!(matches!(err, QuerydiffError::WarmUp { .. }));
}

#[test]
fn test_connection_string_from_env_file() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let store = fixture.create_store(&sample_data::store_rows()).unwrap();
    fixture.create_admin_scripts().unwrap();
    fixture.create_test_infos("{QUERYDIFF_SESSION_TEST_STORE}").unwrap();
    std::fs::write(
        fixture.root().join(".env"),
        format!("QUERYDIFF_SESSION_TEST_STORE={}\n", store.display()),
    )
    .unwrap();

    runner.expect_success(&["setup", "--target", SITE_NAME, "--enable"]);
    assert_eq!(fixture.store_log().unwrap(), vec!["on shop"]);
}
