//! Functional tests for comparing baseline and current statistics

use crate::common::{assertions, sample_data, CliTestRunner, TestFixture};
use querydiff::compare::{CompareOptions, DuplicatePolicy, SortOrder};
use querydiff::data::DataProcessor;
use querydiff::dataset::SchemaCheck;
use querydiff::{compare_datasets, fingerprint, QuerydiffError, StatVariant};

fn load(fixture: &TestFixture, name: &str, content: &str, variant: StatVariant) -> querydiff::Dataset {
    let path = fixture.create_csv(name, content).unwrap();
    DataProcessor::new()
        .unwrap()
        .load_csv(&path, name)
        .unwrap()
        .reconcile(variant, SchemaCheck::Strict)
        .unwrap()
}

#[test]
fn test_compare_matches_reformatted_queries() {
    let fixture = TestFixture::new().unwrap();
    let variant = StatVariant::MostFrequent;
    let baseline = load(&fixture, "baseline.csv", sample_data::frequent_baseline(), variant);
    let current = load(&fixture, "current.csv", sample_data::frequent_current(), variant);

    let report = compare_datasets(&baseline, &current, variant, &CompareOptions::default()).unwrap();

    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].fingerprint, fingerprint("SELECT * FROM orders"));
    assert_eq!(report.rows[0].baseline_executions, 10);
    assert_eq!(report.rows[0].current_executions, 15);
    assert_eq!(report.rows[1].fingerprint, fingerprint("SELECT * FROM customers"));
    assert_eq!(report.rows[1].current_executions, 3);

    assert_eq!(report.diagnostics.unmatched_baseline.len(), 1);
    assert_eq!(report.diagnostics.unmatched_baseline[0].row, 3);
    assert_eq!(report.diagnostics.unmatched_current.len(), 1);
    assert_eq!(
        report.diagnostics.unmatched_current[0].fingerprint,
        fingerprint("SELECT * FROM audit")
    );
}

#[test]
fn test_compare_expensive_carries_durations() {
    let fixture = TestFixture::new().unwrap();
    let variant = StatVariant::MostExpensive;
    let baseline = load(&fixture, "baseline.csv", sample_data::expensive_baseline(), variant);
    let current = load(
        &fixture,
        "current.csv",
        "Sql,Executions,TotalDurationMS,AverageDurationMS\nSELECT * FROM orders,20,40,2\n",
        variant,
    );

    let report = compare_datasets(&baseline, &current, variant, &CompareOptions::default()).unwrap();

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.baseline_duration_ms, Some(50.0));
    assert_eq!(row.current_duration_ms, Some(40.0));
    assert_eq!(row.baseline_average_duration_ms, Some(5.0));
    assert_eq!(row.current_average_duration_ms, Some(2.0));
    assert_eq!(row.duration_delta(), Some(-10.0));
}

#[test]
fn test_compare_command_writes_json() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_baseline(StatVariant::MostFrequent, sample_data::frequent_baseline())
        .unwrap();
    fixture.create_csv("current.csv", sample_data::frequent_current()).unwrap();

    runner.expect_success(&[
        "compare",
        "--variant",
        "frequent",
        "--current",
        "current.csv",
        "--format",
        "json",
        "--output",
        "reports/frequent.json",
    ]);

    let rows = assertions::read_report(&fixture.root().join("reports").join("frequent.json"));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].baseline_executions, 10);
    assert_eq!(rows[0].current_executions, 15);
}

#[test]
fn test_compare_command_sorting() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_baseline(StatVariant::MostFrequent, sample_data::frequent_baseline())
        .unwrap();
    fixture.create_csv("current.csv", sample_data::frequent_current()).unwrap();

    runner.expect_success(&[
        "compare",
        "--variant",
        "frequent",
        "--current",
        "current.csv",
        "--sort",
        "executions",
        "--compact",
        "--output",
        "sorted.json",
    ]);

    let content = std::fs::read_to_string(fixture.root().join("sorted.json")).unwrap();
    assert!(!content.contains('\n'));

    let rows = querydiff::report::deserialize(&content).unwrap();
    let deltas: Vec<i64> = rows.iter().map(|r| r.executions_delta()).collect();
    assert_eq!(deltas, vec![5, -1]);
}

#[test]
fn test_compare_with_explicit_baseline() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_csv("old.csv", "Sql,Executions\nSELECT 1,1\n").unwrap();
    fixture.create_csv("new.csv", "Sql,Executions\nSELECT  1,2\n").unwrap();

    runner.expect_success(&[
        "compare", "--variant", "frequent", "--baseline", "old.csv", "--current", "new.csv",
        "--output", "out.json",
    ]);

    let rows = assertions::read_report(&fixture.root().join("out.json"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fingerprint, fingerprint("SELECT 1"));
}

#[test]
fn test_duplicate_policies() {
    let fixture = TestFixture::new().unwrap();
    let variant = StatVariant::MostFrequent;
    let baseline = load(&fixture, "baseline.csv", "Sql,Executions\nSELECT 1,2\nSELECT  1,3\n", variant);
    let current = load(&fixture, "current.csv", "Sql,Executions\nSELECT 1,10\n", variant);

    let aggregate = compare_datasets(&baseline, &current, variant, &CompareOptions::default()).unwrap();
    assert_eq!(aggregate.rows.len(), 1);
    assert_eq!(aggregate.rows[0].baseline_executions, 5);

    let cross = CompareOptions {
        duplicates: DuplicatePolicy::CrossProduct,
        sort: SortOrder::None,
    };
    let report = compare_datasets(&baseline, &current, variant, &cross).unwrap();
    let executions: Vec<i64> = report.rows.iter().map(|r| r.baseline_executions).collect();
    assert_eq!(executions, vec![2, 3]);

    let strict = CompareOptions {
        duplicates: DuplicatePolicy::Error,
        sort: SortOrder::None,
    };
    let err = compare_datasets(&baseline, &current, variant, &strict).unwrap_err();
    match err {
        QuerydiffError::DuplicateFingerprint { dataset, first_row, second_row, .. } => {
            assert_eq!(dataset, "baseline");
            assert_eq!((first_row, second_row), (1, 2));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_duplicate_error_policy_from_cli() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_baseline(StatVariant::MostFrequent, "Sql,Executions\nSELECT 1,2\nSELECT 1,3\n")
        .unwrap();
    fixture.create_csv("current.csv", "Sql,Executions\nSELECT 1,1\n").unwrap();

    let err = runner.expect_failure(&[
        "compare", "--variant", "frequent", "--current", "current.csv", "--duplicates", "error",
    ]);
    assert!(matches!(err, QuerydiffError::DuplicateFingerprint { .. }));
}

#[test]
fn test_no_overlap_yields_empty_result() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_baseline(StatVariant::MostFrequent, "Sql,Executions\nSELECT 1,2\n")
        .unwrap();
    fixture.create_csv("current.csv", "Sql,Executions\nSELECT 2,3\n").unwrap();

    runner.expect_success(&[
        "compare", "--variant", "frequent", "--current", "current.csv", "--output", "empty.json",
    ]);

    let content = std::fs::read_to_string(fixture.root().join("empty.json")).unwrap();
    assert_eq!(content, "[]");
}
