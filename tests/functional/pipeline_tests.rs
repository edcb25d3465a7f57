//! Functional tests for test sessions run against a query-tracking store

use crate::common::{sample_data, TestFixture, SITE_NAME};
use querydiff::config::TestInfo;
use querydiff::pipeline::StageOutcome;
use querydiff::{fingerprint, Pipeline, QuerydiffError, Session, Stage, StatVariant};
use std::cell::RefCell;

#[test]
fn test_standard_session_frequent() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_site(&sample_data::store_rows()).unwrap();
    fixture
        .create_baseline(StatVariant::MostFrequent, sample_data::frequent_baseline())
        .unwrap();

    let visited = RefCell::new(Vec::new());
    let warmer = |url: &str| -> anyhow::Result<()> {
        visited.borrow_mut().push(url.to_string());
        Ok(())
    };

    let session = Session::open(&fixture.workspace, SITE_NAME)
        .unwrap()
        .with_warmer(&warmer);
    let outcomes = Pipeline::standard(StatVariant::MostFrequent).run(&session).unwrap();

    assert_eq!(
        outcomes[..4],
        [
            StageOutcome::Completed(Stage::EnableQueryStore),
            StageOutcome::Completed(Stage::ClearQueryStore),
            StageOutcome::Completed(Stage::CreateView(StatVariant::MostFrequent)),
            StageOutcome::Completed(Stage::WarmUp),
        ]
    );
    assert_eq!(visited.borrow().as_slice(), ["https://shop.local"]);

    let report = outcomes[4].report().unwrap();
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].fingerprint, fingerprint("SELECT * FROM orders"));
    assert_eq!(report.rows[0].current_executions, 12);
    assert_eq!(report.rows[1].current_executions, 4);
    assert_eq!(report.diagnostics.unmatched_current.len(), 1);

    assert_eq!(
        fixture.store_log().unwrap(),
        vec!["on shop", "clear shop", "frequent view"]
    );
}

#[test]
fn test_expensive_session_reads_durations() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_site(&sample_data::store_rows()).unwrap();
    fixture
        .create_baseline(StatVariant::MostExpensive, sample_data::expensive_baseline())
        .unwrap();

    let session = Session::open(&fixture.workspace, SITE_NAME).unwrap();
    let pipeline = Pipeline::new()
        .then(Stage::CreateView(StatVariant::MostExpensive))
        .then(Stage::Compare(StatVariant::MostExpensive));
    let outcomes = pipeline.run(&session).unwrap();

    let report = outcomes[1].report().unwrap();
    let orders = &report.rows[0];
    assert_eq!(orders.baseline_duration_ms, Some(50.0));
    assert_eq!(orders.current_duration_ms, Some(36.0));
    assert_eq!(orders.current_average_duration_ms, Some(3.0));
}

#[test]
fn test_failed_warm_up_stops_session() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_site(&sample_data::store_rows()).unwrap();

    let warmer = |_: &str| -> anyhow::Result<()> { anyhow::bail!("site unreachable") };
    let session = Session::open(&fixture.workspace, SITE_NAME)
        .unwrap()
        .with_warmer(&warmer);

    let err = Pipeline::standard(StatVariant::MostFrequent)
        .run(&session)
        .unwrap_err();
    assert!(matches!(err, QuerydiffError::WarmUp { .. }));

    // Stages before the warm-up already ran
    assert_eq!(fixture.store_log().unwrap().len(), 3);
}

#[test]
fn test_missing_baseline_fails_compare_stage() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_site(&sample_data::store_rows()).unwrap();

    let session = Session::open(&fixture.workspace, SITE_NAME).unwrap();
    let err = Pipeline::new()
        .then(Stage::Compare(StatVariant::MostFrequent))
        .run(&session)
        .unwrap_err();

    match err {
        QuerydiffError::SourceNotFound { path } => {
            assert!(path.ends_with("MostFrequentQueries.csv"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_blank_connection_string_rejected() {
    let fixture = TestFixture::new().unwrap();
    let target = TestInfo {
        site_name: "Blank".to_string(),
        db_connection_string: "   ".to_string(),
        url: "https://blank.local".to_string(),
        db_name: String::new(),
    };

    let session = Session::new(&fixture.workspace, target);
    let err = Pipeline::standard(StatVariant::MostFrequent)
        .run(&session)
        .unwrap_err();
    assert!(matches!(err, QuerydiffError::Config { .. }));
}

#[test]
fn test_unknown_target_rejected() {
    let fixture = TestFixture::new().unwrap();
    fixture.create_site(&sample_data::store_rows()).unwrap();

    let err = Session::open(&fixture.workspace, "Forum").err().unwrap();
    assert!(matches!(err, QuerydiffError::Config { .. }));
    assert!(err.to_string().contains("Forum"));
}
