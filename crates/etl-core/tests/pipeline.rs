//! Tests for the cleaning orchestrator and its failure policies.

use polars::df;
use polars::prelude::DataFrame;

use etl_core::{CleanerFactory, CleaningError, CleaningPipeline, TableOutcome};
use etl_model::{CleaningOptions, FailurePolicy, TableStatus};

fn customers() -> DataFrame {
    df! {
        "customer_id" => ["c1", "c2", "c1"],
        "customer_zip_code_prefix" => ["01001", "20040", "01001"],
    }
    .unwrap()
}

fn bad_items() -> DataFrame {
    df! {
        "order_id" => ["o1"],
        "order_item_id" => ["one"],
    }
    .unwrap()
}

fn sellers() -> DataFrame {
    df! {
        "seller_id" => ["s1"],
        "seller_zip_code_prefix" => [None::<&str>],
    }
    .unwrap()
}

#[test]
fn fail_fast_aborts_on_first_error() {
    let pipeline = CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::fail_fast());

    let err = pipeline
        .run([
            ("Customers", customers()),
            ("OrderItems", bad_items()),
            ("Sellers", sellers()),
        ])
        .unwrap_err();

    assert!(matches!(err, CleaningError::Coercion { ref table, .. } if table == "OrderItems"));
}

#[test]
fn skip_on_error_omits_failed_tables() {
    let pipeline =
        CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::skip_on_error());

    let run = pipeline
        .run([
            ("Customers", customers()),
            ("OrderItems", bad_items()),
            ("Warehouses", sellers()),
            ("Sellers", sellers()),
        ])
        .unwrap();

    assert_eq!(
        run.requested_tables(),
        vec!["Customers", "OrderItems", "Warehouses", "Sellers"]
    );
    assert_eq!(run.failed_tables(), vec!["OrderItems", "Warehouses"]);
    assert_eq!(run.tables.keys().collect::<Vec<_>>(), vec!["Customers", "Sellers"]);
    assert!(!run.is_complete());
    assert_eq!(run.get("Customers").unwrap().stats.duplicates_removed, 1);

    match &run.outcomes[2] {
        TableOutcome::Failed { variant, error, .. } => {
            assert_eq!(variant, "unregistered");
            assert!(matches!(error, CleaningError::UnregisteredTable { .. }));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn every_table_succeeds_under_both_policies() {
    for policy in [FailurePolicy::FailFast, FailurePolicy::SkipOnError] {
        let pipeline = CleaningPipeline::new(
            CleanerFactory::olist(),
            CleaningOptions::default().with_failure_policy(policy),
        );
        let run = pipeline
            .run([("Customers", customers()), ("Sellers", sellers())])
            .unwrap();
        assert!(run.is_complete());
        assert_eq!(run.tables.len(), 2);
    }
}

#[test]
fn repeated_table_name_is_an_error() {
    let fail_fast = CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::default());
    let err = fail_fast
        .run([("Sellers", sellers()), ("Sellers", sellers())])
        .unwrap_err();
    assert!(matches!(err, CleaningError::DuplicateTable { .. }));

    let skip = CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::skip_on_error());
    let run = skip
        .run([("Sellers", sellers()), ("Sellers", sellers())])
        .unwrap();
    assert_eq!(run.tables.len(), 1);
    assert_eq!(run.failed_tables(), vec!["Sellers"]);
}

#[test]
fn differently_spelled_names_of_one_table_are_duplicates() {
    let fail_fast = CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::fail_fast());
    let err = fail_fast
        .run([("Sellers", sellers()), ("sellers", sellers())])
        .unwrap_err();
    match err {
        CleaningError::DuplicateTable { table } => assert_eq!(table, "sellers"),
        other => panic!("unexpected error: {other}"),
    }

    let skip = CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::skip_on_error());
    let run = skip
        .run([("Order_Items", bad_items()), ("Sellers", sellers()), ("SELLERS", sellers())])
        .unwrap();
    assert_eq!(run.tables.keys().map(String::as_str).collect::<Vec<_>>(), vec!["Sellers"]);
    assert_eq!(run.failed_tables(), vec!["Order_Items", "SELLERS"]);
}

#[test]
fn summary_reports_each_outcome() {
    let pipeline =
        CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::skip_on_error());
    let run = pipeline
        .run([("OrderItems", bad_items()), ("Customers", customers())])
        .unwrap();

    let summary = run.summary();

    assert_eq!(summary.tables.len(), 2);
    assert_eq!(summary.tables[0].status, TableStatus::Failed);
    assert_eq!(summary.tables[1].status, TableStatus::Cleaned);
    assert_eq!(summary.total_input_rows(), 3);
    assert_eq!(summary.total_output_rows(), 2);
}

#[test]
fn into_frames_hands_over_cleaned_data() {
    let pipeline = CleaningPipeline::new(CleanerFactory::olist(), CleaningOptions::default());
    let frames = pipeline
        .run(vec![("Customers".to_string(), customers())])
        .unwrap()
        .into_frames();
    assert_eq!(frames["Customers"].height(), 2);
}
