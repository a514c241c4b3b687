//! Tests for etl-model types.

use etl_model::{
    CleaningOptions, FailurePolicy, LogicalType, RunSummary, SchemaRegistry, TableStats,
    TableStatus, TableSummary,
};

#[test]
fn run_summary_serializes_to_json() {
    let summary = RunSummary {
        policy: FailurePolicy::SkipOnError,
        tables: vec![
            TableSummary::cleaned(
                "Customers",
                "keyed",
                TableStats {
                    input_rows: 3,
                    duplicates_removed: 1,
                    status_rejected: 0,
                    order_rejected: 0,
                    output_rows: 2,
                },
            ),
            TableSummary::failed("Sellers", "generic", "bad zip code"),
        ],
    };

    let value = serde_json::to_value(&summary).expect("serialize summary");
    assert_eq!(value["policy"], "skip_on_error");
    assert_eq!(value["tables"][0]["status"], "cleaned");
    assert_eq!(value["tables"][0]["stats"]["output_rows"], 2);
    assert!(value["tables"][0].get("error").is_none());
    assert_eq!(value["tables"][1]["status"], "failed");
    assert!(value["tables"][1].get("stats").is_none());

    let back: RunSummary = serde_json::from_value(value).expect("deserialize summary");
    assert_eq!(back, summary);
    assert_eq!(back.tables[1].status, TableStatus::Failed);
}

#[test]
fn default_options_fail_fast_and_keep_rejected() {
    let options = CleaningOptions::default();
    assert_eq!(options.failure_policy, FailurePolicy::FailFast);
    assert!(options.keep_rejected);

    let options = CleaningOptions::skip_on_error().with_keep_rejected(false);
    assert_eq!(options.failure_policy, FailurePolicy::SkipOnError);
    assert!(!options.keep_rejected);
}

#[test]
fn logical_type_labels_round_trip_through_serde() {
    for logical_type in LogicalType::ALL {
        let json = serde_json::to_string(&logical_type).expect("serialize");
        assert_eq!(json, format!("\"{}\"", logical_type.as_str()));
        let parsed: LogicalType = logical_type.as_str().parse().expect("parse label");
        assert_eq!(parsed, logical_type);
    }
}

#[test]
fn olist_schemas_match_table_contracts() {
    let registry = SchemaRegistry::olist();
    let customers = registry.lookup("customers").expect("customers schema");
    assert_eq!(
        customers.logical_type("customer_zip_code_prefix"),
        Some(LogicalType::Int64)
    );
    let sellers = registry.lookup("Sellers").expect("sellers schema");
    assert_eq!(
        sellers.logical_type("seller_zip_code_prefix"),
        Some(LogicalType::NullableInt64)
    );
    let items = registry.lookup("Order_Items").expect("order items schema");
    assert_eq!(items.logical_type("price"), Some(LogicalType::Float64));
    assert_eq!(
        items.logical_type("shipping_limit_date"),
        Some(LogicalType::Timestamp)
    );
    let names: Vec<_> = registry.tables().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"ProductCategoryNameTranslation"));
}
