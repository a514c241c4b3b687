//! Folder-level runs over temporary CSV exports.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use etl_cli::pipeline::{CleanRequest, clean_folder, write_summary_json};
use etl_core::{CleanerFactory, REJECTION_REASON_COLUMN};
use etl_ingest::read_table_csv;
use etl_model::{FailurePolicy, TableStats, TableStatus};

const ORDERS_CSV: &str = "\
order_id,customer_id,order_status,order_purchase_timestamp,order_approved_at,order_delivered_carrier_date,order_delivered_customer_date,order_estimated_delivery_date
o1,c1,delivered,2017-10-02 10:56:33,2017-10-02 11:07:15,2017-10-04 19:55:00,2017-10-10 21:25:13,2017-10-18 00:00:00
o1,c1,delivered,2017-10-02 10:56:33,2017-10-02 11:07:15,2017-10-04 19:55:00,2017-10-10 21:25:13,2017-10-18 00:00:00
o2,c2,delivered,2018-07-24 20:41:37,2018-07-26 03:24:27,,2018-08-07 15:27:45,2018-08-13 00:00:00
o3,c3,shipped,2018-08-08 08:38:49,2018-08-08 08:55:23,2018-08-07 13:50:00,,2018-09-04 00:00:00
";

const SELLERS_CSV: &str = "\
seller_id,seller_zip_code_prefix,seller_city,seller_state
s1,13023,campinas,SP
s2,,sao paulo,SP
";

const BAD_ORDER_ITEMS_CSV: &str = "\
order_id,order_item_id,product_id,seller_id,shipping_limit_date,price,freight_value
o1,abc,p1,s1,2017-09-19 09:45:35,58.90,13.29
";

fn write(dir: &Path, file: &str, contents: &str) {
    fs::write(dir.join(file), contents).expect("write fixture");
}

fn raw_folder() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    write(dir.path(), "olist_orders_dataset.csv", ORDERS_CSV);
    write(dir.path(), "olist_sellers_dataset.csv", SELLERS_CSV);
    dir
}

#[test]
fn cleans_folder_and_writes_outputs() {
    let input = raw_folder();
    let out = TempDir::new().expect("temp dir");
    let request = CleanRequest::new(input.path())
        .with_output_dir(Some(out.path().join("cleaned")))
        .with_quarantine_dir(Some(out.path().join("quarantine")));

    let result = clean_folder(&request, CleanerFactory::olist()).expect("clean folder");

    assert!(!result.has_failures());
    assert_eq!(result.summary.policy, FailurePolicy::FailFast);
    let orders = result
        .summary
        .tables
        .iter()
        .find(|table| table.table == "orders")
        .expect("orders summary");
    assert_eq!(orders.variant, "lifecycle");
    assert_eq!(
        orders.stats,
        Some(TableStats {
            input_rows: 4,
            duplicates_removed: 1,
            status_rejected: 1,
            order_rejected: 1,
            output_rows: 1,
        })
    );

    let cleaned = read_table_csv(&out.path().join("cleaned").join("orders.csv")).expect("read");
    assert_eq!(cleaned.height(), 1);
    let rejected = read_table_csv(&out.path().join("quarantine").join("orders_rejected.csv"))
        .expect("read rejected");
    assert_eq!(rejected.height(), 2);
    assert!(rejected.column(REJECTION_REASON_COLUMN).is_ok());

    let sellers = result
        .written
        .iter()
        .find(|table| table.table == "sellers")
        .expect("sellers written");
    assert!(sellers.rejected.is_none());
    let sellers = read_table_csv(&sellers.output).expect("read sellers");
    assert_eq!(sellers.height(), 2);
}

#[test]
fn default_output_dir_sits_under_input() {
    let input = raw_folder();
    let request = CleanRequest::new(input.path());

    let result = clean_folder(&request, CleanerFactory::olist()).expect("clean folder");

    assert_eq!(result.written.len(), 2);
    assert!(input.path().join("cleaned").join("orders.csv").is_file());
    assert!(!input.path().join("cleaned").join("orders_rejected.csv").exists());
}

#[test]
fn fail_fast_aborts_before_writing() {
    let input = raw_folder();
    write(input.path(), "olist_order_items_dataset.csv", BAD_ORDER_ITEMS_CSV);
    let out = TempDir::new().expect("temp dir");
    let request = CleanRequest::new(input.path()).with_output_dir(Some(out.path().join("cleaned")));

    let error = clean_folder(&request, CleanerFactory::olist()).expect_err("run must fail");

    let message = format!("{error:#}");
    assert!(message.contains("order_item_id"), "{message}");
    assert!(!out.path().join("cleaned").exists());
}

#[test]
fn skip_on_error_reports_failures_and_writes_the_rest() {
    let input = raw_folder();
    write(input.path(), "olist_order_items_dataset.csv", BAD_ORDER_ITEMS_CSV);
    write(input.path(), "notes.csv", "note\nhello\n");
    let out = TempDir::new().expect("temp dir");
    let request = CleanRequest::new(input.path())
        .with_output_dir(Some(out.path().to_path_buf()))
        .with_failure_policy(FailurePolicy::SkipOnError);

    let result = clean_folder(&request, CleanerFactory::olist()).expect("clean folder");

    assert!(result.has_failures());
    assert_eq!(result.summary.failed_count(), 2);
    assert_eq!(result.summary.cleaned_count(), 2);
    let notes = result
        .summary
        .tables
        .iter()
        .find(|table| table.table == "notes")
        .expect("notes summary");
    assert_eq!(notes.status, TableStatus::Failed);
    assert_eq!(notes.variant, "unregistered");
    assert!(out.path().join("orders.csv").is_file());
    assert!(out.path().join("sellers.csv").is_file());
    assert!(!out.path().join("order_items.csv").exists());
    assert!(!out.path().join("notes.csv").exists());
}

#[test]
fn skip_on_error_records_unreadable_files() {
    let input = raw_folder();
    write(input.path(), "olist_geolocation_dataset.csv", "");
    let request = CleanRequest::new(input.path())
        .with_dry_run(true)
        .with_failure_policy(FailurePolicy::SkipOnError);

    let result = clean_folder(&request, CleanerFactory::olist()).expect("clean folder");

    let geolocation = result
        .summary
        .tables
        .iter()
        .find(|table| table.table == "geolocation")
        .expect("geolocation summary");
    assert!(geolocation.is_failed());
    assert_eq!(geolocation.variant, "generic");
    assert!(geolocation.stats.is_none());
}

#[test]
fn dry_run_writes_nothing() {
    let input = raw_folder();
    let request = CleanRequest::new(input.path()).with_dry_run(true);

    let result = clean_folder(&request, CleanerFactory::olist()).expect("clean folder");

    assert_eq!(result.summary.cleaned_count(), 2);
    assert!(result.written.is_empty());
    assert!(!input.path().join("cleaned").exists());
}

#[test]
fn table_filter_selects_and_reports_missing() {
    let input = raw_folder();
    let request = CleanRequest::new(input.path())
        .with_dry_run(true)
        .with_tables(vec!["Sellers".to_string(), "OrderReviews".to_string()]);

    let result = clean_folder(&request, CleanerFactory::olist()).expect("clean folder");

    let tables: Vec<&str> = result
        .summary
        .tables
        .iter()
        .map(|table| table.table.as_str())
        .collect();
    assert_eq!(tables, vec!["sellers"]);
    assert_eq!(result.missing_tables, vec!["OrderReviews".to_string()]);
}

#[test]
fn missing_input_dir_is_an_error() {
    let root = TempDir::new().expect("temp dir");
    let request = CleanRequest::new(root.path().join("absent"));

    let error = clean_folder(&request, CleanerFactory::olist()).expect_err("must fail");

    assert!(format!("{error:#}").contains("failed to list CSV files"));
}

#[test]
fn summary_json_is_written() {
    let input = raw_folder();
    let request = CleanRequest::new(input.path()).with_dry_run(true);
    let result = clean_folder(&request, CleanerFactory::olist()).expect("clean folder");
    let path = input.path().join("reports").join("summary.json");

    write_summary_json(&result.summary, &path).expect("write summary");

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read summary")).expect("json");
    assert_eq!(value["policy"], "fail_fast");
    assert_eq!(value["tables"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["tables"][0]["table"], "orders");
    assert_eq!(value["tables"][0]["stats"]["output_rows"], 1);
}
