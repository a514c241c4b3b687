use anyhow::{Result, anyhow};
use comfy_table::{CellAlignment, Table};
use tracing::info;

use etl_cli::pipeline::{CleanRequest, FolderRun, clean_folder, write_summary_json};
use etl_core::CleanerFactory;
use etl_model::{FailurePolicy, LogicalType, TableSchema};

use crate::cli::{CleanArgs, SchemaArgs};
use crate::summary::{align_column, apply_table_style, header_cell};

pub fn build_request(args: &CleanArgs) -> CleanRequest {
    let policy = if args.skip_on_error {
        FailurePolicy::SkipOnError
    } else {
        FailurePolicy::FailFast
    };
    CleanRequest::new(&args.input_dir)
        .with_output_dir(args.output_dir.clone())
        .with_quarantine_dir(args.quarantine_dir.clone())
        .with_tables(args.tables.clone())
        .with_dry_run(args.dry_run)
        .with_failure_policy(policy)
}

pub fn run_clean(request: &CleanRequest, args: &CleanArgs) -> Result<FolderRun> {
    let result = clean_folder(request, CleanerFactory::olist())?;
    if let Some(path) = &args.summary_json {
        write_summary_json(&result.summary, path)?;
        info!(path = %path.display(), "wrote run summary");
    }
    Ok(result)
}

pub fn run_tables() -> Result<()> {
    let factory = CleanerFactory::olist();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Cleaner"),
        header_cell("Columns"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for schema in factory.registry().tables() {
        table.add_row(vec![
            schema.name.clone(),
            variant_label(&factory, &schema.name).to_string(),
            schema.len().to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_schema(args: &SchemaArgs) -> Result<()> {
    let factory = CleanerFactory::olist();
    let schema = factory
        .registry()
        .lookup(&args.table)
        .ok_or_else(|| anyhow!("unknown table: {}", args.table))?;
    println!(
        "Table: {} ({})",
        schema.name,
        variant_label(&factory, &schema.name)
    );
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Nullable"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    for (column, logical_type) in schema_columns(schema, args.column_type) {
        let nullable = if logical_type.allows_missing() {
            "yes"
        } else {
            "no"
        };
        table.add_row(vec![
            column.to_string(),
            logical_type.to_string(),
            nullable.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Cleaner label for a registry table; a table without a cleaner is shown as such.
fn variant_label(factory: &CleanerFactory, table_name: &str) -> &'static str {
    factory
        .resolve(table_name)
        .map_or("unregistered", |variant| variant.label())
}

fn schema_columns(
    schema: &TableSchema,
    filter: Option<LogicalType>,
) -> Vec<(&str, LogicalType)> {
    schema
        .columns()
        .filter(|(_, logical_type)| filter.is_none_or(|wanted| wanted == *logical_type))
        .collect()
}
