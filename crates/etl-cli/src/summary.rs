use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use etl_cli::pipeline::{CleanRequest, FolderRun};
use etl_model::{TableStatus, TableSummary};

pub fn print_summary(request: &CleanRequest, result: &FolderRun) {
    println!("Input: {}", request.input_dir.display());
    if request.dry_run {
        println!("Output: (dry run)");
    } else {
        println!("Output: {}", request.output_dir.display());
    }
    if let Some(dir) = &request.quarantine_dir {
        println!("Quarantine: {}", dir.display());
    }
    println!("Policy: {}", result.summary.policy);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Cleaner"),
        header_cell("Status"),
        header_cell("Input"),
        header_cell("Duplicates"),
        header_cell("Status rejected"),
        header_cell("Order rejected"),
        header_cell("Output"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    align_column(&mut table, 2, CellAlignment::Center);

    let mut total_duplicates = 0usize;
    for summary in &result.summary.tables {
        let stats = summary.stats;
        if let Some(stats) = stats {
            total_duplicates += stats.duplicates_removed;
        }
        table.add_row(vec![
            Cell::new(&summary.table).add_attribute(Attribute::Bold),
            Cell::new(&summary.variant),
            status_cell(summary.status),
            stat_cell(stats.map(|stats| stats.input_rows)),
            count_cell(stats.map(|stats| stats.duplicates_removed), Color::Yellow),
            count_cell(stats.map(|stats| stats.status_rejected), Color::Red),
            count_cell(stats.map(|stats| stats.order_rejected), Color::Red),
            stat_cell(stats.map(|stats| stats.output_rows)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(format!(
            "{} ok / {} failed",
            result.summary.cleaned_count(),
            result.summary.failed_count()
        ))
        .add_attribute(Attribute::Bold),
        Cell::new(result.summary.total_input_rows()).add_attribute(Attribute::Bold),
        Cell::new(total_duplicates).add_attribute(Attribute::Bold),
        Cell::new(result.summary.total_rejected_rows()).add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(result.summary.total_output_rows()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_failures(&result.summary.tables);
    if !result.missing_tables.is_empty() {
        println!(
            "Requested tables not found: {}",
            result.missing_tables.join(", ")
        );
    }
}

fn print_failures(tables: &[TableSummary]) {
    let failed: Vec<&TableSummary> = tables.iter().filter(|table| table.is_failed()).collect();
    if failed.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Table"), header_cell("Error")]);
    apply_table_style(&mut table);
    for summary in failed {
        table.add_row(vec![
            Cell::new(&summary.table)
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            Cell::new(summary.error.as_deref().unwrap_or("-")),
        ]);
    }
    println!("Failures:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
    if table.column_count() >= 8 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
            ColumnConstraint::UpperBoundary(Width::Fixed(12)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
            ColumnConstraint::LowerBoundary(Width::Fixed(7)),
        ]);
    }
}

pub fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell(label: &str) -> Cell {
    Cell::new(label).fg(Color::DarkGrey)
}

fn status_cell(status: TableStatus) -> Cell {
    match status {
        TableStatus::Cleaned => Cell::new("cleaned").fg(Color::Green),
        TableStatus::Failed => Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
    }
}

fn stat_cell(value: Option<usize>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(&value.to_string()),
        None => dim_cell("-"),
    }
}
