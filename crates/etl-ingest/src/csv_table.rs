//! CSV ↔ DataFrame conversion.
//!
//! Reading keeps every column as text so the cleaners see exactly what the
//! export contained; typing is their job. Writing renders nulls as empty
//! cells and timestamps without fractional seconds.

use std::path::Path;

use chrono::DateTime;
use csv::{ReaderBuilder, WriterBuilder};
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsError, Series, TimeUnit};
use tracing::debug;

use crate::error::{IngestError, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').trim().to_string()
}

/// Reads a CSV export into a DataFrame of text columns.
///
/// The first record is the header. Empty cells become null, fully blank
/// lines are skipped and short rows are padded with nulls.
pub fn read_table_csv(path: &Path) -> Result<DataFrame> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|source| IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(normalize_header)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyCsv {
            path: path.to_path_buf(),
        });
    }

    let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::CsvParse {
            path: path.to_path_buf(),
            source,
        })?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        for (idx, column) in columns.iter_mut().enumerate() {
            let cell = record
                .get(idx)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            column.push(cell);
        }
    }

    let columns: Vec<Column> = headers
        .iter()
        .zip(columns)
        .map(|(name, values)| Series::new(name.as_str().into(), values).into())
        .collect();
    let df = DataFrame::new(columns).map_err(|err| IngestError::frame(path, &err))?;
    debug!(path = %path.display(), rows = df.height(), columns = df.width(), "read csv table");
    Ok(df)
}

/// Writes `df` as CSV with a header row.
pub fn write_table_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let csv_error = |source| IngestError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new().from_path(path).map_err(csv_error)?;

    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    writer.write_record(&names).map_err(csv_error)?;

    let mut rendered = Vec::with_capacity(names.len());
    for name in &names {
        rendered.push(render_column(df, name).map_err(|err| IngestError::frame(path, &err))?);
    }
    for row in 0..df.height() {
        let record = rendered
            .iter()
            .map(|column| column[row].as_deref().unwrap_or(""));
        writer.write_record(record).map_err(csv_error)?;
    }

    writer.flush().map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), rows = df.height(), "wrote csv table");
    Ok(())
}

fn render_column(
    df: &DataFrame,
    name: &str,
) -> std::result::Result<Vec<Option<String>>, PolarsError> {
    let series = df.column(name)?.as_materialized_series();
    if let DataType::Datetime(unit, _) = series.dtype() {
        let unit = *unit;
        let physical = series.cast(&DataType::Int64)?;
        let values = physical
            .i64()?
            .into_iter()
            .map(|value| value.and_then(|raw| format_timestamp(raw, unit)))
            .collect();
        return Ok(values);
    }
    let text = series.cast(&DataType::String)?;
    let values = text
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn format_timestamp(raw: i64, unit: TimeUnit) -> Option<String> {
    let nanos = match unit {
        TimeUnit::Nanoseconds => raw,
        TimeUnit::Microseconds => raw.checked_mul(1_000)?,
        TimeUnit::Milliseconds => raw.checked_mul(1_000_000)?,
    };
    let timestamp = DateTime::from_timestamp_nanos(nanos);
    Some(timestamp.naive_utc().format(TIMESTAMP_FORMAT).to_string())
}
