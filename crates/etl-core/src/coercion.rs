//! Column coercion against a table's declared logical types.
//!
//! Coercion reads every cell of a column, converts it to the declared
//! representation and rebuilds the column. The first cell that cannot be
//! converted fails the whole table: columns are coerced on a working copy and
//! the copy is only returned once every declared column has succeeded.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::{
    AnyValue, Categories, DataFrame, DataType, NamedFrom, Series, TimeUnit,
};
use tracing::debug;

use etl_model::{LogicalType, TableSchema};

use crate::error::{CleaningError, Result};
use crate::frame_utils::{cell_text, integral_f64, parse_f64, parse_integral};

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Storage type used for timestamp columns.
pub fn timestamp_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Nanoseconds, None)
}

/// Storage type used for category columns.
pub fn category_dtype() -> DataType {
    DataType::from_categories(Categories::global())
}

/// Parses the timestamp spellings found in raw exports.
///
/// RFC 3339 values with an offset are normalized to UTC; a bare date means
/// midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.naive_utc());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Nanoseconds since the epoch for a parsed timestamp.
pub fn timestamp_nanos(value: NaiveDateTime) -> Option<i64> {
    value.and_utc().timestamp_nanos_opt()
}

/// Coerces every column that appears in both `df` and `schema`.
///
/// Columns the schema does not mention pass through untouched, as do schema
/// columns the frame does not have.
pub fn coerce_frame(table: &str, df: &DataFrame, schema: &TableSchema) -> Result<DataFrame> {
    let mut working = df.clone();
    for (column, logical_type) in schema.columns() {
        let Ok(existing) = df.column(column) else {
            continue;
        };
        let series = existing.as_materialized_series();
        let coerced = coerce_series(series, logical_type).map_err(|failure| {
            CleaningError::Coercion {
                table: table.to_string(),
                column: column.to_string(),
                expected: logical_type,
                observed: series.dtype().to_string(),
                value: failure.value,
                row: failure.row,
            }
        })?;
        debug!(
            table,
            column,
            from = %series.dtype(),
            to = %logical_type,
            "coerced column"
        );
        working.with_column(coerced)?;
    }
    Ok(working)
}

/// First cell of a column that failed to convert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    pub row: usize,
    pub value: String,
}

impl CellFailure {
    fn new(row: usize, value: impl Into<String>) -> Self {
        Self {
            row,
            value: value.into(),
        }
    }
}

/// Converts one column to `logical_type`, keeping its name.
pub fn coerce_series(
    series: &Series,
    logical_type: LogicalType,
) -> std::result::Result<Series, CellFailure> {
    let series = as_plain_text(series)?;
    match logical_type {
        LogicalType::Text => Ok(text_series(&series)?),
        LogicalType::Category => text_series(&series)?
            .cast(&category_dtype())
            .map_err(|err| CellFailure::new(0, err.to_string())),
        LogicalType::Int64 => {
            let values = int_values(&series)?;
            if let Some(row) = values.iter().position(Option::is_none) {
                return Err(CellFailure::new(row, ""));
            }
            Ok(Series::new(series.name().clone(), values))
        }
        LogicalType::NullableInt64 => Ok(Series::new(series.name().clone(), int_values(&series)?)),
        LogicalType::Float64 => Ok(Series::new(series.name().clone(), float_values(&series)?)),
        LogicalType::Timestamp => timestamp_series(&series),
    }
}

/// Categorical input is read through its labels rather than its physical codes.
fn as_plain_text(series: &Series) -> std::result::Result<Series, CellFailure> {
    if matches!(series.dtype(), DataType::Categorical(..) | DataType::Enum(..)) {
        series
            .cast(&DataType::String)
            .map_err(|err| CellFailure::new(0, err.to_string()))
    } else {
        Ok(series.clone())
    }
}

fn cells(series: &Series) -> impl Iterator<Item = (usize, AnyValue<'_>)> + '_ {
    (0..series.len()).map(|row| (row, series.get(row).unwrap_or(AnyValue::Null)))
}

fn text_series(series: &Series) -> std::result::Result<Series, CellFailure> {
    if series.dtype() == &DataType::String {
        return Ok(series.clone());
    }
    let values: Vec<Option<String>> = cells(series)
        .map(|(_, value)| match value {
            AnyValue::Null => None,
            other => Some(cell_text(&other).unwrap_or_default()),
        })
        .collect();
    Ok(Series::new(series.name().clone(), values))
}

fn int_values(series: &Series) -> std::result::Result<Vec<Option<i64>>, CellFailure> {
    let mut values = Vec::with_capacity(series.len());
    for (row, value) in cells(series) {
        let parsed = match &value {
            AnyValue::Null => None,
            AnyValue::Int8(v) => Some(i64::from(*v)),
            AnyValue::Int16(v) => Some(i64::from(*v)),
            AnyValue::Int32(v) => Some(i64::from(*v)),
            AnyValue::Int64(v) => Some(*v),
            AnyValue::UInt8(v) => Some(i64::from(*v)),
            AnyValue::UInt16(v) => Some(i64::from(*v)),
            AnyValue::UInt32(v) => Some(i64::from(*v)),
            AnyValue::UInt64(v) => {
                Some(i64::try_from(*v).map_err(|_| CellFailure::new(row, v.to_string()))?)
            }
            AnyValue::Float32(v) => Some(
                integral_f64(f64::from(*v)).ok_or_else(|| CellFailure::new(row, v.to_string()))?,
            ),
            AnyValue::Float64(v) => {
                Some(integral_f64(*v).ok_or_else(|| CellFailure::new(row, v.to_string()))?)
            }
            other => match cell_text(other) {
                None => None,
                Some(text) => {
                    Some(parse_integral(&text).ok_or_else(|| CellFailure::new(row, text))?)
                }
            },
        };
        values.push(parsed);
    }
    Ok(values)
}

fn float_values(series: &Series) -> std::result::Result<Vec<Option<f64>>, CellFailure> {
    let mut values = Vec::with_capacity(series.len());
    for (row, value) in cells(series) {
        let parsed = match &value {
            AnyValue::Null => None,
            AnyValue::Int8(v) => Some(f64::from(*v)),
            AnyValue::Int16(v) => Some(f64::from(*v)),
            AnyValue::Int32(v) => Some(f64::from(*v)),
            AnyValue::Int64(v) => Some(*v as f64),
            AnyValue::UInt8(v) => Some(f64::from(*v)),
            AnyValue::UInt16(v) => Some(f64::from(*v)),
            AnyValue::UInt32(v) => Some(f64::from(*v)),
            AnyValue::UInt64(v) => Some(*v as f64),
            AnyValue::Float32(v) => Some(f64::from(*v)),
            AnyValue::Float64(v) => Some(*v),
            other => match cell_text(other) {
                None => None,
                Some(text) => Some(parse_f64(&text).ok_or_else(|| CellFailure::new(row, text))?),
            },
        };
        values.push(parsed);
    }
    Ok(values)
}

fn timestamp_series(series: &Series) -> std::result::Result<Series, CellFailure> {
    let cast_failure = |err: polars::prelude::PolarsError| CellFailure::new(0, err.to_string());
    match series.dtype() {
        DataType::Datetime(_, None) | DataType::Date => {
            return series.cast(&timestamp_dtype()).map_err(cast_failure);
        }
        DataType::Datetime(_, Some(zone)) => {
            let nanos = series
                .cast(&DataType::Datetime(TimeUnit::Nanoseconds, Some(zone.clone())))
                .and_then(|utc| utc.cast(&DataType::Int64))
                .map_err(cast_failure)?;
            return nanos.cast(&timestamp_dtype()).map_err(cast_failure);
        }
        _ => {}
    }
    let mut values: Vec<Option<i64>> = Vec::with_capacity(series.len());
    for (row, value) in cells(series) {
        let parsed = match cell_text(&value) {
            None => None,
            Some(text) => {
                let nanos = parse_timestamp(&text).and_then(timestamp_nanos);
                Some(nanos.ok_or_else(|| CellFailure::new(row, text))?)
            }
        };
        values.push(parsed);
    }
    Series::new(series.name().clone(), values)
        .cast(&timestamp_dtype())
        .map_err(cast_failure)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    #[test]
    fn parses_supported_timestamp_spellings() {
        let expected = NaiveDate::from_ymd_opt(2017, 10, 2)
            .unwrap()
            .and_hms_opt(10, 56, 33)
            .unwrap();
        assert_eq!(parse_timestamp("2017-10-02 10:56:33"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T10:56:33"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T12:56:33+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2017-10-02"),
            NaiveDate::from_ymd_opt(2017, 10, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn int64_rejects_missing_values() {
        let series = Series::new("zip".into(), [Some("01001"), None, Some("3")]);
        let failure = coerce_series(&series, LogicalType::Int64).unwrap_err();
        assert_eq!(failure.row, 1);
    }

    #[test]
    fn nullable_int64_accepts_integral_floats() {
        let series = Series::new("qty".into(), [Some("4.0"), Some(" "), None, Some("12")]);
        let coerced = coerce_series(&series, LogicalType::NullableInt64).unwrap();
        assert_eq!(coerced.dtype(), &DataType::Int64);
        let values: Vec<_> = coerced.i64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(4), None, None, Some(12)]);
    }

    #[test]
    fn float64_reports_first_bad_cell() {
        let series = Series::new("price".into(), ["1.5", "2", "n/a", "oops"]);
        let failure = coerce_series(&series, LogicalType::Float64).unwrap_err();
        assert_eq!(failure, CellFailure::new(2, "n/a"));
    }

    #[test]
    fn timestamps_are_stored_as_nanoseconds() {
        let series = Series::new("ts".into(), [Some("2021-01-05 00:00:00"), None]);
        let coerced = coerce_series(&series, LogicalType::Timestamp).unwrap();
        assert_eq!(coerced.dtype(), &timestamp_dtype());
        assert_eq!(coerced.null_count(), 1);
    }

    #[test]
    fn text_renders_numbers() {
        let series = Series::new("code".into(), [Some(1.5f64), None, Some(2.0)]);
        let coerced = coerce_series(&series, LogicalType::Text).unwrap();
        let values: Vec<_> = coerced.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("1.5"), None, Some("2")]);
    }

    #[test]
    fn failed_coercion_names_table_and_column() {
        let df = df! {
            "order_item_id" => ["1", "x"],
            "price" => ["10.0", "11.5"],
        }
        .unwrap();
        let schema = TableSchema::new("OrderItems")
            .with_column("order_item_id", LogicalType::Int64)
            .with_column("price", LogicalType::Float64);
        let err = coerce_frame("OrderItems", &df, &schema).unwrap_err();
        match err {
            CleaningError::Coercion {
                table,
                column,
                expected,
                value,
                row,
                ..
            } => {
                assert_eq!(table, "OrderItems");
                assert_eq!(column, "order_item_id");
                assert_eq!(expected, LogicalType::Int64);
                assert_eq!(value, "x");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undeclared_columns_pass_through() {
        let df = df! {
            "price" => ["10.0"],
            "note" => ["keep me"],
        }
        .unwrap();
        let schema = TableSchema::new("T").with_column("price", LogicalType::Float64);
        let coerced = coerce_frame("T", &df, &schema).unwrap();
        assert_eq!(coerced.column("price").unwrap().dtype(), &DataType::Float64);
        assert_eq!(coerced.column("note").unwrap().dtype(), &DataType::String);
    }
}
