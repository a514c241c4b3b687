//! Small DataFrame helpers shared by the cleaners.

use polars::prelude::{
    AnyValue, BooleanChunked, DataFrame, DataType, NamedFrom, NewChunkedArray, Series,
};

use crate::error::Result;

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Renders every cell of `name` as text, keeping nulls as `None`.
pub fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

/// Keeps the rows whose mask entry is `true`.
pub fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}

/// Splits `df` into the rows to keep and the rows to reject.
pub fn partition_rows(df: &DataFrame, keep: &[bool]) -> Result<(DataFrame, DataFrame)> {
    let drop: Vec<bool> = keep.iter().map(|value| !value).collect();
    Ok((filter_rows(df, keep)?, filter_rows(df, &drop)?))
}

/// Appends a constant text column, used to label quarantined rows.
pub fn with_constant_column(mut df: DataFrame, name: &str, value: &str) -> Result<DataFrame> {
    let series = Series::new(name.into(), vec![value; df.height()]);
    df.with_column(series)?;
    Ok(df)
}

/// Text rendering of a single cell. Null and blank text are both `None`.
pub fn cell_text(value: &AnyValue<'_>) -> Option<String> {
    let text = match value {
        AnyValue::Null => return None,
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) => format_numeric(f64::from(*v)),
        AnyValue::Float64(v) => format_numeric(*v),
        AnyValue::Boolean(b) => b.to_string(),
        other => other.to_string(),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Formats a float without a trailing fractional zero (`2.50` → `2.5`, `3.0` → `3`).
pub fn format_numeric(value: f64) -> String {
    let text = format!("{value}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Integer literal, or a float literal with no fractional part.
pub fn parse_integral(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Some(parsed);
    }
    trimmed.parse::<f64>().ok().and_then(integral_f64)
}

pub fn integral_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e18 {
        Some(value as i64)
    } else {
        None
    }
}
