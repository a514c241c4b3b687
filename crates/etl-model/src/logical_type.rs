//! Logical column types.
//!
//! A logical type is the contract a column must satisfy after cleaning. It is
//! independent of how the raw file encoded the column: the cleaner coerces
//! whatever arrived into the declared representation or fails.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Expected type of a column after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    /// Free text.
    Text,
    /// Low-cardinality text stored as a categorical column.
    Category,
    /// 64-bit integer; missing values are a coercion failure.
    Int64,
    /// 64-bit integer that may be missing.
    NullableInt64,
    /// 64-bit float; missing values become null.
    Float64,
    /// Naive timestamp with nanosecond precision.
    Timestamp,
}

impl LogicalType {
    pub const ALL: [LogicalType; 6] = [
        LogicalType::Text,
        LogicalType::Category,
        LogicalType::Int64,
        LogicalType::NullableInt64,
        LogicalType::Float64,
        LogicalType::Timestamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::Text => "text",
            LogicalType::Category => "category",
            LogicalType::Int64 => "int64",
            LogicalType::NullableInt64 => "nullable_int64",
            LogicalType::Float64 => "float64",
            LogicalType::Timestamp => "timestamp",
        }
    }

    /// Whether a missing value is acceptable for this type.
    pub fn allows_missing(&self) -> bool {
        !matches!(self, LogicalType::Int64)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalType {
    type Err = ModelError;

    /// Accepts the canonical labels plus the pandas-style spellings users
    /// tend to type (`string`, `Int64`, `datetime64[ns]`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "Int64" => return Ok(LogicalType::NullableInt64),
            "int64" => return Ok(LogicalType::Int64),
            _ => {}
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "text" | "string" | "str" => Ok(LogicalType::Text),
            "category" | "categorical" => Ok(LogicalType::Category),
            "int64" | "integer" => Ok(LogicalType::Int64),
            "nullable_int64" => Ok(LogicalType::NullableInt64),
            "float64" | "float" | "double" => Ok(LogicalType::Float64),
            "timestamp" | "datetime" | "datetime64[ns]" => Ok(LogicalType::Timestamp),
            _ => Err(ModelError::UnknownLogicalType(trimmed.to_string())),
        }
    }
}
