use polars::prelude::PolarsError;
use thiserror::Error;

use etl_model::{LogicalType, ModelError};

/// Errors raised while cleaning a table or running a batch of tables.
#[derive(Debug, Error)]
pub enum CleaningError {
    #[error("no cleaner available for table {table}")]
    UnregisteredTable { table: String },

    #[error(
        "table {table}: column {column} cannot be coerced to {expected} \
         (observed {observed}, value {value:?} at row {row})"
    )]
    Coercion {
        table: String,
        column: String,
        expected: LogicalType,
        observed: String,
        value: String,
        /// Position in the table as the caller passed it in.
        row: usize,
    },

    #[error("table {table} appears more than once in the input")]
    DuplicateTable { table: String },

    #[error("table {table} is registered more than once (clashes with {existing})")]
    DuplicateRegistration { table: String, existing: String },

    #[error("table {table}: {message}")]
    Custom { table: String, message: String },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl CleaningError {
    /// Table the error belongs to, when it belongs to one.
    pub fn table(&self) -> Option<&str> {
        match self {
            CleaningError::UnregisteredTable { table }
            | CleaningError::Coercion { table, .. }
            | CleaningError::DuplicateTable { table }
            | CleaningError::DuplicateRegistration { table, .. }
            | CleaningError::Custom { table, .. } => Some(table),
            CleaningError::Model(_) | CleaningError::Polars(_) => None,
        }
    }

    /// Rewrites a coercion row index through `source_rows`, which maps each
    /// row of a filtered frame to its position in the input.
    pub fn at_source_row(mut self, source_rows: &[usize]) -> Self {
        if let CleaningError::Coercion { row, .. } = &mut self
            && let Some(source) = source_rows.get(*row)
        {
            *row = *source;
        }
        self
    }
}

pub type Result<T> = std::result::Result<T, CleaningError>;
