use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown logical type: {0}")]
    UnknownLogicalType(String),
    #[error("table {table} declares column {column} more than once")]
    DuplicateColumn { table: String, column: String },
    #[error("table {table} is registered more than once (clashes with {existing})")]
    DuplicateTable { table: String, existing: String },
    #[error("table name {0:?} has no alphanumeric characters")]
    EmptyTableName(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
