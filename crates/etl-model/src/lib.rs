//! Shared data types for the table cleaning workspace.
//!
//! Nothing in this crate touches a DataFrame: it describes *what* a table is
//! expected to look like (logical column types, per-table schemas, the
//! registry that holds them) and *how* a run reports back (options, per-table
//! statistics and serializable summaries).

pub mod error;
pub mod logical_type;
pub mod lookup;
pub mod options;
pub mod schema;
pub mod summary;

pub use error::{ModelError, Result};
pub use logical_type::LogicalType;
pub use lookup::{TableKey, table_key};
pub use options::{CleaningOptions, FailurePolicy};
pub use schema::{SchemaRegistry, SchemaRegistryBuilder, TableSchema};
pub use summary::{RunSummary, TableStats, TableStatus, TableSummary};
