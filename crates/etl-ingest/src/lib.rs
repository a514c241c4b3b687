//! File glue around the cleaning core: find raw CSV exports in a folder,
//! read them into all-text DataFrames, and write cleaned tables back out.

pub mod csv_table;
pub mod discovery;
pub mod error;

pub use csv_table::{read_table_csv, write_table_csv};
pub use discovery::{DiscoveredTable, discover_tables, list_csv_files, table_name_from_stem};
pub use error::{IngestError, Result};
