//! Table cleaning and validation.
//!
//! Raw tables go through a [`CleanerFactory`] that picks a [`CleanerVariant`]
//! per table name; each variant deduplicates, coerces declared columns
//! against the table's [`etl_model::TableSchema`] and may drop rows that
//! break business rules. [`CleaningPipeline`] runs a whole batch under a
//! fail-fast or skip-on-error policy.

pub mod cleaners;
pub mod coercion;
pub mod dedupe;
pub mod error;
pub mod factory;
pub mod frame_utils;
pub mod pipeline;

pub use cleaners::{
    CleanedTable, CleanerVariant, CleaningContext, GenericCleaner, KeyedRules, LifecycleRules,
    MILESTONE_OUT_OF_ORDER, REJECTION_REASON_COLUMN, TERMINAL_STATUS_MISSING_MILESTONE,
    TableCleaner, milestone_values,
};
pub use coercion::{
    CellFailure, category_dtype, coerce_frame, coerce_series, parse_timestamp, timestamp_dtype,
    timestamp_nanos,
};
pub use dedupe::{dedupe_by_keys, dedupe_exact, dedupe_tracked};
pub use error::{CleaningError, Result};
pub use factory::{Cleaner, CleanerFactory, CleanerFactoryBuilder};
pub use pipeline::{CleaningPipeline, CleaningRun, TableOutcome};
