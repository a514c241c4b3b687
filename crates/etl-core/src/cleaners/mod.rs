//! Cleaner variants and the trait they implement.
//!
//! # Architecture
//!
//! Every table is cleaned by exactly one [`CleanerVariant`], resolved by the
//! [`crate::factory::CleanerFactory`] from its registration table:
//!
//! | Variant     | Deduplication          | Extra rules                          |
//! |-------------|------------------------|--------------------------------------|
//! | `Generic`   | whole rows             | none                                 |
//! | `Keyed`     | declared key columns   | column renames before coercion       |
//! | `Lifecycle` | id column              | terminal-status and ordering checks  |
//! | `Custom`    | up to the implementor  | anything                             |
//!
//! All variants coerce the declared columns against the table's schema, when
//! the registry has one.

use std::fmt;
use std::sync::Arc;

use polars::prelude::DataFrame;

use etl_model::{TableSchema, TableStats, TableSummary};

use crate::coercion::coerce_frame;
use crate::error::Result;

mod generic;
mod keyed;
mod lifecycle;

pub use generic::GenericCleaner;
pub use keyed::KeyedRules;
pub use lifecycle::{
    LifecycleRules, MILESTONE_OUT_OF_ORDER, REJECTION_REASON_COLUMN,
    TERMINAL_STATUS_MISSING_MILESTONE, milestone_values,
};

/// Table-specific cleaning logic.
///
/// Implementors receive their own copy of the raw frame and return the
/// cleaned table. They must not fail on rows that merely violate business
/// rules; those rows are dropped (and reported in `rejected`).
pub trait TableCleaner: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn clean(&self, ctx: &CleaningContext<'_>, raw: DataFrame) -> Result<CleanedTable>;
}

/// What a cleaner knows about the table it is cleaning.
#[derive(Debug, Clone, Copy)]
pub struct CleaningContext<'a> {
    pub table: &'a str,
    /// `None` when the registry has no entry: no type enforcement.
    pub schema: Option<&'a TableSchema>,
    pub keep_rejected: bool,
}

impl CleaningContext<'_> {
    /// Coerces `df` against the table schema, or returns it unchanged.
    pub fn coerce(&self, df: &DataFrame) -> Result<DataFrame> {
        match self.schema {
            Some(schema) => coerce_frame(self.table, df, schema),
            None => Ok(df.clone()),
        }
    }

    /// [`coerce`](Self::coerce) for a frame whose rows came from the input
    /// positions in `source_rows`; failures report the input position.
    pub fn coerce_rows(&self, df: &DataFrame, source_rows: &[usize]) -> Result<DataFrame> {
        self.coerce(df)
            .map_err(|err| err.at_source_row(source_rows))
    }
}

/// Cleaned output of one table plus the rows validation removed.
#[derive(Debug, Clone)]
pub struct CleanedTable {
    pub table: String,
    pub variant: String,
    pub data: DataFrame,
    /// Rows dropped by validation, with a `rejection_reason` column.
    /// Empty when nothing was rejected or quarantine is off.
    pub rejected: DataFrame,
    pub stats: TableStats,
}

impl CleanedTable {
    /// A table with no rejected rows.
    pub fn new(ctx: &CleaningContext<'_>, variant: &str, data: DataFrame, stats: TableStats) -> Self {
        let rejected = data.head(Some(0));
        Self {
            table: ctx.table.to_string(),
            variant: variant.to_string(),
            data,
            rejected,
            stats,
        }
    }

    #[must_use]
    pub fn with_rejected(mut self, rejected: DataFrame) -> Self {
        self.rejected = rejected;
        self
    }

    pub fn has_rejections(&self) -> bool {
        self.rejected.height() > 0
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary::cleaned(&self.table, &self.variant, self.stats)
    }
}

/// How a registered table is cleaned.
#[derive(Clone)]
pub enum CleanerVariant {
    Generic,
    Keyed(KeyedRules),
    Lifecycle(LifecycleRules),
    Custom(Arc<dyn TableCleaner>),
}

impl CleanerVariant {
    pub fn custom(cleaner: impl TableCleaner + 'static) -> Self {
        CleanerVariant::Custom(Arc::new(cleaner))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CleanerVariant::Generic => "generic",
            CleanerVariant::Keyed(_) => "keyed",
            CleanerVariant::Lifecycle(_) => "lifecycle",
            CleanerVariant::Custom(_) => "custom",
        }
    }

    pub fn cleaner(&self) -> &dyn TableCleaner {
        match self {
            CleanerVariant::Generic => &GenericCleaner,
            CleanerVariant::Keyed(rules) => rules,
            CleanerVariant::Lifecycle(rules) => rules,
            CleanerVariant::Custom(cleaner) => cleaner.as_ref(),
        }
    }
}

impl fmt::Debug for CleanerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanerVariant::Generic => f.write_str("Generic"),
            CleanerVariant::Keyed(rules) => f.debug_tuple("Keyed").field(rules).finish(),
            CleanerVariant::Lifecycle(rules) => f.debug_tuple("Lifecycle").field(rules).finish(),
            CleanerVariant::Custom(cleaner) => {
                f.debug_tuple("Custom").field(&cleaner.name()).finish()
            }
        }
    }
}
