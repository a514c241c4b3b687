use polars::prelude::DataFrame;
use tracing::warn;

use etl_model::TableStats;

use super::{CleanedTable, CleaningContext, TableCleaner};
use crate::dedupe::dedupe_tracked;
use crate::error::Result;
use crate::frame_utils::has_column;

/// Dedup on declared key columns, with optional renames of misspelled
/// source columns applied first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyedRules {
    pub keys: Vec<String>,
    /// `(source, target)` pairs.
    pub renames: Vec<(String, String)>,
}

impl KeyedRules {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            renames: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.push((from.into(), to.into()));
        self
    }

    pub fn olist_customers() -> Self {
        Self::new(["customer_id"])
    }

    /// The product export misspells two length columns.
    pub fn olist_products() -> Self {
        Self::new(["product_id"])
            .with_rename("product_name_lenght", "product_name_length")
            .with_rename("product_description_lenght", "product_description_length")
    }

    pub fn apply_renames(&self, table: &str, mut df: DataFrame) -> Result<DataFrame> {
        for (from, to) in &self.renames {
            if !has_column(&df, from) {
                continue;
            }
            if has_column(&df, to) {
                warn!(table, from = %from, to = %to, "rename target already present, keeping both columns");
                continue;
            }
            df.rename(from, to.as_str().into())?;
        }
        Ok(df)
    }
}

impl TableCleaner for KeyedRules {
    fn name(&self) -> &str {
        "keyed"
    }

    fn clean(&self, ctx: &CleaningContext<'_>, raw: DataFrame) -> Result<CleanedTable> {
        let input_rows = raw.height();
        let renamed = self.apply_renames(ctx.table, raw)?;
        let (deduped, source_rows) = dedupe_tracked(&renamed, &self.keys)?;
        let duplicates_removed = input_rows - source_rows.len();
        let data = ctx.coerce_rows(&deduped, &source_rows)?;
        let stats = TableStats {
            input_rows,
            duplicates_removed,
            output_rows: data.height(),
            ..TableStats::default()
        };
        Ok(CleanedTable::new(ctx, self.name(), data, stats))
    }
}
