use polars::prelude::DataFrame;

use etl_model::TableStats;

use super::{CleanedTable, CleaningContext, TableCleaner};
use crate::dedupe::dedupe_tracked;
use crate::error::Result;

/// Baseline hygiene: exact-row dedup followed by schema coercion.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericCleaner;

impl TableCleaner for GenericCleaner {
    fn name(&self) -> &str {
        "generic"
    }

    fn clean(&self, ctx: &CleaningContext<'_>, raw: DataFrame) -> Result<CleanedTable> {
        let input_rows = raw.height();
        let (deduped, source_rows) = dedupe_tracked::<&str>(&raw, &[])?;
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
