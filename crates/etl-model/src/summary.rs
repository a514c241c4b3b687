//! Per-table statistics and the serializable report of a whole run.

use serde::{Deserialize, Serialize};

use crate::options::FailurePolicy;

/// Row accounting for one cleaned table.
///
/// `input_rows - duplicates_removed - status_rejected - order_rejected`
/// always equals `output_rows`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    pub input_rows: usize,
    pub duplicates_removed: usize,
    /// Terminal-status rows missing a required milestone.
    pub status_rejected: usize,
    /// Rows whose milestones are out of chronological order.
    pub order_rejected: usize,
    pub output_rows: usize,
}

impl TableStats {
    pub fn rejected_rows(&self) -> usize {
        self.status_rejected + self.order_rejected
    }

    pub fn rows_dropped(&self) -> usize {
        self.duplicates_removed + self.rejected_rows()
    }

    /// True when the counts add up.
    pub fn is_balanced(&self) -> bool {
        self.input_rows == self.output_rows + self.rows_dropped()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Cleaned,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: String,
    /// Cleaner variant label (`generic`, `keyed`, `lifecycle`, `custom`).
    pub variant: String,
    pub status: TableStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TableStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TableSummary {
    pub fn cleaned(table: impl Into<String>, variant: impl Into<String>, stats: TableStats) -> Self {
        Self {
            table: table.into(),
            variant: variant.into(),
            status: TableStatus::Cleaned,
            stats: Some(stats),
            error: None,
        }
    }

    pub fn failed(
        table: impl Into<String>,
        variant: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            variant: variant.into(),
            status: TableStatus::Failed,
            stats: None,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == TableStatus::Failed
    }
}

/// Outcome of every table a run attempted, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub policy: FailurePolicy,
    pub tables: Vec<TableSummary>,
}

impl RunSummary {
    pub fn cleaned_count(&self) -> usize {
        self.tables.iter().filter(|t| !t.is_failed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.tables.iter().filter(|t| t.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.tables.iter().any(TableSummary::is_failed)
    }

    pub fn total_input_rows(&self) -> usize {
        self.stats().map(|s| s.input_rows).sum()
    }

    pub fn total_output_rows(&self) -> usize {
        self.stats().map(|s| s.output_rows).sum()
    }

    pub fn total_rejected_rows(&self) -> usize {
        self.stats().map(TableStats::rejected_rows).sum()
    }

    fn stats(&self) -> impl Iterator<Item = &TableStats> + '_ {
        self.tables.iter().filter_map(|t| t.stats.as_ref())
    }
}
