//! Cleaner for tables whose rows move through an ordered set of states.
//!
//! After id-keyed dedup and coercion, two validators run in sequence:
//!
//! 1. rows in the terminal status must carry every required milestone;
//! 2. for each adjacent pair of the milestone sequence where both sides are
//!    present, the earlier milestone must not be later than the next one.
//!
//! Violating rows are dropped, never corrected, and never fail the table.

use polars::prelude::{DataFrame, DataType, TimeUnit};
use tracing::{debug, warn};

use etl_model::TableStats;

use super::{CleanedTable, CleaningContext, TableCleaner};
use crate::coercion::{parse_timestamp, timestamp_dtype, timestamp_nanos};
use crate::dedupe::dedupe_tracked;
use crate::error::Result;
use crate::frame_utils::{partition_rows, text_values, with_constant_column};

pub const REJECTION_REASON_COLUMN: &str = "rejection_reason";
pub const TERMINAL_STATUS_MISSING_MILESTONE: &str = "terminal_status_missing_milestone";
pub const MILESTONE_OUT_OF_ORDER: &str = "milestone_out_of_order";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleRules {
    pub id_column: String,
    pub status_column: String,
    pub terminal_status: String,
    /// Milestones a terminal-status row must have.
    pub required_milestones: Vec<String>,
    /// Milestones in expected chronological order.
    pub milestone_sequence: Vec<String>,
}

impl LifecycleRules {
    pub fn olist_orders() -> Self {
        Self {
            id_column: "order_id".to_string(),
            status_column: "order_status".to_string(),
            terminal_status: "delivered".to_string(),
            required_milestones: vec![
                "order_approved_at".to_string(),
                "order_delivered_carrier_date".to_string(),
                "order_delivered_customer_date".to_string(),
            ],
            milestone_sequence: vec![
                "order_purchase_timestamp".to_string(),
                "order_approved_at".to_string(),
                "order_delivered_carrier_date".to_string(),
                "order_delivered_customer_date".to_string(),
            ],
        }
    }

    /// `true` for rows that are not terminal or have every required milestone.
    ///
    /// Without a status column no row is terminal. A required milestone
    /// column that is absent is missing for every row.
    pub fn terminal_status_mask(&self, df: &DataFrame) -> Result<Vec<bool>> {
        let height = df.height();
        if df.column(&self.status_column).is_err() {
            return Ok(vec![true; height]);
        }
        let terminal = self.terminal_status.trim();
        let statuses = text_values(df, &self.status_column)?;
        let mut milestones = Vec::with_capacity(self.required_milestones.len());
        for column in &self.required_milestones {
            milestones.push(milestone_values(df, column)?);
        }
        let keep = statuses
            .iter()
            .enumerate()
            .map(|(idx, status)| {
                let is_terminal = status.as_deref().is_some_and(|s| s.trim() == terminal);
                !is_terminal || milestones.iter().all(|values| values[idx].is_some())
            })
            .collect();
        Ok(keep)
    }

    /// `true` for rows whose present milestones are in chronological order.
    pub fn milestone_order_mask(&self, df: &DataFrame) -> Result<Vec<bool>> {
        let mut sequence = Vec::with_capacity(self.milestone_sequence.len());
        for column in &self.milestone_sequence {
            sequence.push(milestone_values(df, column)?);
        }
        let keep = (0..df.height())
            .map(|idx| {
                sequence.windows(2).all(|pair| match (pair[0][idx], pair[1][idx]) {
                    (Some(earlier), Some(later)) => earlier <= later,
                    _ => true,
                })
            })
            .collect();
        Ok(keep)
    }

    fn quarantine(&self, ctx: &CleaningContext<'_>, frames: [(DataFrame, &str); 2]) -> Result<DataFrame> {
        let mut rejected: Option<DataFrame> = None;
        for (frame, reason) in frames {
            let labelled = with_constant_column(frame, REJECTION_REASON_COLUMN, reason)?;
            rejected = Some(match rejected {
                Some(existing) => existing.vstack(&labelled)?,
                None => labelled,
            });
        }
        match rejected {
            Some(frame) if ctx.keep_rejected => Ok(frame),
            Some(frame) => Ok(frame.head(Some(0))),
            None => Ok(DataFrame::empty()),
        }
    }
}

impl TableCleaner for LifecycleRules {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn clean(&self, ctx: &CleaningContext<'_>, raw: DataFrame) -> Result<CleanedTable> {
        let input_rows = raw.height();
        let (deduped, source_rows) = dedupe_tracked(&raw, &[self.id_column.as_str()])?;
        let duplicates_removed = input_rows - source_rows.len();
        let coerced = ctx.coerce_rows(&deduped, &source_rows)?;

        let keep = self.terminal_status_mask(&coerced)?;
        let (consistent, missing_milestone) = partition_rows(&coerced, &keep)?;
        let keep = self.milestone_order_mask(&consistent)?;
        let (data, out_of_order) = partition_rows(&consistent, &keep)?;

        let status_rejected = missing_milestone.height();
        let order_rejected = out_of_order.height();
        if status_rejected > 0 {
            warn!(
                table = ctx.table,
                dropped = status_rejected,
                terminal_status = %self.terminal_status,
                "dropped terminal-status rows missing required milestones"
            );
        }
        if order_rejected > 0 {
            warn!(
                table = ctx.table,
                dropped = order_rejected,
                "dropped rows with milestones out of chronological order"
            );
        }
        debug!(table = ctx.table, kept = data.height(), "lifecycle validation complete");

        let rejected = self.quarantine(
            ctx,
            [
                (missing_milestone, TERMINAL_STATUS_MISSING_MILESTONE),
                (out_of_order, MILESTONE_OUT_OF_ORDER),
            ],
        )?;
        let stats = TableStats {
            input_rows,
            duplicates_removed,
            status_rejected,
            order_rejected,
            output_rows: data.height(),
        };
        Ok(CleanedTable::new(ctx, self.name(), data, stats).with_rejected(rejected))
    }
}

/// Milestone column as nanoseconds since the epoch.
///
/// Timestamp columns are read directly; anything else is rendered as text and
/// parsed, with unparseable cells treated as missing. An absent column is
/// missing on every row.
pub fn milestone_values(df: &DataFrame, column: &str) -> Result<Vec<Option<i64>>> {
    let Ok(existing) = df.column(column) else {
        return Ok(vec![None; df.height()]);
    };
    let series = existing.as_materialized_series();
    let as_nanos = match series.dtype() {
        DataType::Datetime(_, zone) => Some(
            series.cast(&DataType::Datetime(TimeUnit::Nanoseconds, zone.clone()))?,
        ),
        DataType::Date => Some(series.cast(&timestamp_dtype())?),
        _ => None,
    };
    if let Some(datetimes) = as_nanos {
        let physical = datetimes.cast(&DataType::Int64)?;
        return Ok(physical.i64()?.into_iter().collect());
    }
    let values = text_values(df, column)?
        .into_iter()
        .map(|value| {
            value
                .as_deref()
                .and_then(parse_timestamp)
                .and_then(timestamp_nanos)
        })
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use polars::df;

    use super::*;

    fn orders() -> DataFrame {
        df! {
            "order_id" => ["A1", "A2", "A3", "A4"],
            "order_status" => ["delivered", "shipped", "created", " delivered "],
            "order_purchase_timestamp" => [Some("2021-01-01 08:00:00"), Some("2021-01-05 00:00:00"), Some("2021-01-01 00:00:00"), Some("2021-01-01 00:00:00")],
            "order_approved_at" => [None, Some("2021-01-03 00:00:00"), None, Some("2021-01-01 01:00:00")],
            "order_delivered_carrier_date" => [Some("2021-01-02 00:00:00"), None, None, Some("2021-01-02 00:00:00")],
            "order_delivered_customer_date" => [Some("2021-01-04 00:00:00"), None, None, Some("2021-01-03 00:00:00")],
        }
        .unwrap()
    }

    #[test]
    fn terminal_rows_need_required_milestones() {
        let mask = LifecycleRules::olist_orders()
            .terminal_status_mask(&orders())
            .unwrap();
        assert_eq!(mask, vec![false, true, true, true]);
    }

    #[test]
    fn out_of_order_pairs_are_rejected() {
        let mask = LifecycleRules::olist_orders()
            .milestone_order_mask(&orders())
            .unwrap();
        assert_eq!(mask, vec![true, false, true, true]);
    }

    #[test]
    fn status_comparison_is_case_sensitive() {
        let df = df! {
            "order_status" => ["Delivered"],
            "order_approved_at" => [None::<&str>],
        }
        .unwrap();
        let mask = LifecycleRules::olist_orders()
            .terminal_status_mask(&df)
            .unwrap();
        assert_eq!(mask, vec![true]);
    }

    #[test]
    fn missing_status_column_means_no_terminal_rows() {
        let df = df! { "order_id" => ["A1", "A2"] }.unwrap();
        let mask = LifecycleRules::olist_orders()
            .terminal_status_mask(&df)
            .unwrap();
        assert_eq!(mask, vec![true, true]);
    }

    #[test]
    fn missing_milestone_column_fails_terminal_rows() {
        let df = df! {
            "order_status" => ["delivered", "created"],
            "order_approved_at" => ["2021-01-01", "2021-01-01"],
            "order_delivered_carrier_date" => ["2021-01-02", "2021-01-02"],
        }
        .unwrap();
        let mask = LifecycleRules::olist_orders()
            .terminal_status_mask(&df)
            .unwrap();
        assert_eq!(mask, vec![false, true]);
    }

    #[test]
    fn unparseable_milestones_count_as_missing() {
        let df = df! {
            "order_purchase_timestamp" => ["2021-01-05", "soon"],
            "order_approved_at" => ["2021-01-03", "2021-01-01"],
        }
        .unwrap();
        let mask = LifecycleRules::olist_orders()
            .milestone_order_mask(&df)
            .unwrap();
        assert_eq!(mask, vec![false, true]);
    }

    #[test]
    fn clean_quarantines_with_reasons() {
        let ctx = CleaningContext {
            table: "Orders",
            schema: None,
            keep_rejected: true,
        };
        let cleaned = LifecycleRules::olist_orders().clean(&ctx, orders()).unwrap();
        assert_eq!(cleaned.stats.status_rejected, 1);
        assert_eq!(cleaned.stats.order_rejected, 1);
        assert_eq!(cleaned.stats.output_rows, 2);
        let reasons = text_values(&cleaned.rejected, REJECTION_REASON_COLUMN).unwrap();
        assert_eq!(
            reasons,
            vec![
                Some(TERMINAL_STATUS_MISSING_MILESTONE.to_string()),
                Some(MILESTONE_OUT_OF_ORDER.to_string()),
            ]
        );
    }

    #[test]
    fn quarantine_can_be_disabled() {
        let ctx = CleaningContext {
            table: "Orders",
            schema: None,
            keep_rejected: false,
        };
        let cleaned = LifecycleRules::olist_orders().clean(&ctx, orders()).unwrap();
        assert_eq!(cleaned.stats.rejected_rows(), 2);
        assert!(!cleaned.has_rejections());
    }
}
