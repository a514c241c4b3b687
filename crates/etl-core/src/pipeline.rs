//! Cleaning orchestrator.
//!
//! Runs the factory over a batch of named raw tables, sequentially and in
//! input order, and applies the run's [`FailurePolicy`]:
//!
//! - `FailFast`: the first failing table aborts the run and its error is
//!   returned; no partial output escapes.
//! - `SkipOnError`: the failure is logged, recorded as
//!   [`TableOutcome::Failed`] and the table is left out of
//!   [`CleaningRun::tables`].
//!
//! Input names that normalize to the same [`TableKey`] are one table; the
//! second occurrence is a [`CleaningError::DuplicateTable`].

use std::collections::{BTreeMap, HashSet};

use polars::prelude::DataFrame;
use tracing::{error, info, warn};

use etl_model::{CleaningOptions, FailurePolicy, RunSummary, TableKey, TableStats, TableSummary};

use crate::cleaners::CleanedTable;
use crate::error::{CleaningError, Result};
use crate::factory::CleanerFactory;

pub struct CleaningPipeline {
    factory: CleanerFactory,
    options: CleaningOptions,
}

impl CleaningPipeline {
    pub fn new(factory: CleanerFactory, options: CleaningOptions) -> Self {
        Self { factory, options }
    }

    pub fn factory(&self) -> &CleanerFactory {
        &self.factory
    }

    pub fn options(&self) -> &CleaningOptions {
        &self.options
    }

    /// Cleans one table without applying the failure policy.
    pub fn clean_table(&self, table_name: &str, raw: &DataFrame) -> Result<CleanedTable> {
        self.factory
            .create(table_name, raw)?
            .with_keep_rejected(self.options.keep_rejected)
            .clean()
    }

    pub fn run<I, S>(&self, inputs: I) -> Result<CleaningRun>
    where
        I: IntoIterator<Item = (S, DataFrame)>,
        S: Into<String>,
    {
        let policy = self.options.failure_policy;
        let mut run = CleaningRun::new(policy);
        let mut seen: HashSet<TableKey> = HashSet::new();

        for (name, raw) in inputs {
            let name: String = name.into();
            let result = if seen.insert(TableKey::new(&name)) {
                self.clean_table(&name, &raw)
            } else {
                Err(CleaningError::DuplicateTable {
                    table: name.clone(),
                })
            };

            match result {
                Ok(cleaned) => {
                    info!(
                        table = %name,
                        variant = %cleaned.variant,
                        input_rows = cleaned.stats.input_rows,
                        duplicates_removed = cleaned.stats.duplicates_removed,
                        rejected_rows = cleaned.stats.rejected_rows(),
                        output_rows = cleaned.stats.output_rows,
                        "table cleaned"
                    );
                    run.outcomes.push(TableOutcome::Cleaned {
                        table: name.clone(),
                        variant: cleaned.variant.clone(),
                        stats: cleaned.stats,
                    });
                    run.tables.insert(name, cleaned);
                }
                Err(err) => match policy {
                    FailurePolicy::FailFast => {
                        error!(table = %name, error = %err, "table failed, aborting run");
                        return Err(err);
                    }
                    FailurePolicy::SkipOnError => {
                        warn!(table = %name, error = %err, "table failed, skipping");
                        let variant = self.variant_label(&name);
                        run.outcomes.push(TableOutcome::Failed {
                            table: name,
                            variant,
                            error: err,
                        });
                    }
                },
            }
        }

        info!(
            cleaned = run.tables.len(),
            failed = run.failed_tables().len(),
            policy = %policy,
            "cleaning run complete"
        );
        Ok(run)
    }

    fn variant_label(&self, table_name: &str) -> String {
        self.factory
            .resolve(table_name)
            .map_or("unregistered", |variant| variant.label())
            .to_string()
    }
}

/// What happened to one input table.
#[derive(Debug)]
pub enum TableOutcome {
    Cleaned {
        table: String,
        variant: String,
        stats: TableStats,
    },
    Failed {
        table: String,
        variant: String,
        error: CleaningError,
    },
}

impl TableOutcome {
    pub fn table(&self) -> &str {
        match self {
            TableOutcome::Cleaned { table, .. } | TableOutcome::Failed { table, .. } => table,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TableOutcome::Failed { .. })
    }

    pub fn summary(&self) -> TableSummary {
        match self {
            TableOutcome::Cleaned {
                table,
                variant,
                stats,
            } => TableSummary::cleaned(table, variant, *stats),
            TableOutcome::Failed {
                table,
                variant,
                error,
            } => TableSummary::failed(table, variant, error.to_string()),
        }
    }
}

/// Result of a cleaning run.
#[derive(Debug)]
pub struct CleaningRun {
    pub policy: FailurePolicy,
    /// Cleaned tables keyed by the caller's table name.
    pub tables: BTreeMap<String, CleanedTable>,
    /// One entry per input table, in processing order.
    pub outcomes: Vec<TableOutcome>,
}

impl CleaningRun {
    fn new(policy: FailurePolicy) -> Self {
        Self {
            policy,
            tables: BTreeMap::new(),
            outcomes: Vec::new(),
        }
    }

    /// Every table name the run was given, in input order.
    pub fn requested_tables(&self) -> Vec<&str> {
        self.outcomes.iter().map(TableOutcome::table).collect()
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_failed())
            .map(TableOutcome::table)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        !self.outcomes.iter().any(TableOutcome::is_failed)
    }

    pub fn get(&self, table_name: &str) -> Option<&CleanedTable> {
        self.tables.get(table_name)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            policy: self.policy,
            tables: self.outcomes.iter().map(TableOutcome::summary).collect(),
        }
    }

    /// Cleaned frames only, ready for a loader.
    pub fn into_frames(self) -> BTreeMap<String, DataFrame> {
        self.tables
            .into_iter()
            .map(|(name, cleaned)| (name, cleaned.data))
            .collect()
    }
}
