//! Folder-level cleaning workflow.
//!
//! Ties the ingest crate to the cleaning core: discover the raw CSV exports
//! in a folder, read them, hand the batch to a [`CleaningPipeline`] and
//! write the cleaned tables (and optionally the quarantined rows) back out.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span, warn};

use etl_core::{CleanerFactory, CleaningPipeline, CleaningRun};
use etl_ingest::{DiscoveredTable, discover_tables, read_table_csv, write_table_csv};
use etl_model::{CleaningOptions, FailurePolicy, RunSummary, TableKey, TableSummary};

/// Directory name used under the input folder when no output dir is given.
pub const DEFAULT_OUTPUT_DIR: &str = "cleaned";

/// Suffix appended to a table name for its quarantine file.
pub const REJECTED_SUFFIX: &str = "_rejected";

/// What to clean and where the results go.
#[derive(Debug, Clone)]
pub struct CleanRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub quarantine_dir: Option<PathBuf>,
    /// Restrict the run to these tables. Empty means every discovered file.
    pub tables: Vec<String>,
    pub dry_run: bool,
    pub failure_policy: FailurePolicy,
}

impl CleanRequest {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        let input_dir = input_dir.into();
        let output_dir = input_dir.join(DEFAULT_OUTPUT_DIR);
        Self {
            input_dir,
            output_dir,
            quarantine_dir: None,
            tables: Vec::new(),
            dry_run: false,
            failure_policy: FailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }

    #[must_use]
    pub fn with_quarantine_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.quarantine_dir = dir;
        self
    }

    #[must_use]
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Rejected rows are only collected when there is somewhere to put them.
    pub fn cleaning_options(&self) -> CleaningOptions {
        CleaningOptions::new()
            .with_failure_policy(self.failure_policy)
            .with_keep_rejected(self.quarantine_dir.is_some())
    }
}

/// Files written for one cleaned table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTable {
    pub table: String,
    pub output: PathBuf,
    pub rejected: Option<PathBuf>,
}

/// Outcome of [`clean_folder`].
#[derive(Debug)]
pub struct FolderRun {
    pub summary: RunSummary,
    /// Empty on a dry run.
    pub written: Vec<WrittenTable>,
    /// Requested via `--table` but not found in the input folder.
    pub missing_tables: Vec<String>,
}

impl FolderRun {
    pub fn has_failures(&self) -> bool {
        self.summary.has_failures()
    }
}

/// Clean every selected CSV export in `request.input_dir`.
///
/// Under fail-fast the first table that cannot be read or cleaned aborts the
/// run before anything is written. Under skip-on-error such tables are
/// reported as failed and left out of the output.
pub fn clean_folder(request: &CleanRequest, factory: CleanerFactory) -> Result<FolderRun> {
    let span = info_span!("clean_folder", input = %request.input_dir.display());
    let _enter = span.enter();

    // Stage 1: discover
    let discovered = discover_tables(&request.input_dir).with_context(|| {
        format!(
            "failed to list CSV files in {}",
            request.input_dir.display()
        )
    })?;
    let (selected, missing_tables) = select_tables(discovered, &request.tables);
    for name in &missing_tables {
        warn!(table = %name, "requested table has no CSV file in the input folder");
    }
    info!(tables = selected.len(), "discovered input tables");

    // Stage 2: read
    let mut inputs: Vec<(String, DataFrame)> = Vec::with_capacity(selected.len());
    let mut read_failures: Vec<TableSummary> = Vec::new();
    for table in selected {
        match read_table_csv(&table.path) {
            Ok(df) => {
                debug!(table = %table.name, rows = df.height(), "read table");
                inputs.push((table.name, df));
            }
            Err(err) => match request.failure_policy {
                FailurePolicy::FailFast => {
                    return Err(err).with_context(|| format!("failed to read table {}", table.name));
                }
                FailurePolicy::SkipOnError => {
                    warn!(table = %table.name, error = %err, "table unreadable, skipping");
                    let variant = factory
                        .resolve(&table.name)
                        .map_or("unregistered", |variant| variant.label())
                        .to_string();
                    read_failures.push(TableSummary::failed(table.name, variant, err.to_string()));
                }
            },
        }
    }

    // Stage 3: clean
    let pipeline = CleaningPipeline::new(factory, request.cleaning_options());
    let run = pipeline.run(inputs).context("cleaning run aborted")?;
    let mut summary = run.summary();
    summary.tables.extend(read_failures);

    // Stage 4: write
    let written = if request.dry_run {
        info!("dry run, no files written");
        Vec::new()
    } else {
        write_outputs(request, &run)?
    };

    Ok(FolderRun {
        summary,
        written,
        missing_tables,
    })
}

/// Keep the discovered tables named in `requested`, matched by lookup key.
fn select_tables(
    discovered: Vec<DiscoveredTable>,
    requested: &[String],
) -> (Vec<DiscoveredTable>, Vec<String>) {
    if requested.is_empty() {
        return (discovered, Vec::new());
    }
    let wanted: HashSet<TableKey> = requested.iter().map(|name| TableKey::new(name)).collect();
    let found: HashSet<TableKey> = discovered
        .iter()
        .map(|table| TableKey::new(&table.name))
        .collect();
    let missing = requested
        .iter()
        .filter(|name| !found.contains(&TableKey::new(name)))
        .cloned()
        .collect();
    let selected = discovered
        .into_iter()
        .filter(|table| wanted.contains(&TableKey::new(&table.name)))
        .collect();
    (selected, missing)
}

fn write_outputs(request: &CleanRequest, run: &CleaningRun) -> Result<Vec<WrittenTable>> {
    if run.tables.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(&request.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            request.output_dir.display()
        )
    })?;
    if let Some(dir) = &request.quarantine_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create quarantine directory {}", dir.display()))?;
    }

    let mut written = Vec::with_capacity(run.tables.len());
    for (name, cleaned) in &run.tables {
        let output = request.output_dir.join(format!("{name}.csv"));
        write_table_csv(&cleaned.data, &output)
            .with_context(|| format!("failed to write cleaned table {name}"))?;
        debug!(table = %name, path = %output.display(), "wrote cleaned table");

        let rejected = match &request.quarantine_dir {
            Some(dir) if cleaned.has_rejections() => {
                let path = dir.join(format!("{name}{REJECTED_SUFFIX}.csv"));
                write_table_csv(&cleaned.rejected, &path)
                    .with_context(|| format!("failed to write rejected rows for {name}"))?;
                debug!(table = %name, path = %path.display(), "wrote rejected rows");
                Some(path)
            }
            _ => None,
        };

        written.push(WrittenTable {
            table: name.clone(),
            output,
            rejected,
        });
    }
    info!(
        tables = written.len(),
        output = %request.output_dir.display(),
        "wrote cleaned tables"
    );
    Ok(written)
}

/// Serialize the run summary as pretty JSON.
pub fn write_summary_json(summary: &RunSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create summary file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .with_context(|| format!("failed to write summary file {}", path.display()))?;
    Ok(())
}
