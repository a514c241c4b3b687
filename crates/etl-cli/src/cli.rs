//! CLI argument definitions for the table cleaner.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use etl_model::LogicalType;

#[derive(Parser)]
#[command(
    name = "etl-clean",
    version,
    about = "Clean and validate raw e-commerce table exports",
    long_about = "Clean and validate raw e-commerce table exports.\n\n\
                  Removes duplicate rows, coerces columns to their declared types and \
                  drops orders whose lifecycle milestones are inconsistent."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Prefix pretty and compact log lines with a timestamp.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean every CSV export in a folder.
    Clean(CleanArgs),

    /// List the registered tables and their cleaners.
    Tables,

    /// Show the column contract of one table.
    Schema(SchemaArgs),
}

#[derive(Parser)]
pub struct CleanArgs {
    /// Folder containing the raw CSV exports.
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Output directory for cleaned tables (default: <INPUT_DIR>/cleaned).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write rows removed by validation to this directory.
    #[arg(long = "quarantine-dir", value_name = "DIR")]
    pub quarantine_dir: Option<PathBuf>,

    /// Keep going when a table fails, leaving it out of the output.
    ///
    /// By default the first failing table aborts the whole run and nothing
    /// is written.
    #[arg(long = "skip-on-error")]
    pub skip_on_error: bool,

    /// Only clean these tables (repeatable).
    #[arg(long = "table", value_name = "NAME")]
    pub tables: Vec<String>,

    /// Clean and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Write the run summary as JSON to this path.
    #[arg(long = "summary-json", value_name = "PATH")]
    pub summary_json: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Table name (case and separators are ignored).
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Only show columns of this type (e.g. timestamp, Int64, string).
    #[arg(long = "type", value_name = "TYPE")]
    pub column_type: Option<LogicalType>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
