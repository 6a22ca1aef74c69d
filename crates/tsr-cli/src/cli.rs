//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Rebuild timesheets from exported time entries.
///
/// Reads raw time-tracking records and derives per-task totals and a
/// work/break timeline suitable for re-entry into another timesheet.
#[derive(Debug, Parser)]
#[command(name = "tsr", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show time summed per task (description and project).
    Tasks(InputArgs),

    /// Show the reconstructed work/break timeline.
    Timeline(InputArgs),

    /// Show task totals and the timeline together.
    Report(InputArgs),
}

/// Input selection and rendering options shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// File with raw entries as a JSON array or JSON Lines. Reads stdin if omitted.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Only process entries starting on this date (YYYY-MM-DD).
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Seconds between presence samples (overrides config).
    #[arg(long)]
    pub step: Option<u32>,

    /// Time zone for day boundaries: "utc", "local" or an offset like "+02:00"
    /// (overrides config).
    #[arg(long = "tz")]
    pub time_zone: Option<String>,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned, human-readable text.
    Human,
    /// Pretty-printed JSON.
    Json,
    /// Tab-separated rows for pasting into a timesheet.
    Tsv,
}
