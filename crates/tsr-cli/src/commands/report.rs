//! `tsr report`: task totals and the timeline, one block per day.

use std::fmt::Write;

use anyhow::Result;
use serde::Serialize;
use tsr_core::{DayBoundaryTimeZone, DayReport, ReconstructionConfig};

use super::tasks::{format_tasks_tsv, write_task_rows};
use super::timeline::{format_timeline_tsv, write_segment_rows};
use super::util::{day_heading, load_reports, timezone_name};
use crate::{InputArgs, OutputFormat};

/// Formats full day reports as human-readable text.
pub fn format_report(reports: &[DayReport], tz: DayBoundaryTimeZone) -> String {
    let mut output = String::new();
    if reports.is_empty() {
        writeln!(output, "No time entries recorded.").unwrap();
        return output;
    }

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(output).unwrap();
        }
        writeln!(output, "TIME REPORT: {}", day_heading(report.date)).unwrap();

        writeln!(output).unwrap();
        writeln!(output, "TASKS").unwrap();
        writeln!(output, "─────").unwrap();
        write_task_rows(&mut output, &report.tasks);

        writeln!(output).unwrap();
        writeln!(output, "TIMELINE").unwrap();
        writeln!(output, "────────").unwrap();
        if report.segments.is_empty() {
            writeln!(output, "  (no activity long enough to sample)").unwrap();
        } else {
            write_segment_rows(&mut output, &report.segments, report.totals, tz);
        }
    }
    output
}

/// Formats full day reports as two tab-separated tables, tasks first.
pub fn format_report_tsv(reports: &[DayReport], tz: DayBoundaryTimeZone) -> String {
    let mut output = format_tasks_tsv(reports);
    output.push('\n');
    output.push_str(&format_timeline_tsv(reports, tz));
    output
}

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub timezone: String,
    pub days: &'a [DayReport],
}

/// Formats full day reports as JSON.
pub fn format_report_json(reports: &[DayReport], timezone: String) -> Result<String> {
    let report = JsonReport {
        timezone,
        days: reports,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Runs the report command.
pub fn run(args: &InputArgs, config: &ReconstructionConfig) -> Result<()> {
    let reports = load_reports(args, config)?;
    let tz = config.day_boundary_time_zone;
    match args.format {
        OutputFormat::Human => print!("{}", format_report(&reports, tz)),
        OutputFormat::Tsv => print!("{}", format_report_tsv(&reports, tz)),
        OutputFormat::Json => println!("{}", format_report_json(&reports, timezone_name(tz))?),
    }
    Ok(())
}
