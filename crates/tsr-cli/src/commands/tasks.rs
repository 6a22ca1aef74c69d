//! `tsr tasks`: time summed per task.

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tsr_core::{DayReport, ReconstructionConfig, TaskTotal, format_hhmm};

use super::util::{day_heading, load_reports, timezone_name};
use crate::{InputArgs, OutputFormat};

/// Label for a task row: description plus client/project when present.
pub fn task_label(task: &TaskTotal) -> String {
    let description = if task.description.is_empty() {
        "(no description)"
    } else {
        task.description.as_str()
    };
    match (task.client.is_empty(), task.project.is_empty()) {
        (true, true) => description.to_string(),
        (true, false) => format!("{description} [{}]", task.project),
        (false, true) => format!("{description} [{}]", task.client),
        (false, false) => format!("{description} [{} / {}]", task.client, task.project),
    }
}

/// Writes the task rows and their total for one day.
pub fn write_task_rows(output: &mut String, tasks: &[TaskTotal]) {
    for task in tasks {
        writeln!(output, "  {:>5}  {}", task.formatted_duration, task_label(task)).unwrap();
    }
    let total: i64 = tasks.iter().map(|t| t.total_seconds).sum();
    writeln!(output, "  {:>5}  Total", format_hhmm(total)).unwrap();
}

/// Formats task totals as human-readable text.
pub fn format_tasks(reports: &[DayReport]) -> String {
    let mut output = String::new();
    if reports.is_empty() {
        writeln!(output, "No time entries recorded.").unwrap();
        return output;
    }

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(output).unwrap();
        }
        writeln!(output, "TASKS: {}", day_heading(report.date)).unwrap();
        write_task_rows(&mut output, &report.tasks);
    }
    output
}

/// Formats task totals as tab-separated rows:
/// date, description, project, client, `HH:MM`.
pub fn format_tasks_tsv(reports: &[DayReport]) -> String {
    let mut output = String::new();
    for report in reports {
        let date = report.date.map(|d| d.to_string()).unwrap_or_default();
        for task in &report.tasks {
            writeln!(
                output,
                "{date}\t{}\t{}\t{}\t{}",
                tsv_field(&task.description),
                tsv_field(&task.project),
                tsv_field(&task.client),
                task.formatted_duration
            )
            .unwrap();
        }
    }
    output
}

/// Replaces characters that would break a tab-separated row.
pub fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

#[derive(Debug, Serialize)]
struct JsonTasks<'a> {
    timezone: String,
    days: Vec<JsonTaskDay<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonTaskDay<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    tasks: &'a [TaskTotal],
}

/// Formats task totals as JSON.
pub fn format_tasks_json(reports: &[DayReport], timezone: String) -> Result<String> {
    let json = JsonTasks {
        timezone,
        days: reports
            .iter()
            .map(|r| JsonTaskDay {
                date: r.date,
                tasks: &r.tasks,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Runs the tasks command.
pub fn run(args: &InputArgs, config: &ReconstructionConfig) -> Result<()> {
    let reports = load_reports(args, config)?;
    match args.format {
        OutputFormat::Human => print!("{}", format_tasks(&reports)),
        OutputFormat::Tsv => print!("{}", format_tasks_tsv(&reports)),
        OutputFormat::Json => {
            let timezone = timezone_name(config.day_boundary_time_zone);
            println!("{}", format_tasks_json(&reports, timezone)?);
        }
    }
    Ok(())
}
