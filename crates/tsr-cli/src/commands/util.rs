//! Shared utilities for CLI commands: input loading and time formatting.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use tsr_core::{
    DayBoundaryTimeZone, DayReport, RawTimeEntry, ReconstructionConfig, entries_on,
    normalize_entries, process_day, process_days,
};

use crate::InputArgs;

/// Raw records parsed from an input document.
#[derive(Debug, Default)]
pub struct ParsedInput {
    pub records: Vec<RawTimeEntry>,
    /// Lines or array elements that were not valid time-entry JSON.
    pub malformed: usize,
}

/// Parses raw records from either a JSON array or JSON Lines.
///
/// Malformed elements are skipped and counted rather than failing the batch.
/// A document that looks like an array but is not valid JSON is an error.
pub fn parse_records(text: &str) -> Result<ParsedInput> {
    let trimmed = text.trim_start();
    let mut parsed = ParsedInput::default();

    if trimmed.starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(trimmed).context("invalid JSON array of time entries")?;
        for (idx, value) in values.into_iter().enumerate() {
            match serde_json::from_value::<RawTimeEntry>(value) {
                Ok(record) => parsed.records.push(record),
                Err(e) => {
                    tracing::debug!(index = idx, error = %e, "skipping malformed array element");
                    parsed.malformed += 1;
                }
            }
        }
        return Ok(parsed);
    }

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawTimeEntry>(line) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                tracing::debug!(line = idx + 1, error = %e, "skipping malformed line");
                parsed.malformed += 1;
            }
        }
    }
    Ok(parsed)
}

/// Reads the whole input from a file, or from stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => io::read_to_string(io::stdin()).context("failed to read stdin"),
    }
}

/// Loads input and builds one report per calendar day.
///
/// With `--date`, only entries starting on that date are kept and at most one
/// report is returned.
pub fn load_reports(args: &InputArgs, config: &ReconstructionConfig) -> Result<Vec<DayReport>> {
    let text = read_input(args.input.as_deref())?;
    let parsed = parse_records(&text)?;
    if parsed.malformed > 0 {
        eprintln!("Skipped {} malformed records", parsed.malformed);
    }

    let entries = normalize_entries(&parsed.records, config.day_boundary_time_zone);
    let dropped = parsed.records.len() - entries.len();
    if dropped > 0 {
        eprintln!("Dropped {dropped} entries with missing or invalid timestamps");
    }

    let reports = match args.date {
        Some(date) => {
            let day = entries_on(&entries, date, config.day_boundary_time_zone);
            if day.is_empty() {
                Vec::new()
            } else {
                vec![DayReport {
                    date: Some(date),
                    ..process_day(&day, config)
                }]
            }
        }
        None => process_days(&entries, config),
    };
    Ok(reports)
}

/// Formats an epoch instant as `HH:MM` wall-clock time in `tz`.
pub fn clock(epoch: i64, tz: DayBoundaryTimeZone) -> String {
    let Some(utc) = DateTime::from_timestamp(epoch, 0) else {
        return "??:??".to_string();
    };
    match tz {
        DayBoundaryTimeZone::Utc => utc.format("%H:%M").to_string(),
        DayBoundaryTimeZone::Local => utc.with_timezone(&Local).format("%H:%M").to_string(),
        DayBoundaryTimeZone::Fixed(offset) => utc.with_timezone(&offset).format("%H:%M").to_string(),
    }
}

/// Human description of a report date, e.g. "Wednesday, Jan 15, 2025".
pub fn day_heading(date: Option<NaiveDate>) -> String {
    date.map_or_else(
        || "All entries".to_string(),
        |d| d.format("%A, %b %-d, %Y").to_string(),
    )
}

/// Name of the zone for machine-readable output.
pub fn timezone_name(tz: DayBoundaryTimeZone) -> String {
    match tz {
        DayBoundaryTimeZone::Local => {
            iana_time_zone::get_timezone().unwrap_or_else(|_| tz.label())
        }
        _ => tz.label(),
    }
}
