//! `tsr timeline`: the reconstructed work/break timeline.

use std::fmt::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tsr_core::{DailyTotal, DayBoundaryTimeZone, DayReport, ReconstructionConfig, Segment, format_hhmm};

use super::util::{clock, day_heading, load_reports, timezone_name};
use crate::{InputArgs, OutputFormat};

/// Writes one row per segment followed by the work/break totals.
pub fn write_segment_rows(
    output: &mut String,
    segments: &[Segment],
    totals: DailyTotal,
    tz: DayBoundaryTimeZone,
) {
    for segment in segments {
        writeln!(
            output,
            "  {} - {}  {:<5}  {:>4}m",
            clock(segment.start, tz),
            clock(segment.end, tz),
            segment.kind.as_str(),
            segment.duration_minutes
        )
        .unwrap();
    }
    writeln!(output, "  Work:  {}", format_hhmm(totals.work_minutes * 60)).unwrap();
    writeln!(output, "  Break: {}", format_hhmm(totals.break_minutes * 60)).unwrap();
}

/// Formats timelines as human-readable text.
pub fn format_timeline(reports: &[DayReport], tz: DayBoundaryTimeZone) -> String {
    let mut output = String::new();
    if reports.is_empty() {
        writeln!(output, "No time entries recorded.").unwrap();
        return output;
    }

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            writeln!(output).unwrap();
        }
        writeln!(output, "TIMELINE: {}", day_heading(report.date)).unwrap();
        if report.segments.is_empty() {
            writeln!(output, "  (no activity long enough to sample)").unwrap();
            continue;
        }
        write_segment_rows(&mut output, &report.segments, report.totals, tz);
    }
    output
}

/// Formats timelines as tab-separated rows: date, kind, start, end, minutes.
pub fn format_timeline_tsv(reports: &[DayReport], tz: DayBoundaryTimeZone) -> String {
    let mut output = String::new();
    for report in reports {
        let date = report.date.map(|d| d.to_string()).unwrap_or_default();
        for segment in &report.segments {
            writeln!(
                output,
                "{date}\t{}\t{}\t{}\t{}",
                segment.kind,
                clock(segment.start, tz),
                clock(segment.end, tz),
                segment.duration_minutes
            )
            .unwrap();
        }
    }
    output
}

#[derive(Debug, Serialize)]
struct JsonTimeline<'a> {
    timezone: String,
    days: Vec<JsonTimelineDay<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonTimelineDay<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
    segments: &'a [Segment],
    totals: DailyTotal,
}

/// Formats timelines as JSON.
pub fn format_timeline_json(reports: &[DayReport], timezone: String) -> Result<String> {
    let json = JsonTimeline {
        timezone,
        days: reports
            .iter()
            .map(|r| JsonTimelineDay {
                date: r.date,
                segments: &r.segments,
                totals: r.totals,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Runs the timeline command.
pub fn run(args: &InputArgs, config: &ReconstructionConfig) -> Result<()> {
    let reports = load_reports(args, config)?;
    let tz = config.day_boundary_time_zone;
    match args.format {
        OutputFormat::Human => print!("{}", format_timeline(&reports, tz)),
        OutputFormat::Tsv => print!("{}", format_timeline_tsv(&reports, tz)),
        OutputFormat::Json => println!("{}", format_timeline_json(&reports, timezone_name(tz))?),
    }
    Ok(())
}
