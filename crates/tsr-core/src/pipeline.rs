//! End-to-end processing of one or more days of entries.
//!
//! The task branch and the timeline branch are independent consumers of the
//! same normalized entry list. Days share nothing, so multi-day input is
//! processed in parallel.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::aggregate::{TaskTotal, aggregate_tasks};
use crate::config::ReconstructionConfig;
use crate::day::partition_by_day;
use crate::entry::{RawTimeEntry, TimeEntry, normalize_entries};
use crate::segment::{Segment, reconstruct_timeline};
use crate::totals::{DailyTotal, daily_total};

/// Everything derived from one day of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    /// Calendar date, when the report was built from partitioned input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub tasks: Vec<TaskTotal>,
    pub segments: Vec<Segment>,
    pub totals: DailyTotal,
}

/// Builds task totals and the work/break timeline for one day of entries.
pub fn process_day(entries: &[TimeEntry], config: &ReconstructionConfig) -> DayReport {
    let tasks = aggregate_tasks(entries);
    let segments = reconstruct_timeline(entries, config.step);
    let totals = daily_total(&segments);

    tracing::debug!(
        entries = entries.len(),
        tasks = tasks.len(),
        segments = segments.len(),
        work_minutes = totals.work_minutes,
        break_minutes = totals.break_minutes,
        "processed day"
    );

    DayReport {
        date: None,
        tasks,
        segments,
        totals,
    }
}

/// Normalizes raw provider records and processes them as one day.
///
/// Timestamps without an offset are read in the day-boundary zone.
pub fn process_raw_day(raw: &[RawTimeEntry], config: &ReconstructionConfig) -> DayReport {
    process_day(
        &normalize_entries(raw, config.day_boundary_time_zone),
        config,
    )
}

/// Splits entries into calendar days and processes each day independently.
///
/// Reports are ordered by date.
pub fn process_days(entries: &[TimeEntry], config: &ReconstructionConfig) -> Vec<DayReport> {
    let days: Vec<(NaiveDate, Vec<TimeEntry>)> =
        partition_by_day(entries, config.day_boundary_time_zone)
            .into_iter()
            .collect();

    days.par_iter()
        .map(|(date, day_entries)| DayReport {
            date: Some(*date),
            ..process_day(day_entries, config)
        })
        .collect()
}
