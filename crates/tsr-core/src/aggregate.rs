//! Per-task totals.
//!
//! Entries are grouped by the exact `(description, project)` pair. Rows come
//! out in the order their key was first seen, which is the order users see in
//! the task list, so it must never depend on hash iteration order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entry::TimeEntry;

/// Aggregated time for one `(description, project)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTotal {
    pub description: String,
    pub project: String,

    /// Client of the first entry seen for this task.
    pub client: String,

    pub total_seconds: i64,

    /// `HH:MM`, floor-truncated from `total_seconds`.
    pub formatted_duration: String,
}

impl TaskTotal {
    fn seeded_from(entry: &TimeEntry) -> Self {
        let total_seconds = entry.duration_seconds();
        Self {
            description: entry.description.clone(),
            project: entry.project.clone(),
            client: entry.client.clone(),
            total_seconds,
            formatted_duration: format_hhmm(total_seconds),
        }
    }

    fn add(&mut self, seconds: i64) {
        self.total_seconds += seconds;
        self.formatted_duration = format_hhmm(self.total_seconds);
    }
}

/// Formats seconds as zero-padded `HH:MM`, flooring to whole minutes.
///
/// Hours are not wrapped at 24. Negative input formats as `00:00`.
pub fn format_hhmm(seconds: i64) -> String {
    let total_minutes = seconds.max(0) / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    format!("{hours:02}:{minutes:02}")
}

/// Sums entry durations per task, preserving first-seen order.
///
/// Overlapping entries are summed, not deduplicated: the result always
/// satisfies `sum(total_seconds) == sum(duration_seconds)`.
pub fn aggregate_tasks(entries: &[TimeEntry]) -> Vec<TaskTotal> {
    let mut totals: Vec<TaskTotal> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for entry in entries {
        let key = (entry.description.as_str(), entry.project.as_str());
        if let Some(&position) = index.get(&key) {
            totals[position].add(entry.duration_seconds());
        } else {
            index.insert(key, totals.len());
            totals.push(TaskTotal::seeded_from(entry));
        }
    }

    totals
}
