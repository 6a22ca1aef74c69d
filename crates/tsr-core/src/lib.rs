//! Core domain logic for timesheet reconstruction.
//!
//! Turns a day of raw, possibly-overlapping time-tracking records into:
//! - Task totals: time summed per `(description, project)`, in first-seen order
//! - A timeline: contiguous work segments and the breaks between them
//! - Daily totals: work and break minutes for that timeline
//!
//! Everything here is a pure, synchronous function of its input.

mod aggregate;
mod config;
pub mod day;
mod entry;
mod pipeline;
pub mod presence;
mod segment;
mod totals;

pub use aggregate::{TaskTotal, aggregate_tasks, format_hhmm};
pub use config::{ConfigError, DEFAULT_STEP_SECS, ReconstructionConfig};
pub use day::{DayBoundaryTimeZone, entries_on, partition_by_day};
pub use entry::{
    RawId, RawTimeEntry, RejectReason, TimeEntry, TimestampError, normalize_entries,
    normalize_entry, parse_epoch_seconds,
};
pub use pipeline::{DayReport, process_day, process_days, process_raw_day};
pub use presence::{PresenceSample, PresenceSamples, SampleWindow, sample_presence};
pub use segment::{
    Segment, SegmentKind, TimelineViolation, extract_segments, reconstruct_timeline,
    validate_timeline,
};
pub use totals::{DailyTotal, daily_total};
