//! Calendar-day boundaries.
//!
//! Which calendar day an entry belongs to depends on the time zone the day is
//! anchored to, so the zone is always an explicit parameter.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::entry::TimeEntry;

/// Time zone that anchors calendar-day boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundaryTimeZone {
    Utc,
    /// The host machine's local calendar.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

impl DayBoundaryTimeZone {
    /// Calendar date containing `epoch`, or `None` if out of range.
    pub fn date_of(&self, epoch: i64) -> Option<NaiveDate> {
        let utc = DateTime::from_timestamp(epoch, 0)?;
        Some(match self {
            Self::Utc => utc.date_naive(),
            Self::Local => utc.with_timezone(&Local).date_naive(),
            Self::Fixed(offset) => utc.with_timezone(offset).date_naive(),
        })
    }

    /// Half-open epoch bounds `[start, end)` of `date`.
    pub fn day_bounds(&self, date: NaiveDate) -> (i64, i64) {
        let next = date.succ_opt().unwrap_or(date);
        match self {
            Self::Utc => (midnight_epoch(&Utc, date), midnight_epoch(&Utc, next)),
            Self::Local => (midnight_epoch(&Local, date), midnight_epoch(&Local, next)),
            Self::Fixed(offset) => (midnight_epoch(offset, date), midnight_epoch(offset, next)),
        }
    }

    /// Epoch seconds of wall-clock time `local` in this zone.
    ///
    /// DST ambiguity resolves to the earlier instant; `None` inside a
    /// spring-forward gap.
    pub fn resolve_local(&self, local: NaiveDateTime) -> Option<i64> {
        match self {
            Self::Utc => Some(local.and_utc().timestamp()),
            Self::Local => Local.from_local_datetime(&local).earliest().map(|dt| dt.timestamp()),
            Self::Fixed(offset) => offset
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.timestamp()),
        }
    }

    /// Display label: `UTC`, the host's current UTC offset, or the fixed offset.
    pub fn label(&self) -> String {
        match self {
            Self::Utc => "UTC".to_string(),
            Self::Local => Local::now().offset().to_string(),
            Self::Fixed(offset) => offset.to_string(),
        }
    }
}

/// Epoch seconds of local midnight on `date` in `tz`.
///
/// DST ambiguity resolves to the earlier instant. When midnight does not exist
/// (spring-forward gap), the first existing hour of the day is used.
fn midnight_epoch<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    (0..=3)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| tz.from_local_datetime(&date.and_time(time)).earliest())
        .map_or_else(
            || date.and_time(NaiveTime::MIN).and_utc().timestamp(),
            |dt| dt.timestamp(),
        )
}

impl fmt::Display for DayBoundaryTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => write!(f, "utc"),
            Self::Local => write!(f, "local"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for DayBoundaryTimeZone {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => trimmed
                .parse::<FixedOffset>()
                .map(Self::Fixed)
                .map_err(|_| ConfigError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl Serialize for DayBoundaryTimeZone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DayBoundaryTimeZone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Groups entries by the calendar date of their start.
///
/// Entries keep their relative input order within a day. An entry that runs
/// past midnight stays whole on the day it started.
pub fn partition_by_day(
    entries: &[TimeEntry],
    tz: DayBoundaryTimeZone,
) -> BTreeMap<NaiveDate, Vec<TimeEntry>> {
    let mut days: BTreeMap<NaiveDate, Vec<TimeEntry>> = BTreeMap::new();
    for entry in entries {
        if let Some(date) = tz.date_of(entry.start) {
            days.entry(date).or_default().push(entry.clone());
        } else {
            tracing::warn!(id = %entry.id, start = entry.start, "entry start out of calendar range");
        }
    }
    days
}

/// Entries whose start falls on `date`.
pub fn entries_on(entries: &[TimeEntry], date: NaiveDate, tz: DayBoundaryTimeZone) -> Vec<TimeEntry> {
    let (start, end) = tz.day_bounds(date);
    entries
        .iter()
        .filter(|e| e.start >= start && e.start < end)
        .cloned()
        .collect()
}
