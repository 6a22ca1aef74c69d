//! Raw provider records and their normalization into canonical time entries.
//!
//! A raw record carries ISO-8601 timestamps and loosely-typed labels exactly as
//! the time-tracking provider exported them. Normalization parses the
//! boundaries into epoch seconds and drops records that cannot be placed on a
//! timeline, so one bad record never blocks the rest of the day.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::day::DayBoundaryTimeZone;

/// Tolerance before a provider-reported duration is flagged as inconsistent.
const DURATION_MISMATCH_TOLERANCE_SECS: i64 = 1;

/// Identifier as reported by the provider (numeric or textual).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A time entry exactly as exported by the provider.
///
/// Every field is optional; missing labels normalize to empty strings and
/// missing timestamps cause the record to be rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTimeEntry {
    #[serde(default)]
    pub id: Option<RawId>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub client: Option<String>,

    /// Toggl spelling of `client`; used when `client` is absent.
    #[serde(default)]
    pub client_name: Option<String>,

    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub project_name: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// ISO-8601 start timestamp.
    #[serde(default)]
    pub start: Option<String>,

    /// ISO-8601 end timestamp. Absent for a timer that is still running.
    #[serde(default)]
    pub end: Option<String>,

    #[serde(default)]
    pub stop: Option<String>,

    /// Duration reported by the provider, in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<i64>,

    #[serde(default)]
    pub dur: Option<i64>,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub project_hex_color: Option<String>,
}

impl RawTimeEntry {
    /// Client label, preferring `client` over `client_name`.
    pub fn client_label(&self) -> Option<&str> {
        self.client.as_deref().or(self.client_name.as_deref())
    }

    /// Project label, preferring `project` over `project_name`.
    pub fn project_label(&self) -> Option<&str> {
        self.project.as_deref().or(self.project_name.as_deref())
    }

    /// End timestamp, preferring `end` over `stop`.
    pub fn end_timestamp(&self) -> Option<&str> {
        self.end.as_deref().or(self.stop.as_deref())
    }

    pub fn reported_duration_ms(&self) -> Option<i64> {
        self.duration_ms.or(self.dur)
    }

    pub fn color_hint(&self) -> Option<&str> {
        self.color.as_deref().or(self.project_hex_color.as_deref())
    }
}

/// A canonical recorded activity with integer epoch-second boundaries.
///
/// Invariant: `end >= start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: String,
    pub description: String,
    pub client: String,
    pub project: String,
    pub tags: BTreeSet<String>,

    /// Start, in seconds since the Unix epoch.
    pub start: i64,

    /// End, in seconds since the Unix epoch.
    pub end: i64,

    /// Display hint, opaque to every algorithm in this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_tag: Option<String>,
}

impl TimeEntry {
    /// Creates an unlabeled entry spanning `start..end`.
    pub fn new(id: impl Into<String>, start: i64, end: i64) -> Result<Self, RejectReason> {
        if end < start {
            return Err(RejectReason::EndBeforeStart { start, end });
        }
        Ok(Self {
            id: id.into(),
            description: String::new(),
            client: String::new(),
            project: String::new(),
            tags: BTreeSet::new(),
            start,
            end,
            color_tag: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the project.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Sets the client.
    #[must_use]
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Duration derived from the boundaries.
    pub const fn duration_seconds(&self) -> i64 {
        self.end - self.start
    }
}

/// Why a timestamp could not be turned into epoch seconds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error(transparent)]
    Parse(#[from] chrono::ParseError),

    /// A wall-clock time that falls into a DST gap of the resolving zone.
    #[error("local time {local} does not exist in {zone}")]
    NonexistentLocalTime {
        local: NaiveDateTime,
        zone: DayBoundaryTimeZone,
    },
}

/// Why a raw record was dropped during normalization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("missing start timestamp")]
    MissingStart,

    #[error("invalid start timestamp {value:?}: {source}")]
    InvalidStart {
        value: String,
        source: TimestampError,
    },

    /// No end timestamp; the timer is most likely still running.
    #[error("missing end timestamp")]
    MissingEnd,

    #[error("invalid end timestamp {value:?}: {source}")]
    InvalidEnd {
        value: String,
        source: TimestampError,
    },

    #[error("end {end} is before start {start}")]
    EndBeforeStart { start: i64, end: i64 },
}

/// Minute-precision forms carrying a numeric offset, which RFC 3339 rejects.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

/// Wall-clock forms without an offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp into epoch seconds.
///
/// RFC 3339 is tried first. Minute precision is accepted with or without an
/// offset or `Z`; a timestamp without any offset is read as wall-clock time in
/// `tz`, with DST ambiguity resolved to the earlier instant. Sub-second
/// precision is truncated toward the start of the second.
pub fn parse_epoch_seconds(value: &str, tz: DayBoundaryTimeZone) -> Result<i64, TimestampError> {
    let value = value.trim();
    let rfc3339_err = match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => return Ok(dt.timestamp()),
        Err(err) => err,
    };

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(value, format).ok())
    {
        return Ok(dt.timestamp());
    }

    let (wall_clock, zone) = match value.strip_suffix(['Z', 'z']) {
        Some(rest) => (rest, DayBoundaryTimeZone::Utc),
        None => (value, tz),
    };
    let local = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(wall_clock, format).ok())
        .ok_or(rfc3339_err)?;
    zone.resolve_local(local)
        .ok_or(TimestampError::NonexistentLocalTime { local, zone })
}

/// Normalizes a single raw record, reading offset-less timestamps in `tz`.
pub fn normalize_entry(
    raw: &RawTimeEntry,
    tz: DayBoundaryTimeZone,
) -> Result<TimeEntry, RejectReason> {
    let start_str = raw.start.as_deref().ok_or(RejectReason::MissingStart)?;
    let start = parse_epoch_seconds(start_str, tz).map_err(|source| RejectReason::InvalidStart {
        value: start_str.to_string(),
        source,
    })?;

    let end_str = raw.end_timestamp().ok_or(RejectReason::MissingEnd)?;
    let end = parse_epoch_seconds(end_str, tz).map_err(|source| RejectReason::InvalidEnd {
        value: end_str.to_string(),
        source,
    })?;

    let mut entry = TimeEntry::new(
        raw.id.as_ref().map(ToString::to_string).unwrap_or_default(),
        start,
        end,
    )?;
    entry.description = raw.description.clone().unwrap_or_default();
    entry.client = raw.client_label().unwrap_or_default().to_string();
    entry.project = raw.project_label().unwrap_or_default().to_string();
    entry.tags = raw.tags.iter().flatten().cloned().collect();
    entry.color_tag = raw.color_hint().map(String::from);
    Ok(entry)
}

/// Normalizes a batch of raw records, dropping the ones that cannot be parsed.
///
/// Input order is preserved for the surviving entries. A provider-reported
/// duration that disagrees with the timestamps is logged and otherwise ignored;
/// the derived duration always wins.
pub fn normalize_entries(raw: &[RawTimeEntry], tz: DayBoundaryTimeZone) -> Vec<TimeEntry> {
    let entries: Vec<TimeEntry> = raw
        .iter()
        .filter_map(|record| match normalize_entry(record, tz) {
            Ok(entry) => {
                check_reported_duration(record, &entry);
                Some(entry)
            }
            Err(reason) => {
                tracing::debug!(id = ?record.id, %reason, "dropping time entry");
                None
            }
        })
        .collect();

    tracing::debug!(
        received = raw.len(),
        kept = entries.len(),
        "normalized time entries"
    );
    entries
}

fn check_reported_duration(raw: &RawTimeEntry, entry: &TimeEntry) {
    let Some(reported_ms) = raw.reported_duration_ms().filter(|ms| *ms >= 0) else {
        return;
    };
    let reported = reported_ms / 1000;
    let derived = entry.duration_seconds();
    if (reported - derived).abs() > DURATION_MISMATCH_TOLERANCE_SECS {
        tracing::warn!(
            id = %entry.id,
            reported_secs = reported,
            derived_secs = derived,
            "reported duration disagrees with timestamps; using timestamps"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTC: DayBoundaryTimeZone = DayBoundaryTimeZone::Utc;

    fn raw(start: Option<&str>, end: Option<&str>) -> RawTimeEntry {
        RawTimeEntry {
            id: Some(RawId::Number(1)),
            description: Some("Write report".to_string()),
            client: Some("Acme".to_string()),
            project: Some("Internal".to_string()),
            tags: Some(vec!["b".to_string(), "a".to_string(), "a".to_string()]),
            start: start.map(String::from),
            end: end.map(String::from),
            color: Some("#ff0000".to_string()),
            ..RawTimeEntry::default()
        }
    }

    #[test]
    fn normalizes_complete_record() {
        let record = raw(Some("2025-01-15T09:00:00Z"), Some("2025-01-15T09:30:00Z"));
        let entry = normalize_entry(&record, UTC).unwrap();

        assert_eq!(entry.id, "1");
        assert_eq!(entry.description, "Write report");
        assert_eq!(entry.client, "Acme");
        assert_eq!(entry.project, "Internal");
        assert_eq!(entry.start, 1_736_931_600);
        assert_eq!(entry.duration_seconds(), 1800);
        assert_eq!(entry.color_tag.as_deref(), Some("#ff0000"));
        let tags: Vec<_> = entry.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, ["a", "b"]);
    }

    #[test]
    fn offsets_are_converted_to_epoch() {
        let utc = parse_epoch_seconds("2025-01-15T09:00:00Z", UTC).unwrap();
        let offset = parse_epoch_seconds("2025-01-15T11:00:00+02:00", UTC).unwrap();
        assert_eq!(utc, offset);
    }

    #[test]
    fn fractional_seconds_truncate() {
        let whole = parse_epoch_seconds("2025-01-15T09:00:00Z", UTC).unwrap();
        let frac = parse_epoch_seconds("2025-01-15T09:00:00.999Z", UTC).unwrap();
        assert_eq!(whole, frac);
    }

    #[test]
    fn missing_labels_become_empty_strings() {
        let record = RawTimeEntry {
            start: Some("2025-01-15T09:00:00Z".to_string()),
            end: Some("2025-01-15T09:10:00Z".to_string()),
            ..RawTimeEntry::default()
        };
        let entry = normalize_entry(&record, UTC).unwrap();
        assert_eq!(entry.id, "");
        assert_eq!(entry.description, "");
        assert_eq!(entry.client, "");
        assert_eq!(entry.project, "");
        assert!(entry.tags.is_empty());
        assert!(entry.color_tag.is_none());
    }

    #[test]
    fn rejects_running_entry() {
        let err = normalize_entry(&raw(Some("2025-01-15T09:00:00Z"), None), UTC).unwrap_err();
        assert_eq!(err, RejectReason::MissingEnd);
    }

    #[test]
    fn rejects_unparseable_timestamps() {
        let err = normalize_entry(&raw(Some("yesterday"), Some("2025-01-15T09:00:00Z")), UTC);
        assert!(matches!(err, Err(RejectReason::InvalidStart { .. })));

        let err = normalize_entry(&raw(Some("2025-01-15T09:00:00Z"), Some("")), UTC);
        assert!(matches!(err, Err(RejectReason::InvalidEnd { .. })));
    }

    #[test]
    fn rejects_end_before_start() {
        let record = raw(Some("2025-01-15T10:00:00Z"), Some("2025-01-15T09:00:00Z"));
        let err = normalize_entry(&record, UTC).unwrap_err();
        assert!(matches!(err, RejectReason::EndBeforeStart { .. }));
    }

    #[test]
    fn zero_duration_is_kept() {
        let record = raw(Some("2025-01-15T09:00:00Z"), Some("2025-01-15T09:00:00Z"));
        let entry = normalize_entry(&record, UTC).unwrap();
        assert_eq!(entry.duration_seconds(), 0);
    }

    #[test]
    fn batch_drops_bad_records_and_keeps_order() {
        let mut second = raw(Some("2025-01-15T10:00:00Z"), Some("2025-01-15T10:15:00Z"));
        second.id = Some(RawId::Text("second".to_string()));
        let records = vec![
            raw(Some("2025-01-15T09:00:00Z"), Some("2025-01-15T09:30:00Z")),
            raw(Some("not a date"), Some("2025-01-15T09:30:00Z")),
            raw(Some("2025-01-15T09:00:00Z"), None),
            second,
        ];

        let entries = normalize_entries(&records, UTC);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["1", "second"]);
    }

    #[test]
    fn reported_duration_mismatch_is_not_fatal() {
        let mut record = raw(Some("2025-01-15T09:00:00Z"), Some("2025-01-15T09:30:00Z"));
        record.duration_ms = Some(60_000);
        let entries = normalize_entries(&[record], UTC);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_seconds(), 1800);
    }

    #[test]
    fn deserializes_provider_aliases() {
        let json = r##"{
            "id": 42,
            "description": "Standup",
            "client_name": "Acme",
            "project_name": "Ops",
            "tags": null,
            "start": "2025-01-15T09:00:00+00:00",
            "stop": "2025-01-15T09:15:00+00:00",
            "dur": 900000,
            "project_hex_color": "#00ff00",
            "billable": true
        }"##;
        let record: RawTimeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(RawId::Number(42)));
        assert_eq!(record.client_label(), Some("Acme"));
        assert_eq!(record.project_label(), Some("Ops"));
        assert_eq!(record.end_timestamp(), Some("2025-01-15T09:15:00+00:00"));
        assert_eq!(record.reported_duration_ms(), Some(900_000));

        let entry = normalize_entry(&record, UTC).unwrap();
        assert_eq!(entry.duration_seconds(), 900);
        assert_eq!(entry.color_tag.as_deref(), Some("#00ff00"));
    }

    #[test]
    fn canonical_key_and_alias_together_deserialize() {
        let json = r##"{
            "id": 7,
            "client": "Acme",
            "client_name": "Acme Corp",
            "project": "Ops",
            "project_name": "Operations",
            "start": "2025-01-15T09:00:00Z",
            "end": "2025-01-15T09:30:00Z",
            "stop": "2025-01-15T09:45:00Z",
            "duration_ms": 1800000,
            "dur": 2700000,
            "color": "#ff0000",
            "project_hex_color": "#00ff00"
        }"##;
        let record: RawTimeEntry = serde_json::from_str(json).unwrap();

        let entry = normalize_entry(&record, UTC).unwrap();
        assert_eq!(entry.client, "Acme");
        assert_eq!(entry.project, "Ops");
        assert_eq!(entry.duration_seconds(), 1800);
        assert_eq!(entry.color_tag.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn offsetless_timestamps_resolve_in_day_zone() {
        let record = raw(Some("2025-01-15T09:00:00"), Some("2025-01-15T09:30:00.250"));
        let entry = normalize_entry(&record, UTC).unwrap();
        assert_eq!(entry.start, 1_736_931_600);
        assert_eq!(entry.duration_seconds(), 1800);

        let plus_two: DayBoundaryTimeZone = "+02:00".parse().unwrap();
        let shifted = normalize_entry(&record, plus_two).unwrap();
        assert_eq!(shifted.start, 1_736_931_600 - 7_200);
        assert_eq!(shifted.duration_seconds(), 1800);
    }

    #[test]
    fn minute_precision_timestamps_parse() {
        let nine = 1_736_931_600;
        assert_eq!(parse_epoch_seconds("2025-01-15T09:00Z", UTC), Ok(nine));
        assert_eq!(parse_epoch_seconds("2025-01-15T11:00+02:00", UTC), Ok(nine));
        assert_eq!(parse_epoch_seconds("2025-01-15T09:00", UTC), Ok(nine));
        assert_eq!(parse_epoch_seconds("2025-01-15 09:00:00", UTC), Ok(nine));

        let plus_two: DayBoundaryTimeZone = "+02:00".parse().unwrap();
        assert_eq!(parse_epoch_seconds("2025-01-15T09:00Z", plus_two), Ok(nine));

        let entries = normalize_entries(
            &[raw(Some("2025-01-15T09:00Z"), Some("2025-01-15T09:30Z"))],
            UTC,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_seconds(), 1800);
    }
}
