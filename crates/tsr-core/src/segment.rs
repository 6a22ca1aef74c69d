//! Work/break segments.
//!
//! Two ways to build the same timeline:
//!
//! - [`extract_segments`] run-length-encodes a presence sample stream.
//! - [`reconstruct_timeline`] sweeps the sorted entry boundaries directly and
//!   snaps them to the sampling grid, without visiting every sample.
//!
//! Both produce identical output for the same entries and step.
//!
//! Breaks are only emitted between two work segments. There is never a
//! leading or trailing break: the day is taken to end at the last activity.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::TimeEntry;
use crate::presence::{PresenceSample, SampleWindow, merge_open_intervals};

/// Kind of a reconstructed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Work,
    Break,
}

impl SegmentKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Break => "break",
        }
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One contiguous reconstructed interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: i64,
    pub end: i64,
    /// Whole minutes in `start..end`, floored.
    pub duration_minutes: i64,
}

impl Segment {
    /// Creates a segment spanning `start..end`.
    ///
    /// `duration_minutes` is floored per segment. With a minute-aligned grid
    /// this is exact; otherwise each segment can lose up to 59 seconds, and
    /// [`daily_total`](crate::daily_total) sums the floored values.
    pub const fn new(kind: SegmentKind, start: i64, end: i64) -> Self {
        Self {
            kind,
            start,
            end,
            duration_minutes: (end - start) / 60,
        }
    }

    pub const fn work(start: i64, end: i64) -> Self {
        Self::new(SegmentKind::Work, start, end)
    }

    pub const fn gap(start: i64, end: i64) -> Self {
        Self::new(SegmentKind::Break, start, end)
    }

    pub const fn duration_seconds(&self) -> i64 {
        self.end - self.start
    }
}

/// Accumulates work runs and inserts the break between consecutive runs.
#[derive(Debug, Default)]
struct TimelineBuilder {
    segments: Vec<Segment>,
}

impl TimelineBuilder {
    fn push_work(&mut self, start: i64, end: i64) {
        if let Some(previous_end) = self.segments.last().map(|s| s.end) {
            self.segments.push(Segment::gap(previous_end, start));
        }
        self.segments.push(Segment::work(start, end));
    }

    fn finish(self) -> Vec<Segment> {
        self.segments
    }
}

/// Run-length-encodes presence samples into work segments and the breaks
/// between them.
///
/// A work segment opens at the first covered sample after an uncovered one and
/// closes at the next uncovered sample. Samples produced by
/// [`sample_presence`](crate::sample_presence) always start and end uncovered.
/// For other input ending mid-run, the open segment closes at the last sample.
pub fn extract_segments<I>(samples: I) -> Vec<Segment>
where
    I: IntoIterator<Item = PresenceSample>,
{
    let mut timeline = TimelineBuilder::default();
    let mut open_since: Option<i64> = None;
    let mut last_at: Option<i64> = None;

    for sample in samples {
        match (open_since, sample.covered) {
            (None, true) => open_since = Some(sample.at),
            (Some(start), false) => {
                timeline.push_work(start, sample.at);
                open_since = None;
            }
            _ => {}
        }
        last_at = Some(sample.at);
    }

    if let Some((start, end)) = open_since.zip(last_at).filter(|(start, end)| end > start) {
        timeline.push_work(start, end);
    }

    timeline.finish()
}

/// Rebuilds the work/break timeline from entries with a boundary sweep.
///
/// Equivalent to `extract_segments(sample_presence(entries, step))` but runs in
/// `O(entries log entries)`, independent of how long the day is.
pub fn reconstruct_timeline(entries: &[TimeEntry], step: NonZeroU32) -> Vec<Segment> {
    let Some(window) = SampleWindow::covering(entries, step) else {
        return Vec::new();
    };
    let step = window.step;

    // Inclusive ranges of covered sample indices, contiguous runs merged.
    let mut runs: Vec<(i64, i64)> = Vec::new();
    for (start, end) in merge_open_intervals(entries) {
        let first = (start - window.start).div_euclid(step) + 1;
        let last = (end - window.start - 1).div_euclid(step);
        if first > last {
            continue;
        }
        match runs.last_mut() {
            Some(run) if first <= run.1 + 1 => run.1 = run.1.max(last),
            _ => runs.push((first, last)),
        }
    }

    let mut timeline = TimelineBuilder::default();
    for (first, last) in runs {
        timeline.push_work(window.instant(first), window.instant(last + 1));
    }
    let segments = timeline.finish();

    tracing::debug!(
        entries = entries.len(),
        segments = segments.len(),
        "reconstructed timeline"
    );
    segments
}

/// A broken timeline invariant, with the index of the offending segment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineViolation {
    #[error("segment {index} ends before it starts")]
    Inverted { index: usize },

    #[error("segment {index} starts before the previous segment")]
    Unsorted { index: usize },

    #[error("segment {index} overlaps the previous segment")]
    Overlap { index: usize },

    #[error("segment {index} has the same kind as the previous segment")]
    NotAlternating { index: usize },

    #[error("segment {index} is a break at the edge of the timeline")]
    EdgeBreak { index: usize },
}

/// Checks ordering, non-overlap, and alternation of a timeline.
pub fn validate_timeline(segments: &[Segment]) -> Result<(), TimelineViolation> {
    for (index, segment) in segments.iter().enumerate() {
        if segment.end < segment.start {
            return Err(TimelineViolation::Inverted { index });
        }
        let is_edge = index == 0 || index + 1 == segments.len();
        if is_edge && segment.kind == SegmentKind::Break {
            return Err(TimelineViolation::EdgeBreak { index });
        }
        let Some(previous) = index.checked_sub(1).map(|i| &segments[i]) else {
            continue;
        };
        if segment.start < previous.start {
            return Err(TimelineViolation::Unsorted { index });
        }
        if segment.start < previous.end {
            return Err(TimelineViolation::Overlap { index });
        }
        if segment.kind == previous.kind {
            return Err(TimelineViolation::NotAlternating { index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presence::sample_presence;

    const MINUTE: NonZeroU32 = NonZeroU32::new(60).unwrap();

    /// 09:00 on 2025-01-15 UTC.
    const NINE: i64 = 1_736_931_600;

    fn at(minutes: i64) -> i64 {
        NINE + minutes * 60
    }

    fn entry(start: i64, end: i64) -> TimeEntry {
        TimeEntry::new(format!("{start}-{end}"), start, end).unwrap()
    }

    fn sample(at: i64, covered: bool) -> PresenceSample {
        PresenceSample { at, covered }
    }

    fn both_paths(entries: &[TimeEntry], step: NonZeroU32) -> Vec<Segment> {
        let swept = reconstruct_timeline(entries, step);
        let sampled = extract_segments(sample_presence(entries, step));
        assert_eq!(swept, sampled, "sweep and sampling disagree for {entries:?}");
        swept
    }

    #[test]
    fn empty_input_gives_empty_timeline() {
        assert!(extract_segments(Vec::<PresenceSample>::new()).is_empty());
        assert!(reconstruct_timeline(&[], MINUTE).is_empty());
    }

    #[test]
    fn no_covered_samples_gives_empty_timeline() {
        let samples = vec![sample(0, false), sample(60, false), sample(120, false)];
        assert!(extract_segments(samples).is_empty());
        assert!(both_paths(&[entry(NINE, NINE)], MINUTE).is_empty());
    }

    #[test]
    fn run_length_encodes_samples() {
        let samples = vec![
            sample(0, false),
            sample(60, true),
            sample(120, true),
            sample(180, false),
            sample(240, false),
            sample(300, true),
            sample(360, false),
        ];
        assert_eq!(
            extract_segments(samples),
            [
                Segment::work(60, 180),
                Segment::gap(180, 300),
                Segment::work(300, 360)
            ]
        );
    }

    #[test]
    fn open_run_closes_at_last_sample() {
        let samples = vec![sample(0, false), sample(60, true), sample(120, true)];
        assert_eq!(extract_segments(samples), [Segment::work(60, 120)]);
    }

    #[test]
    fn overlapping_day_scenario() {
        // A 09:00-09:30, A 09:15-09:45, B 10:00-10:15
        let entries = vec![
            entry(at(0), at(30)),
            entry(at(15), at(45)),
            entry(at(60), at(75)),
        ];

        let segments = both_paths(&entries, MINUTE);
        assert_eq!(
            segments,
            [
                Segment::work(at(1), at(45)),
                Segment::gap(at(45), at(61)),
                Segment::work(at(61), at(75)),
            ]
        );
        assert_eq!(segments.last().unwrap().kind, SegmentKind::Work);
        validate_timeline(&segments).unwrap();
    }

    #[test]
    fn touching_entries_split_by_one_step_break() {
        let segments = both_paths(&[entry(at(0), at(10)), entry(at(10), at(20))], MINUTE);
        assert_eq!(
            segments,
            [
                Segment::work(at(1), at(10)),
                Segment::gap(at(10), at(11)),
                Segment::work(at(11), at(20)),
            ]
        );
    }

    #[test]
    fn sub_step_gap_is_absorbed() {
        // 09:10:20 .. 09:10:40 contains no sample, so coverage looks continuous
        let entries = vec![
            entry(at(0), at(10) + 20),
            entry(at(10) + 40, at(20)),
        ];
        let segments = both_paths(&entries, MINUTE);
        assert_eq!(segments, [Segment::work(at(1), at(20))]);
    }

    #[test]
    fn unsorted_input_is_handled() {
        let entries = vec![entry(at(60), at(90)), entry(at(0), at(30))];
        let segments = both_paths(&entries, MINUTE);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].start, at(1));
    }

    #[test]
    fn coarse_step() {
        let step = NonZeroU32::new(900).unwrap();
        let entries = vec![entry(at(0), at(50)), entry(at(120), at(125))];
        let segments = both_paths(&entries, step);
        // Grid starts 30 minutes before 09:00; samples every 15 minutes
        assert_eq!(segments, [Segment::work(at(15), at(60))]);
    }

    #[test]
    fn duration_minutes_floors() {
        assert_eq!(Segment::work(0, 119).duration_minutes, 1);
        assert_eq!(Segment::gap(0, 3_600).duration_minutes, 60);
    }

    #[test]
    fn validate_rejects_broken_timelines() {
        let ok = [Segment::work(0, 60), Segment::gap(60, 120), Segment::work(120, 180)];
        assert_eq!(validate_timeline(&ok), Ok(()));
        assert_eq!(validate_timeline(&[]), Ok(()));

        assert_eq!(
            validate_timeline(&[Segment::work(60, 0)]),
            Err(TimelineViolation::Inverted { index: 0 })
        );
        assert_eq!(
            validate_timeline(&[Segment::work(0, 60), Segment::work(60, 120)]),
            Err(TimelineViolation::NotAlternating { index: 1 })
        );
        assert_eq!(
            validate_timeline(&[Segment::work(0, 60), Segment::gap(30, 90), Segment::work(90, 120)]),
            Err(TimelineViolation::Overlap { index: 1 })
        );
        assert_eq!(
            validate_timeline(&[Segment::work(60, 120), Segment::gap(0, 30), Segment::work(130, 140)]),
            Err(TimelineViolation::Unsorted { index: 1 })
        );
        assert_eq!(
            validate_timeline(&[Segment::work(0, 60), Segment::gap(60, 120)]),
            Err(TimelineViolation::EdgeBreak { index: 1 })
        );
    }

    /// Deterministic pseudo-random entry lists (xorshift).
    fn pseudo_random_days(count: usize) -> Vec<Vec<TimeEntry>> {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = move |bound: i64| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            i64::try_from(state % u64::try_from(bound).unwrap()).unwrap()
        };

        (0..count)
            .map(|_| {
                let n = next(12);
                (0..n)
                    .map(|_| {
                        let start = NINE + next(8 * 3_600);
                        let end = start + next(5_400);
                        entry(start, end)
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn sweep_matches_sampling_on_random_days() {
        for step_secs in [1, 45, 60, 300] {
            let step = NonZeroU32::new(step_secs).unwrap();
            for entries in pseudo_random_days(200) {
                let segments = both_paths(&entries, step);
                validate_timeline(&segments).unwrap();
            }
        }
    }

    #[test]
    fn reconstruction_is_idempotent() {
        for entries in pseudo_random_days(20) {
            assert_eq!(
                reconstruct_timeline(&entries, MINUTE),
                reconstruct_timeline(&entries, MINUTE)
            );
        }
    }
}
