//! Presence sampling.
//!
//! Discretizes a day into fixed-width samples and answers, per sample, "is any
//! entry active at this instant?". Coverage is strict: a sample exactly on an
//! entry boundary is not covered, so an entry shorter than one step may never
//! register. That is a resolution limit of the sampling grid.

use std::iter::FusedIterator;
use std::num::NonZeroU32;

use crate::entry::TimeEntry;

/// Number of uncovered steps padded on each side of the sampling window.
///
/// Guarantees an uncovered sample before the first and after the last entry,
/// which lets segment extraction close every run.
pub const WINDOW_MARGIN_STEPS: i64 = 2;

/// One presence sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceSample {
    /// Sample instant, in epoch seconds.
    pub at: i64,
    /// Whether any entry strictly contains `at`.
    pub covered: bool,
}

/// The sampling grid for one set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    /// First sample instant.
    pub start: i64,
    /// Last sample instant (inclusive).
    pub end: i64,
    /// Seconds between samples.
    pub step: i64,
}

impl SampleWindow {
    /// Builds the window around `entries`, or `None` if there are none.
    pub fn covering(entries: &[TimeEntry], step: NonZeroU32) -> Option<Self> {
        let step = i64::from(step.get());
        let min_start = entries.iter().map(|e| e.start).min()?;
        let max_end = entries.iter().map(|e| e.end).max()?;
        Some(Self {
            start: min_start - WINDOW_MARGIN_STEPS * step,
            end: max_end + WINDOW_MARGIN_STEPS * step,
            step,
        })
    }

    /// Instant of the sample at `index`.
    pub const fn instant(&self, index: i64) -> i64 {
        self.start + index * self.step
    }

    /// Number of samples in the window.
    pub const fn len(&self) -> i64 {
        (self.end - self.start) / self.step + 1
    }

    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

/// Merges entry spans into disjoint, sorted open intervals.
///
/// Zero-length spans cover nothing and are discarded. Spans that merely touch
/// (`a.end == b.start`) stay separate because the shared instant is covered by
/// neither.
pub(crate) fn merge_open_intervals(entries: &[TimeEntry]) -> Vec<(i64, i64)> {
    let mut spans: Vec<(i64, i64)> = entries
        .iter()
        .filter(|e| e.end > e.start)
        .map(|e| (e.start, e.end))
        .collect();
    spans.sort_unstable();

    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start < last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Lazy iterator over the presence samples of a window.
///
/// Runs in `O(samples + entries log entries)` and never materializes the
/// per-sample sequence.
#[derive(Debug, Clone)]
pub struct PresenceSamples {
    intervals: Vec<(i64, i64)>,
    cursor: usize,
    next_at: i64,
    window: Option<SampleWindow>,
}

impl PresenceSamples {
    /// The window being sampled, or `None` for an empty entry list.
    pub const fn window(&self) -> Option<SampleWindow> {
        self.window
    }
}

impl Iterator for PresenceSamples {
    type Item = PresenceSample;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.window?;
        if self.next_at > window.end {
            return None;
        }
        let at = self.next_at;
        self.next_at += window.step;

        while self
            .intervals
            .get(self.cursor)
            .is_some_and(|&(_, end)| end <= at)
        {
            self.cursor += 1;
        }
        let covered = self
            .intervals
            .get(self.cursor)
            .is_some_and(|&(start, end)| start < at && at < end);

        Some(PresenceSample { at, covered })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.window.map_or(0, |w| {
            usize::try_from((w.end - self.next_at).div_euclid(w.step) + 1).unwrap_or(0)
        });
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PresenceSamples {}

impl FusedIterator for PresenceSamples {}

/// Samples presence over the window around `entries` at `step` seconds.
///
/// Overlapping entries covering the same instant yield a single covered sample.
pub fn sample_presence(entries: &[TimeEntry], step: NonZeroU32) -> PresenceSamples {
    let window = SampleWindow::covering(entries, step);
    PresenceSamples {
        intervals: merge_open_intervals(entries),
        cursor: 0,
        next_at: window.map_or(0, |w| w.start),
        window,
    }
}
